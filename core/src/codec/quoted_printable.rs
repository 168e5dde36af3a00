/*
 * quoted_printable.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tagliacarte, a cross-platform email client.
 *
 * Tagliacarte is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Tagliacarte is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Tagliacarte.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Quoted-Printable Content-Transfer-Encoding (RFC 2045 section 6.7).

use super::{MimeDecoder, MimeEncoder};

const HEX_DECODE: [i8; 256] = {
    let mut t = [-1i8; 256];
    let mut i = 0u8;
    while i < 10 {
        t[(b'0' + i) as usize] = i as i8;
        i = i.wrapping_add(1);
    }
    let mut i = 0u8;
    while i < 6 {
        t[(b'A' + i) as usize] = (10 + i) as i8;
        t[(b'a' + i) as usize] = (10 + i) as i8;
        i = i.wrapping_add(1);
    }
    t
};

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Longest encoded line, excluding CRLF.
const MAX_LINE: usize = 76;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Normal,
    /// Saw `=`.
    Equals,
    /// Saw `=` and one hex digit.
    Hex(u8),
    /// Saw `=\r`, expecting LF for a soft line break.
    SoftCr,
}

/// Incremental quoted-printable decoder. Handles `=XX` (either hex case) and soft line
/// breaks (`=CRLF`, `=LF`). Malformed escapes are passed through literally. An `=` escape
/// left incomplete at the end of the stream is discarded.
#[derive(Debug, Clone)]
pub struct QuotedPrintableDecoder {
    state: DecodeState,
}

impl Default for QuotedPrintableDecoder {
    fn default() -> Self {
        Self {
            state: DecodeState::Normal,
        }
    }
}

impl QuotedPrintableDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MimeDecoder for QuotedPrintableDecoder {
    fn estimate_output_length(&self, input_len: usize) -> usize {
        // A malformed escape can release two held bytes alongside the current one.
        input_len + 2
    }

    fn decode(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        let mut n = 0;
        for &b in input {
            let mut next = Some(b);
            while let Some(b) = next.take() {
                match self.state {
                    DecodeState::Normal => {
                        if b == b'=' {
                            self.state = DecodeState::Equals;
                        } else {
                            output[n] = b;
                            n += 1;
                        }
                    }
                    DecodeState::Equals => {
                        if HEX_DECODE[b as usize] >= 0 {
                            self.state = DecodeState::Hex(b);
                        } else if b == b'\r' {
                            self.state = DecodeState::SoftCr;
                        } else if b == b'\n' {
                            self.state = DecodeState::Normal;
                        } else {
                            output[n] = b'=';
                            n += 1;
                            self.state = DecodeState::Normal;
                            next = Some(b);
                        }
                    }
                    DecodeState::Hex(first) => {
                        let v2 = HEX_DECODE[b as usize];
                        if v2 >= 0 {
                            let v1 = HEX_DECODE[first as usize];
                            output[n] = ((v1 << 4) | v2) as u8;
                            n += 1;
                        } else {
                            output[n] = b'=';
                            output[n + 1] = first;
                            n += 2;
                            next = Some(b);
                        }
                        self.state = DecodeState::Normal;
                    }
                    DecodeState::SoftCr => {
                        if b != b'\n' {
                            output[n] = b'=';
                            output[n + 1] = b'\r';
                            n += 2;
                            next = Some(b);
                        }
                        self.state = DecodeState::Normal;
                    }
                }
            }
        }
        n
    }

    fn reset(&mut self) {
        self.state = DecodeState::Normal;
    }
}

/// Incremental quoted-printable encoder.
///
/// Line breaks in the input (LF or CRLF) become CRLF hard breaks; a lone CR is encoded.
/// Whitespace before a hard break or at the end of the stream is encoded so it survives
/// transport. Lines are kept to 76 characters with `=` soft breaks.
#[derive(Debug, Default, Clone)]
pub struct QuotedPrintableEncoder {
    line_len: usize,
    pending_ws: Option<u8>,
    pending_cr: bool,
}

impl QuotedPrintableEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(&mut self, token: &[u8], output: &mut [u8], n: &mut usize) {
        // Leave room for the '=' of a soft break.
        if self.line_len + token.len() > MAX_LINE - 1 {
            output[*n..*n + 3].copy_from_slice(b"=\r\n");
            *n += 3;
            self.line_len = 0;
        }
        output[*n..*n + token.len()].copy_from_slice(token);
        *n += token.len();
        self.line_len += token.len();
    }

    fn put_escaped(&mut self, b: u8, output: &mut [u8], n: &mut usize) {
        let token = [b'=', HEX_UPPER[(b >> 4) as usize], HEX_UPPER[(b & 0x0f) as usize]];
        self.put(&token, output, n);
    }

    fn put_byte(&mut self, b: u8, output: &mut [u8], n: &mut usize) {
        if matches!(b, 33..=60 | 62..=126) {
            self.put(&[b], output, n);
        } else {
            self.put_escaped(b, output, n);
        }
    }

    fn hard_break(&mut self, output: &mut [u8], n: &mut usize) {
        if let Some(ws) = self.pending_ws.take() {
            self.put_escaped(ws, output, n);
        }
        output[*n..*n + 2].copy_from_slice(b"\r\n");
        *n += 2;
        self.line_len = 0;
    }

    fn release_ws(&mut self, output: &mut [u8], n: &mut usize) {
        if let Some(ws) = self.pending_ws.take() {
            self.put(&[ws], output, n);
        }
    }

    fn step(&mut self, b: u8, output: &mut [u8], n: &mut usize) {
        if self.pending_cr {
            self.pending_cr = false;
            if b == b'\n' {
                self.hard_break(output, n);
                return;
            }
            self.release_ws(output, n);
            self.put_escaped(b'\r', output, n);
        }
        match b {
            b'\r' => self.pending_cr = true,
            b'\n' => self.hard_break(output, n),
            b' ' | b'\t' => {
                self.release_ws(output, n);
                self.pending_ws = Some(b);
            }
            _ => {
                self.release_ws(output, n);
                self.put_byte(b, output, n);
            }
        }
    }
}

impl MimeEncoder for QuotedPrintableEncoder {
    fn estimate_output_length(&self, input_len: usize) -> usize {
        // Every byte (plus up to two pending ones) may become "=XX", with a 3-byte soft
        // break at most every 72 characters, and a final hard break.
        let escaped = (input_len + 2) * 3;
        escaped + (escaped / 72 + 1) * 3 + 2
    }

    fn encode(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        let mut n = 0;
        for &b in input {
            self.step(b, output, &mut n);
        }
        n
    }

    fn flush(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        let mut n = self.encode(input, output);
        if self.pending_cr {
            self.pending_cr = false;
            self.release_ws(output, &mut n);
            self.put_escaped(b'\r', output, &mut n);
        } else if let Some(ws) = self.pending_ws.take() {
            self.put_escaped(ws, output, &mut n);
        }
        self.reset();
        n
    }

    fn reset(&mut self) {
        self.line_len = 0;
        self.pending_ws = None;
        self.pending_cr = false;
    }
}
