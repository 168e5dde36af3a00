/*
 * base64.rs
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

//! Base64 Content-Transfer-Encoding (RFC 2045 section 6.8).

use std::sync::OnceLock;

use super::{MimeDecoder, MimeEncoder};

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encoded quartets per output line (76 characters).
const QUARTETS_PER_LINE: usize = 19;

const INVALID: i8 = -1;

fn decode_table() -> &'static [i8; 256] {
    static TABLE: OnceLock<[i8; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = [INVALID; 256];
        for i in 0..26u8 {
            t[(b'A' + i) as usize] = i as i8;
            t[(b'a' + i) as usize] = (26 + i) as i8;
        }
        for i in 0..10u8 {
            t[(b'0' + i) as usize] = (52 + i) as i8;
        }
        t[b'+' as usize] = 62;
        t[b'/' as usize] = 63;
        t
    })
}

/// Incremental base64 decoder. Whitespace and characters outside the alphabet are skipped;
/// `=` completes a partial quantum. A partial quantum still open at the end of the
/// stream carries fewer than 8 significant bits per missing character and is discarded.
#[derive(Debug, Default, Clone)]
pub struct Base64Decoder {
    quantum: u32,
    bits: u32,
}

impl Base64Decoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MimeDecoder for Base64Decoder {
    fn estimate_output_length(&self, input_len: usize) -> usize {
        (input_len + 3) / 4 * 3 + 3
    }

    fn decode(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        let table = decode_table();
        let mut n = 0;
        for &b in input {
            let val = table[b as usize];
            if val >= 0 {
                self.quantum = (self.quantum << 6) | val as u32;
                self.bits += 6;
                if self.bits == 24 {
                    output[n] = (self.quantum >> 16) as u8;
                    output[n + 1] = (self.quantum >> 8) as u8;
                    output[n + 2] = self.quantum as u8;
                    n += 3;
                    self.quantum = 0;
                    self.bits = 0;
                }
            } else if b == b'=' {
                if self.bits >= 12 {
                    output[n] = (self.quantum >> (self.bits - 8)) as u8;
                    n += 1;
                    if self.bits >= 18 {
                        output[n] = (self.quantum >> (self.bits - 16)) as u8;
                        n += 1;
                    }
                }
                self.quantum = 0;
                self.bits = 0;
            }
        }
        n
    }

    fn reset(&mut self) {
        self.quantum = 0;
        self.bits = 0;
    }
}

/// Incremental base64 encoder producing CRLF-terminated lines of 76 characters.
#[derive(Debug, Default, Clone)]
pub struct Base64Encoder {
    saved: [u8; 3],
    saved_len: usize,
    quartets: usize,
}

impl Base64Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn put_quartet(&mut self, chunk: &[u8], output: &mut [u8], n: &mut usize) {
        let v = (chunk[0] as usize) << 16
            | (chunk.get(1).copied().unwrap_or(0) as usize) << 8
            | chunk.get(2).copied().unwrap_or(0) as usize;
        output[*n] = ALPHABET[v >> 18];
        output[*n + 1] = ALPHABET[(v >> 12) & 63];
        output[*n + 2] = if chunk.len() > 1 { ALPHABET[(v >> 6) & 63] } else { b'=' };
        output[*n + 3] = if chunk.len() > 2 { ALPHABET[v & 63] } else { b'=' };
        *n += 4;
        self.quartets += 1;
        if self.quartets == QUARTETS_PER_LINE {
            output[*n] = b'\r';
            output[*n + 1] = b'\n';
            *n += 2;
            self.quartets = 0;
        }
    }
}

impl MimeEncoder for Base64Encoder {
    fn estimate_output_length(&self, input_len: usize) -> usize {
        // Up to two saved bytes plus the input, rounded up to whole quartets.
        let quartets = (input_len + 2 + 2) / 3;
        quartets * 4 + (quartets / QUARTETS_PER_LINE + 2) * 2
    }

    fn encode(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        let mut n = 0;
        for &b in input {
            self.saved[self.saved_len] = b;
            self.saved_len += 1;
            if self.saved_len == 3 {
                let saved = self.saved;
                self.put_quartet(&saved, output, &mut n);
                self.saved_len = 0;
            }
        }
        n
    }

    fn flush(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        let mut n = self.encode(input, output);
        if self.saved_len > 0 {
            let saved = self.saved;
            let len = self.saved_len;
            self.put_quartet(&saved[..len], output, &mut n);
        }
        if self.quartets > 0 {
            output[n] = b'\r';
            output[n + 1] = b'\n';
            n += 2;
        }
        self.reset();
        n
    }

    fn reset(&mut self) {
        self.saved_len = 0;
        self.quartets = 0;
    }
}
