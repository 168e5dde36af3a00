/*
 * charset.rs
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

//! Incremental charset decoders and encoders for transcoding MIME text.
//! Only the charsets RFC 2047 decoding already understands are provided (UTF-8,
//! ISO-8859-1, US-ASCII); anything else is resolved by the caller and plugged in
//! through the `CharsetDecoder`/`CharsetEncoder` traits.

const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Result of one `CharsetDecoder::decode` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeProgress {
    /// Input bytes consumed (including bytes absorbed into decoder state).
    pub bytes_read: usize,
    /// Characters written to the output slice.
    pub chars_written: usize,
    /// All input was consumed and, when flushing, no state remains.
    pub completed: bool,
}

/// Bytes to characters. Incomplete multi-byte sequences stay inside the decoder until the
/// next call (or are replaced by U+FFFD when flushing).
pub trait CharsetDecoder: Send {
    /// Upper bound on the characters produced for `byte_count` more input bytes.
    fn max_char_count(&self, byte_count: usize) -> usize;

    /// Decode as much of `input` as fits into `output`.
    fn decode(&mut self, input: &[u8], output: &mut [char], flush: bool) -> DecodeProgress;

    fn reset(&mut self);
}

/// Characters to bytes. Unmappable characters are replaced.
pub trait CharsetEncoder: Send {
    /// Upper bound on the bytes produced for `char_count` characters.
    fn max_byte_count(&self, char_count: usize) -> usize;

    /// Append the encoding of `chars` to `output`.
    fn encode(&mut self, chars: &[char], output: &mut Vec<u8>, flush: bool);

    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Latin1,
    UsAscii,
}

impl Charset {
    /// Resolve a MIME charset name (case-insensitive, common aliases).
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "utf-8" | "utf8" => Some(Charset::Utf8),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "l1" | "cp819" => {
                Some(Charset::Latin1)
            }
            "us-ascii" | "ascii" | "ansi_x3.4-1968" | "iso646-us" => Some(Charset::UsAscii),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Latin1 => "iso-8859-1",
            Charset::UsAscii => "us-ascii",
        }
    }

    pub fn decoder(self) -> Box<dyn CharsetDecoder> {
        match self {
            Charset::Utf8 => Box::new(Utf8Decoder::default()),
            Charset::Latin1 => Box::new(SingleByteDecoder { max: 0xFF }),
            Charset::UsAscii => Box::new(SingleByteDecoder { max: 0x7F }),
        }
    }

    pub fn encoder(self) -> Box<dyn CharsetEncoder> {
        match self {
            Charset::Utf8 => Box::new(Utf8Encoder),
            Charset::Latin1 => Box::new(SingleByteEncoder { max: 0xFF }),
            Charset::UsAscii => Box::new(SingleByteEncoder { max: 0x7F }),
        }
    }
}

/// UTF-8 decoder keeping a partial sequence across calls.
#[derive(Debug, Default, Clone)]
pub struct Utf8Decoder {
    partial: [u8; 4],
    partial_len: usize,
    needed: usize,
}

fn utf8_sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

impl CharsetDecoder for Utf8Decoder {
    fn max_char_count(&self, byte_count: usize) -> usize {
        // A held partial sequence may turn into one replacement character.
        byte_count + 1
    }

    fn decode(&mut self, input: &[u8], output: &mut [char], flush: bool) -> DecodeProgress {
        let mut read = 0;
        let mut written = 0;

        while written < output.len() {
            if self.partial_len > 0 {
                let Some(&b) = input.get(read) else { break };
                if b & 0xC0 != 0x80 {
                    // Truncated sequence; `b` starts over without being consumed.
                    output[written] = REPLACEMENT_CHAR;
                    written += 1;
                    self.partial_len = 0;
                    continue;
                }
                self.partial[self.partial_len] = b;
                self.partial_len += 1;
                read += 1;
                if self.partial_len == self.needed {
                    output[written] = std::str::from_utf8(&self.partial[..self.partial_len])
                        .ok()
                        .and_then(|s| s.chars().next())
                        .unwrap_or(REPLACEMENT_CHAR);
                    written += 1;
                    self.partial_len = 0;
                }
                continue;
            }

            let Some(&b) = input.get(read) else { break };
            read += 1;
            match utf8_sequence_len(b) {
                0 => {
                    output[written] = REPLACEMENT_CHAR;
                    written += 1;
                }
                1 => {
                    output[written] = b as char;
                    written += 1;
                }
                n => {
                    self.partial[0] = b;
                    self.partial_len = 1;
                    self.needed = n;
                }
            }
        }

        let mut completed = read == input.len();
        if completed && flush && self.partial_len > 0 {
            if written < output.len() {
                output[written] = REPLACEMENT_CHAR;
                written += 1;
                self.partial_len = 0;
            } else {
                completed = false;
            }
        }
        DecodeProgress {
            bytes_read: read,
            chars_written: written,
            completed,
        }
    }

    fn reset(&mut self) {
        self.partial_len = 0;
        self.needed = 0;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Encoder;

impl CharsetEncoder for Utf8Encoder {
    fn max_byte_count(&self, char_count: usize) -> usize {
        char_count * 4
    }

    fn encode(&mut self, chars: &[char], output: &mut Vec<u8>, _flush: bool) {
        let mut tmp = [0u8; 4];
        for c in chars {
            output.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
        }
    }

    fn reset(&mut self) {}
}

/// Decoder for charsets whose bytes map directly onto the first `max + 1` code points.
#[derive(Debug, Clone, Copy)]
pub struct SingleByteDecoder {
    max: u8,
}

impl CharsetDecoder for SingleByteDecoder {
    fn max_char_count(&self, byte_count: usize) -> usize {
        byte_count
    }

    fn decode(&mut self, input: &[u8], output: &mut [char], _flush: bool) -> DecodeProgress {
        let n = input.len().min(output.len());
        for (dst, &b) in output.iter_mut().zip(&input[..n]) {
            *dst = if b <= self.max { b as char } else { REPLACEMENT_CHAR };
        }
        DecodeProgress {
            bytes_read: n,
            chars_written: n,
            completed: n == input.len(),
        }
    }

    fn reset(&mut self) {}
}

/// Encoder for charsets covering the first `max + 1` code points; others become `?`.
#[derive(Debug, Clone, Copy)]
pub struct SingleByteEncoder {
    max: u8,
}

impl CharsetEncoder for SingleByteEncoder {
    fn max_byte_count(&self, char_count: usize) -> usize {
        char_count
    }

    fn encode(&mut self, chars: &[char], output: &mut Vec<u8>, _flush: bool) {
        output.extend(chars.iter().map(|&c| {
            if (c as u32) <= self.max as u32 {
                c as u32 as u8
            } else {
                b'?'
            }
        }));
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_chunks(d: &mut dyn CharsetDecoder, chunks: &[&[u8]], out_len: usize) -> String {
        let mut out = String::new();
        let mut buf = vec!['\0'; out_len];
        for (i, c) in chunks.iter().enumerate() {
            let flush = i + 1 == chunks.len();
            let mut consumed = 0;
            loop {
                let p = d.decode(&c[consumed..], &mut buf, flush);
                consumed += p.bytes_read;
                out.extend(&buf[..p.chars_written]);
                if p.completed {
                    break;
                }
            }
        }
        out
    }

    #[test]
    fn lookup_aliases() {
        assert_eq!(Charset::lookup("UTF-8"), Some(Charset::Utf8));
        assert_eq!(Charset::lookup(" Latin1 "), Some(Charset::Latin1));
        assert_eq!(Charset::lookup("ascii"), Some(Charset::UsAscii));
        assert_eq!(Charset::lookup("koi8-r"), None);
        assert_eq!(Charset::Latin1.name(), "iso-8859-1");
    }

    #[test]
    fn utf8_split_sequence() {
        let mut d = Utf8Decoder::default();
        let s = "h\u{e9}\u{20ac}\u{1F600}";
        let bytes = s.as_bytes();
        assert_eq!(decode_chunks(&mut d, &[&bytes[..2], &bytes[2..5], &bytes[5..]], 8), s);
    }

    #[test]
    fn utf8_small_output_buffer() {
        let mut d = Utf8Decoder::default();
        let s = "abc\u{e9}def";
        assert_eq!(decode_chunks(&mut d, &[s.as_bytes()], 1), s);
    }

    #[test]
    fn utf8_invalid_bytes_replaced() {
        let mut d = Utf8Decoder::default();
        assert_eq!(decode_chunks(&mut d, &[b"a\xffb\xc3", b"c\xe2\x82"], 4), "a\u{fffd}b\u{fffd}c\u{fffd}");
    }

    #[test]
    fn latin1_round_trip() {
        let mut d = Charset::Latin1.decoder();
        let s = decode_chunks(d.as_mut(), &[b"caf\xe9"], 16);
        assert_eq!(s, "caf\u{e9}");
        let mut e = Charset::Latin1.encoder();
        let mut out = Vec::new();
        let chars: Vec<char> = "caf\u{e9}\u{20ac}".chars().collect();
        e.encode(&chars, &mut out, true);
        assert_eq!(out, b"caf\xe9?");
    }

    #[test]
    fn ascii_replaces_high_bytes() {
        let mut d = Charset::UsAscii.decoder();
        assert_eq!(decode_chunks(d.as_mut(), &[b"a\xe9"], 4), "a\u{fffd}");
    }
}
