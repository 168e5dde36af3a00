/*
 * mod.rs
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

//! Incremental Content-Transfer-Encoding codecs (RFC 2045).
//!
//! Codecs keep their own state between calls (partial base64 quantum, pending `=` escape,
//! line length) so input can be fed in arbitrary chunks. Callers size the output slice with
//! `estimate_output_length`, which never under-estimates.

mod base64;
mod quoted_printable;

pub use self::base64::{Base64Decoder, Base64Encoder};
pub use self::quoted_printable::{QuotedPrintableDecoder, QuotedPrintableEncoder};

/// Decoding half of a Content-Transfer-Encoding.
pub trait MimeDecoder: Send {
    /// Upper bound on the bytes `decode` can write for `input_len` input bytes.
    fn estimate_output_length(&self, input_len: usize) -> usize;

    /// Decode `input` into `output`, which must be at least
    /// `estimate_output_length(input.len())` long. Returns the number of bytes written.
    fn decode(&mut self, input: &[u8], output: &mut [u8]) -> usize;

    fn reset(&mut self);
}

/// Encoding half of a Content-Transfer-Encoding.
pub trait MimeEncoder: Send {
    /// Upper bound on the bytes `encode` or `flush` can write for `input_len` input bytes.
    fn estimate_output_length(&self, input_len: usize) -> usize;

    /// Encode `input` into `output`; returns the number of bytes written.
    fn encode(&mut self, input: &[u8], output: &mut [u8]) -> usize;

    /// Encode the final `input` and emit any buffered state (padding, pending whitespace,
    /// final line break). The encoder is ready for a new stream afterwards.
    fn flush(&mut self, input: &[u8], output: &mut [u8]) -> usize;

    fn reset(&mut self);
}

/// Content-Transfer-Encodings with a shipped codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    Base64,
    QuotedPrintable,
}

impl TransferEncoding {
    /// Parse a Content-Transfer-Encoding header value (case-insensitive).
    /// Identity encodings (7bit, 8bit, binary) have no codec and yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim();
        if v.eq_ignore_ascii_case("base64") {
            Some(TransferEncoding::Base64)
        } else if v.eq_ignore_ascii_case("quoted-printable") {
            Some(TransferEncoding::QuotedPrintable)
        } else {
            None
        }
    }

    pub fn decoder(self) -> Box<dyn MimeDecoder> {
        match self {
            TransferEncoding::Base64 => Box::new(Base64Decoder::new()),
            TransferEncoding::QuotedPrintable => Box::new(QuotedPrintableDecoder::new()),
        }
    }

    pub fn encoder(self) -> Box<dyn MimeEncoder> {
        match self {
            TransferEncoding::Base64 => Box::new(Base64Encoder::new()),
            TransferEncoding::QuotedPrintable => Box::new(QuotedPrintableEncoder::new()),
        }
    }
}

impl<D: MimeDecoder + ?Sized> MimeDecoder for Box<D> {
    fn estimate_output_length(&self, input_len: usize) -> usize {
        (**self).estimate_output_length(input_len)
    }

    fn decode(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        (**self).decode(input, output)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

impl<E: MimeEncoder + ?Sized> MimeEncoder for Box<E> {
    fn estimate_output_length(&self, input_len: usize) -> usize {
        (**self).estimate_output_length(input_len)
    }

    fn encode(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        (**self).encode(input, output)
    }

    fn flush(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        (**self).flush(input, output)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
