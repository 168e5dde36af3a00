/*
 * codec.rs
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

//! Filters wrapping Content-Transfer-Encoding codecs.

use super::{ensure_len_aligned, MimeFilter};
use crate::codec::{MimeDecoder, MimeEncoder, TransferEncoding};

/// Decodes a transfer encoding. Flushing does not emit anything extra: an incomplete
/// trailing quantum or escape is dropped.
#[derive(Debug)]
pub struct DecoderFilter<D = Box<dyn MimeDecoder>> {
    decoder: D,
    output: Vec<u8>,
}

impl<D: MimeDecoder> DecoderFilter<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            output: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &D {
        &self.decoder
    }
}

impl DecoderFilter {
    pub fn for_encoding(encoding: TransferEncoding) -> Self {
        Self::new(encoding.decoder())
    }
}

impl<D: MimeDecoder> MimeFilter for DecoderFilter<D> {
    fn transform(&mut self, input: &[u8], _flush: bool) -> &[u8] {
        ensure_len_aligned(&mut self.output, self.decoder.estimate_output_length(input.len()));
        let n = self.decoder.decode(input, &mut self.output);
        &self.output[..n]
    }

    fn reset(&mut self) {
        self.decoder.reset();
    }
}

/// Applies a transfer encoding. Flushing pads and terminates the encoded output.
#[derive(Debug)]
pub struct EncoderFilter<E = Box<dyn MimeEncoder>> {
    encoder: E,
    output: Vec<u8>,
}

impl<E: MimeEncoder> EncoderFilter<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            output: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &E {
        &self.encoder
    }
}

impl EncoderFilter {
    pub fn for_encoding(encoding: TransferEncoding) -> Self {
        Self::new(encoding.encoder())
    }
}

impl<E: MimeEncoder> MimeFilter for EncoderFilter<E> {
    fn transform(&mut self, input: &[u8], flush: bool) -> &[u8] {
        ensure_len_aligned(&mut self.output, self.encoder.estimate_output_length(input.len()));
        let n = if flush {
            self.encoder.flush(input, &mut self.output)
        } else {
            self.encoder.encode(input, &mut self.output)
        };
        &self.output[..n]
    }

    fn reset(&mut self) {
        self.encoder.reset();
    }
}
