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

//! Charset transcoding filter.

use super::{reserve_aligned, MimeFilter};
use crate::charset::{Charset, CharsetDecoder, CharsetEncoder};

/// Most characters decoded per round before they are re-encoded.
const CHAR_BLOCK: usize = 1024;

/// Re-encodes text from one charset to another.
///
/// Multi-byte sequences split between calls stay in the decoder until completed; on flush
/// an incomplete sequence becomes U+FFFD.
pub struct CharsetFilter {
    decoder: Box<dyn CharsetDecoder>,
    encoder: Box<dyn CharsetEncoder>,
    chars: Vec<char>,
    output: Vec<u8>,
}

impl CharsetFilter {
    pub fn new(decoder: Box<dyn CharsetDecoder>, encoder: Box<dyn CharsetEncoder>) -> Self {
        Self {
            decoder,
            encoder,
            chars: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Filter from charset `from` to charset `to`, by MIME name. `None` if either is unknown.
    pub fn from_names(from: &str, to: &str) -> Option<Self> {
        let from = Charset::lookup(from)?;
        let to = Charset::lookup(to)?;
        Some(Self::new(from.decoder(), to.encoder()))
    }
}

impl std::fmt::Debug for CharsetFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharsetFilter").finish_non_exhaustive()
    }
}

impl MimeFilter for CharsetFilter {
    fn transform(&mut self, input: &[u8], flush: bool) -> &[u8] {
        self.output.clear();
        let want = self.decoder.max_char_count(input.len()).clamp(1, CHAR_BLOCK);
        if self.chars.len() < want {
            self.chars.resize(want, '\0');
        }
        let mut consumed = 0;
        loop {
            let progress = self.decoder.decode(&input[consumed..], &mut self.chars, flush);
            consumed += progress.bytes_read;
            let chars = &self.chars[..progress.chars_written];
            reserve_aligned(&mut self.output, self.encoder.max_byte_count(chars.len()));
            self.encoder.encode(chars, &mut self.output, flush && progress.completed);
            if progress.completed {
                break;
            }
        }
        &self.output
    }

    fn reset(&mut self) {
        self.decoder.reset();
        self.encoder.reset();
        self.output.clear();
    }
}
