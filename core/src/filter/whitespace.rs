/*
 * whitespace.rs
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

//! Removal of trailing whitespace at the end of lines.

use super::{reserve_aligned, MimeFilter};

/// Drops spaces and tabs that immediately precede a line break or the end of the stream.
///
/// A whitespace run at the end of a call is held until the next non-whitespace byte shows
/// whether it is trailing.
#[derive(Debug, Default, Clone)]
pub struct TrailingWhitespaceFilter {
    output: Vec<u8>,
    pending: Vec<u8>,
}

impl TrailingWhitespaceFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MimeFilter for TrailingWhitespaceFilter {
    fn transform(&mut self, input: &[u8], flush: bool) -> &[u8] {
        self.output.clear();
        reserve_aligned(&mut self.output, input.len() + self.pending.len());

        for &b in input {
            match b {
                b' ' | b'\t' => self.pending.push(b),
                b'\r' | b'\n' => {
                    self.pending.clear();
                    self.output.push(b);
                }
                _ => {
                    self.output.extend_from_slice(&self.pending);
                    self.pending.clear();
                    self.output.push(b);
                }
            }
        }

        if flush {
            self.pending.clear();
        }
        &self.output
    }

    fn reset(&mut self) {
        self.output.clear();
        self.pending.clear();
    }
}
