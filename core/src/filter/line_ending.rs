/*
 * line_ending.rs
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

//! Line-ending normalization: CRLF to LF and LF to CRLF.

use super::{reserve_aligned, MimeFilter};

/// Converts CRLF line endings to LF. A lone CR that is not followed by LF is kept.
///
/// A CR at the end of one call is held until the next call shows whether an LF follows.
#[derive(Debug, Default, Clone)]
pub struct Dos2UnixFilter {
    output: Vec<u8>,
    pending_cr: bool,
    last: Option<u8>,
    ensure_newline: bool,
}

impl Dos2UnixFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, flushing a stream that does not end with a line break appends `\n`.
    pub fn ensure_newline(mut self, ensure: bool) -> Self {
        self.ensure_newline = ensure;
        self
    }
}

impl MimeFilter for Dos2UnixFilter {
    fn transform(&mut self, input: &[u8], flush: bool) -> &[u8] {
        self.output.clear();
        reserve_aligned(&mut self.output, input.len() + 2);

        for &b in input {
            if self.pending_cr {
                self.pending_cr = false;
                if b == b'\n' {
                    self.output.push(b'\n');
                    continue;
                }
                self.output.push(b'\r');
            }
            if b == b'\r' {
                self.pending_cr = true;
            } else {
                self.output.push(b);
            }
        }

        if flush {
            if self.pending_cr {
                self.pending_cr = false;
                // A trailing CR counts as the final line break when one is required.
                self.output.push(if self.ensure_newline { b'\n' } else { b'\r' });
            }
            let last = self.output.last().copied().or(self.last);
            if self.ensure_newline && last.is_some() && last != Some(b'\n') {
                self.output.push(b'\n');
            }
        }

        if let Some(&b) = self.output.last() {
            self.last = Some(b);
        }
        &self.output
    }

    fn reset(&mut self) {
        self.output.clear();
        self.pending_cr = false;
        self.last = None;
    }
}

/// Converts bare LF line endings to CRLF; existing CRLF pairs are left alone.
#[derive(Debug, Default, Clone)]
pub struct Unix2DosFilter {
    output: Vec<u8>,
    prev: Option<u8>,
    ensure_newline: bool,
}

impl Unix2DosFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, flushing a stream that does not end with a line break appends CRLF.
    pub fn ensure_newline(mut self, ensure: bool) -> Self {
        self.ensure_newline = ensure;
        self
    }
}

impl MimeFilter for Unix2DosFilter {
    fn transform(&mut self, input: &[u8], flush: bool) -> &[u8] {
        self.output.clear();
        reserve_aligned(&mut self.output, input.len() * 2 + 2);

        for &b in input {
            if b == b'\n' && self.prev != Some(b'\r') {
                self.output.push(b'\r');
            }
            self.output.push(b);
            self.prev = Some(b);
        }

        if flush && self.ensure_newline {
            match self.prev {
                None | Some(b'\n') => {}
                Some(b'\r') => self.output.push(b'\n'),
                Some(_) => self.output.extend_from_slice(b"\r\n"),
            }
            if !self.output.is_empty() {
                self.prev = Some(b'\n');
            }
        }
        &self.output
    }

    fn reset(&mut self) {
        self.output.clear();
        self.prev = None;
    }
}
