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

//! Incremental, restartable byte filters.
//!
//! A filter is fed a stream in arbitrary chunks. Whatever it cannot decide yet (a CR that
//! may start a CRLF, a truncated `From ` at a line start, half of a UTF-8 sequence) is kept
//! in filter state and reconsidered on the next call, so splitting the input differently
//! never changes the concatenated output. A final call with `flush = true` emits everything
//! still pending.

mod buffer;
mod chain;
mod charset;
mod codec;
mod dot_stuff;
mod from_line;
mod line_ending;
mod whitespace;

pub use chain::FilterChain;
pub use charset::CharsetFilter;
pub use codec::{DecoderFilter, EncoderFilter};
pub use dot_stuff::DotStuffFilter;
pub use from_line::{ArmoredFromFilter, MboxFromFilter};
pub use line_ending::{Dos2UnixFilter, Unix2DosFilter};
pub use whitespace::TrailingWhitespaceFilter;

pub(crate) use buffer::{ensure_len_aligned, reserve_aligned, CarryOver};

/// A stateful byte transform.
///
/// The returned slice borrows the filter's output buffer and is only valid until the next
/// call. Implementations must account for every input byte: it is either in the returned
/// output or held for a later call, never both and never lost.
pub trait MimeFilter: Send {
    /// Transform `input`. With `flush`, nothing may be held back for a later call.
    fn transform(&mut self, input: &[u8], flush: bool) -> &[u8];

    fn filter(&mut self, input: &[u8]) -> &[u8] {
        self.transform(input, false)
    }

    /// Transform the last chunk of input and emit all pending state.
    fn flush(&mut self, input: &[u8]) -> &[u8] {
        self.transform(input, true)
    }

    /// Return to the initial state. Buffers are kept for reuse.
    fn reset(&mut self);
}

impl<F: MimeFilter + ?Sized> MimeFilter for Box<F> {
    fn transform(&mut self, input: &[u8], flush: bool) -> &[u8] {
        (**self).transform(input, flush)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Returns its input unchanged.
#[derive(Debug, Default, Clone)]
pub struct PassThroughFilter {
    output: Vec<u8>,
}

impl PassThroughFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MimeFilter for PassThroughFilter {
    fn transform(&mut self, input: &[u8], _flush: bool) -> &[u8] {
        self.output.clear();
        reserve_aligned(&mut self.output, input.len());
        self.output.extend_from_slice(input);
        &self.output
    }

    fn reset(&mut self) {
        self.output.clear();
    }
}
