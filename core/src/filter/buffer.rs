/*
 * buffer.rs
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

//! Output buffer sizing and carry-over for filters.

/// Output buffers grow in multiples of this many bytes.
pub(crate) const OUTPUT_ALIGN: usize = 64;
/// The carry-over join buffer grows in multiples of this many bytes.
const JOIN_BLOCK: usize = 4096;

fn round_up(n: usize, align: usize) -> usize {
    n.div_ceil(align).saturating_mul(align)
}

/// Make room for `additional` more bytes, rounding the new capacity up to `OUTPUT_ALIGN`.
pub(crate) fn reserve_aligned(buf: &mut Vec<u8>, additional: usize) {
    let needed = buf.len() + additional;
    if needed > buf.capacity() {
        buf.reserve_exact(round_up(needed, OUTPUT_ALIGN) - buf.len());
    }
}

/// Make `buf` at least `len` bytes long (zero-filled when grown). Never shrinks.
pub(crate) fn ensure_len_aligned(buf: &mut Vec<u8>, len: usize) {
    if buf.len() < len {
        buf.resize(round_up(len, OUTPUT_ALIGN), 0);
    }
}

/// Bytes a filter could not process yet, prepended to the next call's input.
#[derive(Debug, Default, Clone)]
pub(crate) struct CarryOver {
    pending: Vec<u8>,
    joined: Vec<u8>,
    used_join: bool,
}

impl CarryOver {
    /// The effective input for this call: pending bytes followed by `input`.
    /// Pending bytes are consumed; use `keep_tail` to hold bytes back again.
    pub(crate) fn join<'a>(&'a mut self, input: &'a [u8]) -> &'a [u8] {
        if self.pending.is_empty() {
            self.used_join = false;
            return input;
        }
        let total = self.pending.len() + input.len();
        self.joined.clear();
        if total > self.joined.capacity() {
            self.joined.reserve_exact(round_up(total, JOIN_BLOCK));
        }
        self.joined.extend_from_slice(&self.pending);
        self.joined.extend_from_slice(input);
        self.pending.clear();
        self.used_join = true;
        &self.joined
    }

    /// Hold the last `count` bytes of the effective input from the preceding `join`.
    pub(crate) fn keep_tail(&mut self, input: &[u8], count: usize) {
        let src: &[u8] = if self.used_join { &self.joined } else { input };
        self.pending.clear();
        self.pending.extend_from_slice(&src[src.len() - count..]);
        self.used_join = false;
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
        self.used_join = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_rounds_to_alignment() {
        let mut v = Vec::new();
        reserve_aligned(&mut v, 1);
        assert_eq!(v.capacity() % OUTPUT_ALIGN, 0);
        assert!(v.capacity() >= OUTPUT_ALIGN);
        let cap = v.capacity();
        reserve_aligned(&mut v, 10);
        assert_eq!(v.capacity(), cap);
    }

    #[test]
    fn ensure_len_never_shrinks() {
        let mut v = Vec::new();
        ensure_len_aligned(&mut v, 100);
        assert_eq!(v.len(), 128);
        ensure_len_aligned(&mut v, 10);
        assert_eq!(v.len(), 128);
    }

    #[test]
    fn join_without_pending_is_input() {
        let mut c = CarryOver::default();
        assert_eq!(c.join(b"abc"), b"abc");
        c.keep_tail(b"abc", 1);
        assert_eq!(c.len(), 1);
        assert_eq!(c.join(b"de"), b"cde");
        c.keep_tail(b"de", 0);
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn keep_tail_spanning_pending_and_input() {
        let mut c = CarryOver::default();
        let _ = c.join(b"Fr");
        c.keep_tail(b"Fr", 2);
        let _ = c.join(b"o");
        c.keep_tail(b"o", 3);
        assert_eq!(c.join(b"m "), b"From ");
    }
}
