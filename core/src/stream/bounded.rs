/*
 * bounded.rs
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

//! A window onto a sub-range of another stream.

use std::io::{self, Read, Seek, SeekFrom, Write};

use tracing::warn;

use super::{seek_target, stream_len, SetLen};
use crate::cancel::{CancellableRead, CancellableWrite};
use crate::error::StreamError;

/// Restricts a seekable base stream to `[start, end)`, or to everything from `start` on
/// when unbounded. Positions are relative to `start`.
///
/// The base is re-positioned before every read or write, so several views can take
/// turns over one base stream. Pass `&mut base` to keep ownership of the base, or the
/// base itself to hand it over.
#[derive(Debug)]
pub struct BoundedView<S> {
    base: S,
    start: u64,
    /// Absolute end offset in the base; `None` grows with writes.
    end: Option<u64>,
    position: u64,
    eos: bool,
    /// Furthest absolute offset known to be the end of the base.
    observed_end: Option<u64>,
    closed: bool,
}

impl<S> BoundedView<S> {
    /// View of `len` bytes of `base` starting at `start`.
    pub fn new(base: S, start: u64, len: u64) -> Self {
        Self::with_end(base, start, Some(start.saturating_add(len)))
    }

    /// View of everything in `base` from `start` on. Writes may extend the base.
    pub fn unbounded(base: S, start: u64) -> Self {
        Self::with_end(base, start, None)
    }

    fn with_end(base: S, start: u64, end: Option<u64>) -> Self {
        Self {
            base,
            start,
            end,
            position: 0,
            eos: false,
            observed_end: None,
            closed: false,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.end.is_some()
    }

    /// Offset of the view's start in the base stream.
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn get_ref(&self) -> &S {
        &self.base
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.base
    }

    pub fn into_inner(self) -> S {
        self.base
    }

    /// Stop using the view. Later operations fail with `Disposed`; closing again is a no-op.
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn check_open(&self) -> Result<(), StreamError> {
        if self.closed {
            Err(StreamError::Disposed)
        } else {
            Ok(())
        }
    }

    fn absolute(&self) -> Result<u64, StreamError> {
        self.start
            .checked_add(self.position)
            .ok_or(StreamError::InvalidSeek)
    }
}

impl<S: Seek> BoundedView<S> {
    /// Length of the view. When unbounded this is derived from the base, or from the
    /// last observed end of the base if it cannot report its length.
    pub fn len(&mut self) -> io::Result<u64> {
        self.check_open()?;
        if let Some(end) = self.end {
            return Ok(end - self.start);
        }
        match stream_len(&mut self.base) {
            Ok(len) => Ok(len.saturating_sub(self.start)),
            Err(e) => match self.observed_end {
                Some(end) => Ok(end.saturating_sub(self.start)),
                None => Err(e),
            },
        }
    }

    fn sync_base(&mut self, absolute: u64) -> io::Result<()> {
        if self.base.stream_position()? != absolute {
            self.base.seek(SeekFrom::Start(absolute))?;
        }
        Ok(())
    }

    /// Whether the base now extends past the last observed end of stream.
    fn base_grew(&mut self) -> bool {
        match (stream_len(&mut self.base), self.observed_end) {
            (Ok(len), Some(end)) => len > end,
            _ => false,
        }
    }

    fn note_end(&mut self, absolute: u64) {
        if self.observed_end.map_or(true, |end| absolute > end) {
            self.observed_end = Some(absolute);
        }
    }
}

impl<S: Read + Seek> Read for BoundedView<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        if self.eos {
            // An unbounded view follows its base, which another user may have extended.
            if self.end.is_some() || !self.base_grew() {
                return Ok(0);
            }
            self.eos = false;
        }
        let absolute = self.absolute()?;
        let mut want = buf.len();
        if let Some(end) = self.end {
            if absolute >= end {
                self.eos = true;
                return Ok(0);
            }
            want = want.min(usize::try_from(end - absolute).unwrap_or(usize::MAX));
        }
        self.sync_base(absolute)?;
        let n = self.base.read(&mut buf[..want])?;
        if n == 0 {
            self.eos = true;
            self.note_end(absolute);
        }
        self.position += n as u64;
        Ok(n)
    }
}

impl<S: Write + Seek> Write for BoundedView<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        let absolute = self.absolute()?;
        if let Some(end) = self.end {
            let last = absolute
                .checked_add(buf.len() as u64)
                .ok_or(StreamError::InvalidSeek)?;
            if last > end {
                self.eos = true;
                warn!(offset = last - self.start, end = end - self.start, "write past bounded view");
                return Err(StreamError::OutOfBounds {
                    offset: last - self.start,
                    end: end - self.start,
                }
                .into());
            }
        }
        if buf.is_empty() {
            return Ok(0);
        }
        self.sync_base(absolute)?;
        let n = self.base.write(buf)?;
        self.position += n as u64;
        if n > 0 {
            self.eos = false;
            if self.end.is_none() {
                self.note_end(absolute + n as u64);
            }
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.base.flush()
    }
}

impl<S: Seek> Seek for BoundedView<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.check_open()?;
        let len = match pos {
            SeekFrom::End(_) => self.len()?,
            _ => 0,
        };
        let target = seek_target(pos, self.position, len)?;
        if let Some(end) = self.end {
            let bound = end - self.start;
            if target > bound {
                return Err(StreamError::OutOfBounds { offset: target, end: bound }.into());
            }
        }
        self.position = target;
        self.eos = false;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        self.check_open()?;
        Ok(self.position)
    }
}

impl<S: SetLen + Seek> SetLen for BoundedView<S> {
    /// Grows the base when the view must extend past the base's end; otherwise only the
    /// bound moves. Bytes of the base beyond the view are never truncated.
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.check_open()?;
        let new_end = self.start.checked_add(len).ok_or(StreamError::InvalidSeek)?;
        let base_len = stream_len(&mut self.base)?;
        let grows = self.end.map_or(true, |end| new_end > end);
        if grows && base_len < new_end {
            self.base.set_len(new_end)?;
            self.note_end(new_end);
        }
        if self.end.is_some() || base_len > new_end {
            self.end = Some(new_end);
        }
        self.eos = false;
        Ok(())
    }
}

impl<S: CancellableRead + Seek> CancellableRead for BoundedView<S> {}
impl<S: CancellableWrite + Seek> CancellableWrite for BoundedView<S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::stream_error;
    use std::io::Cursor;

    fn base() -> Cursor<Vec<u8>> {
        Cursor::new(b"0123456789abcdef".to_vec())
    }

    #[test]
    fn read_stays_within_range() {
        let mut b = base();
        let mut v = BoundedView::new(&mut b, 4, 5);
        let mut out = Vec::new();
        v.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"45678");
        assert_eq!(v.read(&mut [0u8; 4]).unwrap(), 0);
        assert_eq!(v.len().unwrap(), 5);
    }

    #[test]
    fn write_up_to_end_succeeds_one_past_fails() {
        let mut b = base();
        {
            let mut v = BoundedView::new(&mut b, 2, 4);
            v.write_all(b"WXYZ").unwrap();
            v.seek(SeekFrom::Start(0)).unwrap();
            let err = v.write(b"ABCDE").unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::Unsupported);
            assert!(matches!(
                stream_error(&err),
                Some(StreamError::OutOfBounds { offset: 5, end: 4 })
            ));
            // The failed write marks end of stream.
            assert_eq!(v.read(&mut [0u8; 4]).unwrap(), 0);
        }
        assert_eq!(b.get_ref(), b"01WXYZ6789abcdef");
    }

    #[test]
    fn views_share_a_base() {
        let mut b = base();
        let mut first = BoundedView::new(b.clone(), 0, 3);
        let mut buf = [0u8; 2];
        first.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"01");

        // Another user moves the base; the view re-seeks.
        first.get_mut().seek(SeekFrom::Start(12)).unwrap();
        first.read_exact(&mut buf[..1]).unwrap();
        assert_eq!(buf[0], b'2');

        let mut second = BoundedView::new(&mut b, 10, 6);
        let mut s = String::new();
        second.read_to_string(&mut s).unwrap();
        assert_eq!(s, "abcdef");
    }

    #[test]
    fn seek_rules() {
        let mut v = BoundedView::new(base(), 4, 6);
        assert_eq!(v.seek(SeekFrom::End(-2)).unwrap(), 4);
        let mut buf = [0u8; 4];
        assert_eq!(v.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"89");
        assert_eq!(v.seek(SeekFrom::End(0)).unwrap(), 6);

        let err = v.seek(SeekFrom::Current(-7)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let err = v.seek(SeekFrom::Start(7)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert_eq!(v.stream_position().unwrap(), 6);
    }

    #[test]
    fn unbounded_view_grows_base() {
        let mut b = Cursor::new(b"head".to_vec());
        let mut v = BoundedView::unbounded(&mut b, 2);
        assert!(!v.is_bounded());
        assert_eq!(v.seek(SeekFrom::End(0)).unwrap(), 2);
        v.write_all(b"-tail").unwrap();
        assert_eq!(v.len().unwrap(), 7);
        v.seek(SeekFrom::Start(0)).unwrap();
        let mut s = String::new();
        v.read_to_string(&mut s).unwrap();
        assert_eq!(s, "ad-tail");
        assert_eq!(b.get_ref(), b"head-tail");
    }

    #[test]
    fn unbounded_view_sees_base_grow_after_end() {
        let mut b = Cursor::new(b"ab".to_vec());
        let mut v = BoundedView::unbounded(&mut b, 0);
        let mut out = Vec::new();
        v.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"ab");
        assert_eq!(v.read(&mut [0u8; 4]).unwrap(), 0);

        v.get_mut().get_mut().extend_from_slice(b"cd");
        assert_eq!(v.len().unwrap(), 4);
        out.clear();
        v.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"cd");
        assert_eq!(v.read(&mut [0u8; 4]).unwrap(), 0);
    }

    #[test]
    fn set_len_grows_base_or_moves_bound() {
        let mut b = Cursor::new(b"0123456789".to_vec());
        {
            let mut v = BoundedView::new(&mut b, 6, 2);
            v.set_len(3).unwrap();
            assert_eq!(v.len().unwrap(), 3);
            v.set_len(6).unwrap();
            assert_eq!(v.len().unwrap(), 6);
            let mut out = Vec::new();
            v.read_to_end(&mut out).unwrap();
            assert_eq!(out, b"6789\0\0");
            v.set_len(1).unwrap();
            assert_eq!(v.len().unwrap(), 1);
        }
        assert_eq!(b.get_ref().len(), 12);
    }

    #[test]
    fn closed_view_reports_disposed() {
        let mut v = BoundedView::new(base(), 0, 4);
        v.close();
        v.close();
        let err = v.read(&mut [0u8; 1]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert!(v.seek(SeekFrom::Start(0)).is_err());
        assert!(v.write(b"x").is_err());
    }
}
