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

//! Stream primitives: the filter-driving stream and the virtual streams it is usually
//! composed with.

mod async_filter;
mod bounded;
mod concat;
mod filter;
mod pooled;

pub use async_filter::AsyncFilterStream;
pub use bounded::BoundedView;
pub use concat::ConcatStream;
pub use filter::FilterStream;
pub use pooled::PooledBlockStream;

use std::fs::File;
use std::io::{self, Cursor, Seek, SeekFrom};

use crate::error::StreamError;

/// Streams whose length can be changed in place.
pub trait SetLen {
    /// Truncate or extend to `len` bytes. Extended regions read as zero.
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

impl SetLen for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

impl SetLen for Cursor<Vec<u8>> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(|_| StreamError::InvalidSeek)?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

impl<T: SetLen + ?Sized> SetLen for &mut T {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        (**self).set_len(len)
    }
}

/// Length of a seekable stream. The stream position is left where it was.
pub(crate) fn stream_len<S: Seek + ?Sized>(s: &mut S) -> io::Result<u64> {
    let pos = s.stream_position()?;
    let end = s.seek(SeekFrom::End(0))?;
    if pos != end {
        s.seek(SeekFrom::Start(pos))?;
    }
    Ok(end)
}

/// Resolve a `SeekFrom` against the current position and length. Negative targets are
/// rejected before anything moves.
pub(crate) fn seek_target(pos: SeekFrom, current: u64, len: u64) -> Result<u64, StreamError> {
    let (base, offset) = match pos {
        SeekFrom::Start(n) => return Ok(n),
        SeekFrom::Current(d) => (current, d),
        SeekFrom::End(d) => (len, d),
    };
    let target = i128::from(base) + i128::from(offset);
    if target < 0 {
        return Err(StreamError::SeekBeforeStart);
    }
    u64::try_from(target).map_err(|_| StreamError::InvalidSeek)
}
