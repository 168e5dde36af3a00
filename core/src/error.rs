/*
 * error.rs
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

//! Stream and filter errors.

use std::fmt;
use std::io;

/// Errors raised by the stream primitives and the buffer pool.
///
/// I/O errors from wrapped streams are never converted into this type; they are
/// propagated unchanged. At the `Read`/`Write`/`Seek` boundary a `StreamError`
/// becomes an [`io::Error`] carrying it as the inner error.
#[derive(Debug)]
pub enum StreamError {
    /// The stream cannot perform this operation at all.
    Unsupported(&'static str),
    /// A write or seek would leave the bounded range `[start, end)`.
    OutOfBounds { offset: u64, end: u64 },
    /// Seek to a position before the start of the stream.
    SeekBeforeStart,
    /// Seek arithmetic overflowed.
    InvalidSeek,
    /// The stream has been closed.
    Disposed,
    /// The cancellation token was triggered before the operation was issued.
    Cancelled,
    /// A buffer returned to a pool does not have the pool's buffer size.
    BufferSizeMismatch { expected: usize, actual: usize },
    /// Invalid stream options.
    Config(String),
}

impl StreamError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            StreamError::Unsupported(_) | StreamError::OutOfBounds { .. } => {
                io::ErrorKind::Unsupported
            }
            StreamError::SeekBeforeStart | StreamError::InvalidSeek => io::ErrorKind::InvalidInput,
            StreamError::Disposed => io::ErrorKind::NotConnected,
            StreamError::Cancelled
            | StreamError::BufferSizeMismatch { .. }
            | StreamError::Config(_) => io::ErrorKind::Other,
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Unsupported(what) => write!(f, "operation not supported: {}", what),
            StreamError::OutOfBounds { offset, end } => {
                write!(f, "offset {} is beyond the end of the bounded stream ({})", offset, end)
            }
            StreamError::SeekBeforeStart => write!(f, "cannot seek before the start of the stream"),
            StreamError::InvalidSeek => write!(f, "seek position overflow"),
            StreamError::Disposed => write!(f, "stream has been closed"),
            StreamError::Cancelled => write!(f, "operation cancelled"),
            StreamError::BufferSizeMismatch { expected, actual } => write!(
                f,
                "buffer of {} bytes returned to a pool of {}-byte buffers",
                actual, expected
            ),
            StreamError::Config(m) => write!(f, "invalid stream options: {}", m),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        io::Error::new(e.io_kind(), e)
    }
}

/// Recover the `StreamError` carried by an `io::Error`, if any.
pub fn stream_error(e: &io::Error) -> Option<&StreamError> {
    e.get_ref().and_then(|inner| inner.downcast_ref::<StreamError>())
}
