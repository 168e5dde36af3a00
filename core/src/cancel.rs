/*
 * cancel.rs
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

//! Cooperative cancellation for blocking stream operations.
//!
//! Cancellation is checked before an operation is delegated to the underlying stream.
//! A blocking call already in progress is not interrupted unless the stream overrides
//! the default methods with something finer grained.

use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::StreamError;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once `cancel` has been called.
    pub fn check(&self) -> Result<(), StreamError> {
        if self.is_cancelled() {
            Err(StreamError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A reader whose reads can be abandoned through a `CancellationToken`.
pub trait CancellableRead: Read {
    fn read_cancellable(&mut self, buf: &mut [u8], token: &CancellationToken) -> io::Result<usize> {
        token.check()?;
        self.read(buf)
    }
}

/// A writer whose writes and flushes can be abandoned through a `CancellationToken`.
pub trait CancellableWrite: Write {
    fn write_cancellable(&mut self, buf: &[u8], token: &CancellationToken) -> io::Result<usize> {
        token.check()?;
        self.write(buf)
    }

    fn write_all_cancellable(&mut self, mut buf: &[u8], token: &CancellationToken) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write_cancellable(buf, token) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn flush_cancellable(&mut self, token: &CancellationToken) -> io::Result<()> {
        token.check()?;
        self.flush()
    }
}

impl CancellableRead for File {}
impl CancellableWrite for File {}
impl CancellableRead for TcpStream {}
impl CancellableWrite for TcpStream {}
impl CancellableRead for &[u8] {}
impl CancellableWrite for Vec<u8> {}
impl<T: AsRef<[u8]>> CancellableRead for Cursor<T> {}
impl CancellableWrite for Cursor<Vec<u8>> {}
impl CancellableWrite for Cursor<&mut Vec<u8>> {}
impl CancellableWrite for Cursor<&mut [u8]> {}

impl<R: CancellableRead + ?Sized> CancellableRead for &mut R {
    fn read_cancellable(&mut self, buf: &mut [u8], token: &CancellationToken) -> io::Result<usize> {
        (**self).read_cancellable(buf, token)
    }
}

impl<W: CancellableWrite + ?Sized> CancellableWrite for &mut W {
    fn write_cancellable(&mut self, buf: &[u8], token: &CancellationToken) -> io::Result<usize> {
        (**self).write_cancellable(buf, token)
    }

    fn flush_cancellable(&mut self, token: &CancellationToken) -> io::Result<()> {
        (**self).flush_cancellable(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::stream_error;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());
        other.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(StreamError::Cancelled)));
    }

    #[test]
    fn cancelled_read_consumes_nothing() {
        let token = CancellationToken::new();
        let mut src = Cursor::new(b"hello".to_vec());
        let mut buf = [0u8; 5];
        assert_eq!(src.read_cancellable(&mut buf[..2], &token).unwrap(), 2);
        token.cancel();
        let err = src.read_cancellable(&mut buf, &token).unwrap_err();
        assert!(matches!(stream_error(&err), Some(StreamError::Cancelled)));
        assert_eq!(src.position(), 2);
    }

    #[test]
    fn cancelled_write_through_reference() {
        let token = CancellationToken::new();
        let mut sink = Vec::new();
        {
            let w = &mut sink;
            w.write_all_cancellable(b"abc", &token).unwrap();
            token.cancel();
            assert!(w.write_cancellable(b"def", &token).is_err());
            assert!(w.flush_cancellable(&token).is_err());
        }
        assert_eq!(sink, b"abc");
    }
}
