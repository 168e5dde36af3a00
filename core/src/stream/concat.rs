/*
 * concat.rs
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

//! Several streams presented as one.

use std::io::{self, Read, Seek, SeekFrom, Write};

use tracing::debug;

use super::{seek_target, stream_len};
use crate::cancel::{CancellableRead, CancellableWrite};
use crate::error::StreamError;

/// An ordered list of child streams read, written and sought as one continuous stream.
///
/// Which operations are available follows from what the children support: reading needs
/// `Read` children, writing needs `Write + Seek` (every child but the last is filled only
/// up to its current length), seeking needs `Seek`. With no children all three fail as
/// unsupported. Children are crossed strictly in order. Hold children as `&mut S` to
/// keep ownership of them.
#[derive(Debug)]
pub struct ConcatStream<S> {
    children: Vec<S>,
    current: usize,
    /// Offset of the current child's first byte.
    child_start: u64,
    position: u64,
    eos: bool,
    closed: bool,
}

impl<S> ConcatStream<S> {
    pub fn new(children: Vec<S>) -> Self {
        Self {
            children,
            current: 0,
            child_start: 0,
            position: 0,
            eos: false,
            closed: false,
        }
    }

    /// Append a child after the existing ones.
    pub fn push(&mut self, child: S) {
        self.children.push(child);
        self.eos = false;
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn children(&self) -> &[S] {
        &self.children
    }

    pub fn into_children(self) -> Vec<S> {
        self.children
    }

    /// Stop using the stream. Later operations fail with `Disposed`; closing again is a
    /// no-op. Children are dropped only when the stream is.
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

    fn advance(&mut self) {
        self.current += 1;
        self.child_start = self.position;
        debug!(child = self.current, offset = self.position, "advancing to next stream");
    }
}

impl<S: Seek> ConcatStream<S> {
    /// Sum of the children's lengths.
    pub fn len(&mut self) -> io::Result<u64> {
        self.check_open()?;
        let mut total = 0u64;
        for child in &mut self.children {
            total = total.saturating_add(stream_len(child)?);
        }
        Ok(total)
    }
}

impl<S: Read> Read for ConcatStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_open()?;
        if self.children.is_empty() {
            return Err(StreamError::Unsupported("read from an empty concatenation").into());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        while !self.eos {
            let Some(child) = self.children.get_mut(self.current) else {
                self.eos = true;
                break;
            };
            let n = child.read(buf)?;
            if n > 0 {
                self.position += n as u64;
                return Ok(n);
            }
            if self.current + 1 < self.children.len() {
                self.advance();
            } else {
                self.eos = true;
            }
        }
        Ok(0)
    }
}

impl<S: Write + Seek> Write for ConcatStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        if self.children.is_empty() {
            return Err(StreamError::Unsupported("write to an empty concatenation").into());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let last = self.current + 1 >= self.children.len();
            let child = &mut self.children[self.current];
            let n = if last {
                child.write(buf)?
            } else {
                let room = stream_len(child)?.saturating_sub(child.stream_position()?);
                if room == 0 {
                    child.flush()?;
                    self.advance();
                    continue;
                }
                let take = usize::try_from(room).unwrap_or(usize::MAX).min(buf.len());
                let n = child.write(&buf[..take])?;
                if n == take && take as u64 == room {
                    child.flush()?;
                    self.position += n as u64;
                    self.advance();
                    self.eos = false;
                    return Ok(n);
                }
                n
            };
            self.position += n as u64;
            self.eos = false;
            return Ok(n);
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_open()?;
        for child in &mut self.children {
            child.flush()?;
        }
        Ok(())
    }
}

impl<S: Seek> Seek for ConcatStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.check_open()?;
        if self.children.is_empty() {
            return Err(StreamError::Unsupported("seek in an empty concatenation").into());
        }
        let len = match pos {
            SeekFrom::End(_) => self.len()?,
            _ => 0,
        };
        let target = seek_target(pos, self.position, len)?;

        // Forward seeks continue from the current child; backward ones start over.
        let (mut index, mut start) = if target >= self.child_start {
            (self.current, self.child_start)
        } else {
            (0, 0)
        };
        loop {
            let child_len = stream_len(&mut self.children[index])?;
            if target < start.saturating_add(child_len) || index + 1 == self.children.len() {
                break;
            }
            start += child_len;
            index += 1;
        }

        self.children[index].seek(SeekFrom::Start(target - start))?;
        for later in &mut self.children[index + 1..] {
            later.seek(SeekFrom::Start(0))?;
        }
        self.current = index;
        self.child_start = start;
        self.position = target;
        self.eos = false;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        self.check_open()?;
        Ok(self.position)
    }
}

impl<S: CancellableRead> CancellableRead for ConcatStream<S> {}
impl<S: CancellableWrite + Seek> CancellableWrite for ConcatStream<S> {}
