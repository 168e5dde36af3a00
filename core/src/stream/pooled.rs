/*
 * pooled.rs
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

//! Growable in-memory stream made of fixed-size pooled blocks.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use tracing::{trace, warn};

use super::{seek_target, SetLen};
use crate::cancel::{CancellableRead, CancellableWrite};
use crate::error::StreamError;
use crate::pool::BufferPool;

/// In-memory stream that grows by renting blocks from a [`BufferPool`] instead of
/// reallocating one contiguous buffer.
///
/// Bytes at or beyond the logical length are always zero, so a region exposed again by
/// growing reads back as zeros. Blocks go back to the pool on `close` or drop.
pub struct PooledBlockStream {
    pool: Arc<BufferPool>,
    blocks: Vec<Box<[u8]>>,
    length: usize,
    position: usize,
    closed: bool,
}

impl PooledBlockStream {
    /// Stream with its own default-sized pool.
    pub fn new() -> Self {
        Self::with_pool(Arc::new(BufferPool::default()))
    }

    /// Stream renting from a shared pool.
    pub fn with_pool(pool: Arc<BufferPool>) -> Self {
        Self {
            pool,
            blocks: Vec::new(),
            length: 0,
            position: 0,
            closed: false,
        }
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    pub fn block_size(&self) -> usize {
        self.pool.buffer_size()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bytes that fit without renting another block.
    pub fn capacity(&self) -> usize {
        self.blocks.len() * self.block_size()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Copy the whole content into one contiguous buffer.
    pub fn to_vec(&self) -> Result<Vec<u8>, StreamError> {
        self.check_open()?;
        let mut out = Vec::with_capacity(self.length);
        let mut remaining = self.length;
        for block in &self.blocks {
            if remaining == 0 {
                break;
            }
            let n = remaining.min(block.len());
            out.extend_from_slice(&block[..n]);
            remaining -= n;
        }
        Ok(out)
    }

    /// Write the whole content to `w`, block by block. The position is not used or moved.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        self.check_open()?;
        let mut remaining = self.length;
        for block in &self.blocks {
            if remaining == 0 {
                break;
            }
            let n = remaining.min(block.len());
            w.write_all(&block[..n])?;
            remaining -= n;
        }
        Ok(())
    }

    /// Return every block to the pool. Closing again is a no-op; other operations fail
    /// with `Disposed` afterwards.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let returned = self.blocks.len();
        self.return_blocks(0);
        self.length = 0;
        self.position = 0;
        trace!(blocks = returned, "pooled stream closed");
    }

    fn check_open(&self) -> Result<(), StreamError> {
        if self.closed {
            Err(StreamError::Disposed)
        } else {
            Ok(())
        }
    }

    fn return_blocks(&mut self, keep: usize) {
        for block in self.blocks.drain(keep..) {
            if let Err(e) = self.pool.release(block) {
                warn!(error = %e, "block not returned to pool");
            }
        }
    }

    /// Rent cleared blocks until `len` bytes fit.
    fn ensure_capacity(&mut self, len: usize) {
        let needed = len.div_ceil(self.block_size());
        while self.blocks.len() < needed {
            self.blocks.push(self.pool.rent(true));
        }
    }

    /// Zero `[from, to)`, which must lie within held blocks.
    fn zero_range(&mut self, from: usize, to: usize) {
        let size = self.block_size();
        let mut pos = from;
        while pos < to {
            let (index, offset) = (pos / size, pos % size);
            let n = (size - offset).min(to - pos);
            self.blocks[index][offset..offset + n].fill(0);
            pos += n;
        }
    }
}

impl Default for PooledBlockStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PooledBlockStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for PooledBlockStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBlockStream")
            .field("length", &self.length)
            .field("position", &self.position)
            .field("blocks", &self.blocks.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Read for PooledBlockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_open()?;
        if self.position >= self.length {
            return Ok(0);
        }
        let size = self.block_size();
        let total = buf.len().min(self.length - self.position);
        let mut done = 0;
        while done < total {
            let (index, offset) = (self.position / size, self.position % size);
            let n = (size - offset).min(total - done);
            buf[done..done + n].copy_from_slice(&self.blocks[index][offset..offset + n]);
            done += n;
            self.position += n;
        }
        Ok(done)
    }
}

impl Write for PooledBlockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        let end = self
            .position
            .checked_add(buf.len())
            .ok_or(StreamError::InvalidSeek)?;
        self.ensure_capacity(end);
        let size = self.block_size();
        let mut done = 0;
        while done < buf.len() {
            let (index, offset) = (self.position / size, self.position % size);
            let n = (size - offset).min(buf.len() - done);
            self.blocks[index][offset..offset + n].copy_from_slice(&buf[done..done + n]);
            done += n;
            self.position += n;
        }
        self.length = self.length.max(end);
        Ok(done)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_open()?;
        Ok(())
    }
}

impl Seek for PooledBlockStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.check_open()?;
        let target = seek_target(pos, self.position as u64, self.length as u64)?;
        self.position = usize::try_from(target).map_err(|_| StreamError::InvalidSeek)?;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        self.check_open()?;
        Ok(self.position as u64)
    }
}

impl SetLen for PooledBlockStream {
    /// Shrinking hands surplus blocks back to the pool and zeroes the cut-off tail of the
    /// last kept block. Growing rents cleared blocks. The position is left alone.
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.check_open()?;
        let len = usize::try_from(len).map_err(|_| StreamError::InvalidSeek)?;
        if len < self.length {
            let keep = len.div_ceil(self.block_size());
            self.return_blocks(keep);
            let held = self.capacity();
            self.zero_range(len, self.length.min(held));
        } else {
            self.ensure_capacity(len);
        }
        self.length = len;
        Ok(())
    }
}

impl CancellableRead for PooledBlockStream {}
impl CancellableWrite for PooledBlockStream {}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8 + 1).collect()
    }

    #[test]
    fn round_trip_across_blocks() {
        let pool = Arc::new(BufferPool::new(16, 8));
        let mut s = PooledBlockStream::with_pool(pool);
        let data = pattern(3 * 16 + 7);
        s.write_all(&data[..20]).unwrap();
        s.write_all(&data[20..]).unwrap();
        assert_eq!(s.len(), data.len());
        assert_eq!(s.block_count(), 4);
        assert_eq!(s.to_vec().unwrap(), data);

        s.seek(SeekFrom::Start(5)).unwrap();
        let mut buf = vec![0u8; 30];
        s.read_exact(&mut buf).unwrap();
        assert_eq!(buf, &data[5..35]);
    }

    #[test]
    fn shrink_then_grow_reads_zeros() {
        let pool = Arc::new(BufferPool::new(16, 8));
        let mut s = PooledBlockStream::with_pool(pool.clone());
        let data = pattern(3 * 16 + 7);
        s.write_all(&data).unwrap();

        s.set_len(20).unwrap();
        assert_eq!(s.block_count(), 2);
        assert_eq!(pool.available(), 2);
        s.set_len(data.len() as u64).unwrap();

        let out = s.to_vec().unwrap();
        assert_eq!(&out[..20], &data[..20]);
        assert!(out[20..].iter().all(|&b| b == 0));
    }

    #[test]
    fn stale_pool_data_is_never_exposed() {
        let pool = Arc::new(BufferPool::new(8, 4));
        let mut dirty = pool.rent(false);
        dirty.fill(0xAA);
        pool.release(dirty).unwrap();

        let mut s = PooledBlockStream::with_pool(pool);
        s.seek(SeekFrom::Start(3)).unwrap();
        s.write_all(b"x").unwrap();
        assert_eq!(s.to_vec().unwrap(), b"\0\0\0x");
    }

    #[test]
    fn write_past_end_leaves_zero_gap() {
        let mut s = PooledBlockStream::new();
        s.write_all(b"ab").unwrap();
        s.seek(SeekFrom::End(3)).unwrap();
        s.write_all(b"c").unwrap();
        assert_eq!(s.to_vec().unwrap(), b"ab\0\0\0c");
    }

    #[test]
    fn write_to_copies_content() {
        let pool = Arc::new(BufferPool::new(4, 4));
        let mut s = PooledBlockStream::with_pool(pool);
        s.write_all(b"hello pooled world").unwrap();
        let mut out = Vec::new();
        s.write_to(&mut out).unwrap();
        assert_eq!(out, b"hello pooled world");
    }

    #[test]
    fn close_returns_blocks_once() {
        let pool = Arc::new(BufferPool::new(16, 8));
        let mut s = PooledBlockStream::with_pool(pool.clone());
        s.write_all(&pattern(40)).unwrap();
        s.close();
        assert_eq!(pool.available(), 3);
        s.close();
        assert_eq!(pool.available(), 3);

        let err = s.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert!(matches!(s.to_vec(), Err(StreamError::Disposed)));
        drop(s);
        assert_eq!(pool.available(), 3);
    }

    #[test]
    fn drop_returns_blocks() {
        let pool = Arc::new(BufferPool::new(16, 8));
        {
            let mut s = PooledBlockStream::with_pool(pool.clone());
            s.write_all(&pattern(33)).unwrap();
        }
        assert_eq!(pool.available(), 3);
        assert_eq!(pool.allocations(), 3);
    }

    #[test]
    fn seek_before_start_fails() {
        let mut s = PooledBlockStream::new();
        let err = s.seek(SeekFrom::Current(-1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(s.stream_position().unwrap(), 0);
    }
}
