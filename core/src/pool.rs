/*
 * pool.rs
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

//! Bounded pool of fixed-size byte buffers.
//!
//! The pool retains at most `capacity` idle buffers, so the memory it pins is bounded by
//! `capacity * buffer_size` no matter how many buffers are rented at once. Buffers rented
//! beyond what the pool holds are freshly allocated; buffers returned to a full pool are
//! dropped. The lock only guards the free list, never buffer contents.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::config::StreamOptions;
use crate::error::StreamError;

pub struct BufferPool {
    buffer_size: usize,
    capacity: usize,
    /// Free slots; `len()` is the index of the first free slot.
    free: Mutex<Vec<Box<[u8]>>>,
    allocations: AtomicUsize,
}

impl BufferPool {
    /// Pool of `buffer_size`-byte buffers retaining at most `capacity` idle buffers.
    pub fn new(buffer_size: usize, capacity: usize) -> Self {
        assert!(buffer_size > 0, "buffer pool buffer size must be non-zero");
        Self {
            buffer_size,
            capacity,
            free: Mutex::new(Vec::with_capacity(capacity)),
            allocations: AtomicUsize::new(0),
        }
    }

    pub fn from_options(options: &StreamOptions) -> Result<Self, StreamError> {
        options.validate()?;
        Ok(Self::new(options.pool_buffer_size, options.pool_capacity))
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of idle buffers currently held.
    pub fn available(&self) -> usize {
        self.lock().len()
    }

    /// Number of buffers this pool has had to allocate since it was created.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Take a buffer from the pool, allocating a new one if none is idle.
    /// Pooled buffers may hold data from a previous renter unless `clear` is set.
    pub fn rent(&self, clear: bool) -> Box<[u8]> {
        let pooled = self.lock().pop();
        match pooled {
            Some(mut buf) => {
                if clear {
                    buf.fill(0);
                }
                buf
            }
            None => {
                self.allocations.fetch_add(1, Ordering::Relaxed);
                trace!(size = self.buffer_size, "buffer pool empty, allocating");
                vec![0u8; self.buffer_size].into_boxed_slice()
            }
        }
    }

    /// Give a rented buffer back. A buffer of the wrong size is rejected; if the pool
    /// already holds `capacity` buffers the buffer is dropped.
    pub fn release(&self, buf: Box<[u8]>) -> Result<(), StreamError> {
        if buf.len() != self.buffer_size {
            return Err(StreamError::BufferSizeMismatch {
                expected: self.buffer_size,
                actual: buf.len(),
            });
        }
        let mut free = self.lock();
        if free.len() < self.capacity {
            free.push(buf);
        } else {
            drop(free);
            trace!(capacity = self.capacity, "buffer pool full, dropping buffer");
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Box<[u8]>>> {
        // The free list is a plain Vec; a panic elsewhere cannot leave it inconsistent.
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        let o = StreamOptions::default();
        Self::new(o.pool_buffer_size, o.pool_capacity)
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("buffer_size", &self.buffer_size)
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}
