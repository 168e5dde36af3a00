/*
 * filter.rs
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

//! Blocking stream that runs reads and writes through a filter chain.

use std::io::{self, Read, Write};

use tracing::{debug, trace};

use crate::cancel::{CancellableRead, CancellableWrite, CancellationToken};
use crate::config::{StreamOptions, DEFAULT_READ_BLOCK_SIZE};
use crate::error::StreamError;
use crate::filter::{FilterChain, MimeFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastOp {
    None,
    Read,
    Write,
}

/// Wraps a source stream with an ordered chain of filters.
///
/// Bytes read from the source pass through the chain before reaching the caller; bytes
/// written by the caller pass through the chain before reaching the source. The read path
/// never flushes the chain: a filter still holding bytes when the source ends keeps them.
/// After a run of writes, `flush` lets the filters emit their trailing output.
///
/// There is no `Seek` implementation: filter state depends on everything seen so far.
pub struct FilterStream<S> {
    source: S,
    chain: FilterChain,
    last_op: LastOp,
    flushed: bool,
    block: Vec<u8>,
    /// Filtered read data not yet handed out.
    filtered: Vec<u8>,
    filtered_pos: usize,
    /// Filtered write data, reused across writes.
    outgoing: Vec<u8>,
}

impl<S> FilterStream<S> {
    pub fn new(source: S) -> Self {
        Self::with_block_size(source, DEFAULT_READ_BLOCK_SIZE)
    }

    pub fn with_options(source: S, options: &StreamOptions) -> Result<Self, StreamError> {
        options.validate()?;
        Ok(Self::with_block_size(source, options.read_block_size))
    }

    fn with_block_size(source: S, block_size: usize) -> Self {
        Self {
            source,
            chain: FilterChain::new(),
            last_op: LastOp::None,
            flushed: true,
            block: vec![0u8; block_size.max(1)],
            filtered: Vec::new(),
            filtered_pos: 0,
            outgoing: Vec::new(),
        }
    }

    /// Append a filter to the end of the chain.
    pub fn add_filter<F: MimeFilter + 'static>(&mut self, filter: F) {
        self.chain.push(Box::new(filter));
    }

    pub fn with_filter<F: MimeFilter + 'static>(mut self, filter: F) -> Self {
        self.add_filter(filter);
        self
    }

    pub fn filter_count(&self) -> usize {
        self.chain.len()
    }

    /// Reset every filter and drop buffered read data, ready for a new logical stream
    /// over the same source.
    pub fn reset_filters(&mut self) {
        self.chain.reset();
        self.filtered.clear();
        self.filtered_pos = 0;
        self.last_op = LastOp::None;
        self.flushed = true;
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Unwrap the source. Filter output not yet flushed is lost.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn read_with<F>(&mut self, buf: &mut [u8], mut pull: F) -> io::Result<usize>
    where
        F: FnMut(&mut S, &mut [u8]) -> io::Result<usize>,
    {
        self.last_op = LastOp::Read;
        if buf.is_empty() {
            return Ok(0);
        }
        while self.filtered_pos == self.filtered.len() {
            self.filtered.clear();
            self.filtered_pos = 0;
            let n = pull(&mut self.source, &mut self.block[..])?;
            if n == 0 {
                return Ok(0);
            }
            self.chain.process(&self.block[..n], false, &mut self.filtered);
            trace!(read = n, filtered = self.filtered.len(), "filtered source block");
        }
        let available = &self.filtered[self.filtered_pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.filtered_pos += n;
        Ok(n)
    }

    fn write_with<F>(&mut self, buf: &[u8], mut push: F) -> io::Result<usize>
    where
        F: FnMut(&mut S, &[u8]) -> io::Result<()>,
    {
        if self.last_op == LastOp::Read {
            // Read-ahead belongs to source bytes before the write position.
            self.filtered.clear();
            self.filtered_pos = 0;
        }
        self.last_op = LastOp::Write;
        self.flushed = false;
        self.outgoing.clear();
        self.chain.process(buf, false, &mut self.outgoing);
        if !self.outgoing.is_empty() {
            push(&mut self.source, &self.outgoing)?;
        }
        Ok(buf.len())
    }

    /// Emit the chain's trailing output once per write run. Returns false when there was
    /// nothing to flush because the last operation was a read.
    fn flush_chain_with<F>(&mut self, mut push: F) -> io::Result<bool>
    where
        F: FnMut(&mut S, &[u8]) -> io::Result<()>,
    {
        match self.last_op {
            LastOp::Read => return Ok(false),
            LastOp::Write if !self.flushed => {
                self.outgoing.clear();
                self.chain.process(&[], true, &mut self.outgoing);
                self.flushed = true;
                debug!(trailing = self.outgoing.len(), "flushed filter chain");
                if !self.outgoing.is_empty() {
                    push(&mut self.source, &self.outgoing)?;
                }
            }
            _ => {}
        }
        Ok(true)
    }
}

impl<S: Read> Read for FilterStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_with(buf, |s, b| s.read(b))
    }
}

impl<S: Write> Write for FilterStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_with(buf, |s, b| s.write_all(b))
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.flush_chain_with(|s, b| s.write_all(b))? {
            self.source.flush()?;
        }
        Ok(())
    }
}

impl<S: CancellableRead> CancellableRead for FilterStream<S> {
    fn read_cancellable(&mut self, buf: &mut [u8], token: &CancellationToken) -> io::Result<usize> {
        self.read_with(buf, |s, b| s.read_cancellable(b, token))
    }
}

impl<S: CancellableWrite> CancellableWrite for FilterStream<S> {
    fn write_cancellable(&mut self, buf: &[u8], token: &CancellationToken) -> io::Result<usize> {
        // Checked before any filter sees the bytes.
        token.check()?;
        self.write_with(buf, |s, b| s.write_all_cancellable(b, token))
    }

    fn flush_cancellable(&mut self, token: &CancellationToken) -> io::Result<()> {
        token.check()?;
        if self.flush_chain_with(|s, b| s.write_all_cancellable(b, token))? {
            self.source.flush_cancellable(token)?;
        }
        Ok(())
    }
}

impl<S> std::fmt::Debug for FilterStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStream")
            .field("chain", &self.chain)
            .field("last_op", &self.last_op)
            .field("flushed", &self.flushed)
            .finish_non_exhaustive()
    }
}
