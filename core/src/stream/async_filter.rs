/*
 * async_filter.rs
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

//! Filter stream over tokio's async I/O traits.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::{debug, trace};

use crate::config::{StreamOptions, DEFAULT_READ_BLOCK_SIZE};
use crate::error::StreamError;
use crate::filter::{FilterChain, MimeFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastOp {
    None,
    Read,
    Write,
}

/// Async counterpart of [`FilterStream`](super::FilterStream).
///
/// Same ordering and flush rules. The filter chain only runs between suspension points:
/// output the source has not accepted yet is parked and drained before any further
/// filtering, so a pending source never sees bytes out of order.
pub struct AsyncFilterStream<S> {
    source: S,
    chain: FilterChain,
    last_op: LastOp,
    flushed: bool,
    block: Vec<u8>,
    filtered: Vec<u8>,
    filtered_pos: usize,
    /// Filtered write data the source has not taken yet.
    outgoing: Vec<u8>,
    outgoing_pos: usize,
}

impl<S> AsyncFilterStream<S> {
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
            outgoing_pos: 0,
        }
    }

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

    /// Reset every filter and drop buffered read data. Parked write output is kept; it
    /// was produced before the reset and still belongs to the source.
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

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: AsyncWrite + Unpin> AsyncFilterStream<S> {
    /// Hand parked output to the source.
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while self.outgoing_pos < self.outgoing.len() {
            let pending = &self.outgoing[self.outgoing_pos..];
            let n = ready!(Pin::new(&mut self.source).poll_write(cx, pending))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.outgoing_pos += n;
        }
        self.outgoing.clear();
        self.outgoing_pos = 0;
        Poll::Ready(Ok(()))
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for AsyncFilterStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.last_op = LastOp::Read;
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        while this.filtered_pos == this.filtered.len() {
            this.filtered.clear();
            this.filtered_pos = 0;
            let n = {
                let mut block = ReadBuf::new(&mut this.block);
                ready!(Pin::new(&mut this.source).poll_read(cx, &mut block))?;
                block.filled().len()
            };
            if n == 0 {
                return Poll::Ready(Ok(()));
            }
            this.chain.process(&this.block[..n], false, &mut this.filtered);
            trace!(read = n, filtered = this.filtered.len(), "filtered source block");
        }
        let available = &this.filtered[this.filtered_pos..];
        let n = available.len().min(buf.remaining());
        buf.put_slice(&available[..n]);
        this.filtered_pos += n;
        Poll::Ready(Ok(()))
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for AsyncFilterStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.last_op == LastOp::Read {
            this.filtered.clear();
            this.filtered_pos = 0;
        }
        this.last_op = LastOp::Write;
        ready!(this.poll_drain(cx))?;
        this.flushed = false;
        this.chain.process(buf, false, &mut this.outgoing);
        // The bytes are accepted; whatever the source does not take now stays parked.
        if let Poll::Ready(Err(e)) = this.poll_drain(cx) {
            return Poll::Ready(Err(e));
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match this.last_op {
            LastOp::Read => return Poll::Ready(Ok(())),
            LastOp::Write if !this.flushed => {
                ready!(this.poll_drain(cx))?;
                this.chain.process(&[], true, &mut this.outgoing);
                this.flushed = true;
                debug!(trailing = this.outgoing.len(), "flushed filter chain");
            }
            _ => {}
        }
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.source).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        ready!(self.as_mut().poll_flush(cx))?;
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.source).poll_shutdown(cx)
    }
}

impl<S> std::fmt::Debug for AsyncFilterStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFilterStream")
            .field("chain", &self.chain)
            .field("last_op", &self.last_op)
            .field("flushed", &self.flushed)
            .field("parked", &(self.outgoing.len() - self.outgoing_pos))
            .finish_non_exhaustive()
    }
}
