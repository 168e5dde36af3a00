/*
 * lib.rs
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

//! Streaming transform core for MIME content: incremental filters with carry-over and
//! flush, the streams that drive them, bounded/concatenated/pooled virtual streams, and a
//! bounded buffer pool.

pub mod cancel;
pub mod charset;
pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod pool;
pub mod stream;

pub use cancel::{CancellableRead, CancellableWrite, CancellationToken};
pub use config::StreamOptions;
pub use error::{stream_error, StreamError};
pub use filter::{FilterChain, MimeFilter, PassThroughFilter};
pub use pool::BufferPool;
pub use stream::{
    AsyncFilterStream, BoundedView, ConcatStream, FilterStream, PooledBlockStream, SetLen,
};
