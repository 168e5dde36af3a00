/*
 * config.rs
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

//! Stream options: read-ahead block size and buffer pool geometry.
//! Options can be embedded in an application's serde configuration or read from
//! the `<stream>` element of an XML configuration file (quick_xml, same layout as
//! the credentials file: one child element per value).

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Deserialize;

use crate::error::StreamError;

/// Size of the block a filter stream pulls from its source per read.
pub const DEFAULT_READ_BLOCK_SIZE: usize = 4096;
/// Size of each buffer handed out by the default pool.
pub const DEFAULT_POOL_BUFFER_SIZE: usize = 2048;
/// Number of idle buffers the default pool retains.
pub const DEFAULT_POOL_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StreamOptions {
    pub read_block_size: usize,
    pub pool_buffer_size: usize,
    pub pool_capacity: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            read_block_size: DEFAULT_READ_BLOCK_SIZE,
            pool_buffer_size: DEFAULT_POOL_BUFFER_SIZE,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl StreamOptions {
    /// Reject sizes the streams cannot work with. A pool capacity of 0 is allowed
    /// (every rent allocates, nothing is retained).
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.read_block_size == 0 {
            return Err(StreamError::config("read-block-size must be greater than 0"));
        }
        if self.pool_buffer_size == 0 {
            return Err(StreamError::config("pool-buffer-size must be greater than 0"));
        }
        Ok(())
    }

    /// Parse options from XML. Expects `<stream><read-block-size>4096</read-block-size>...</stream>`;
    /// missing elements keep their defaults, unknown elements are ignored.
    pub fn from_xml(content: &str) -> Result<Self, StreamError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut options = StreamOptions::default();
        let mut in_stream = false;
        let mut element_name = Vec::<u8>::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Err(e) => return Err(StreamError::config(format!("XML parse error: {}", e))),
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) => {
                    let name = e.name();
                    let name = name.as_ref();
                    if name == b"stream" {
                        in_stream = true;
                    } else if in_stream {
                        element_name.clear();
                        element_name.extend_from_slice(name);
                    }
                }
                Ok(Event::Text(e)) => {
                    if !in_stream || element_name.is_empty() {
                        continue;
                    }
                    let text = e.unescape().map_err(|e| StreamError::config(e.to_string()))?;
                    let text = text.trim();
                    match element_name.as_slice() {
                        b"read-block-size" => options.read_block_size = parse_size(text, "read-block-size")?,
                        b"pool-buffer-size" => options.pool_buffer_size = parse_size(text, "pool-buffer-size")?,
                        b"pool-capacity" => options.pool_capacity = parse_size(text, "pool-capacity")?,
                        _ => {}
                    }
                    element_name.clear();
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"stream" {
                        in_stream = false;
                    }
                    element_name.clear();
                }
                _ => {}
            }
            buf.clear();
        }

        options.validate()?;
        Ok(options)
    }
}

fn parse_size(text: &str, name: &str) -> Result<usize, StreamError> {
    text.parse::<usize>()
        .map_err(|_| StreamError::config(format!("{} is not a number: {:?}", name, text)))
}
