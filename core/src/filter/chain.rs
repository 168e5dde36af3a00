/*
 * chain.rs
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

//! Ordered list of filters applied one after another.

use super::MimeFilter;

/// Filters in processing order. The output of each filter is the input of the next; the
/// same filter type may appear more than once.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn MimeFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: Box<dyn MimeFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run `input` through every filter and append the result to `out`.
    pub fn process(&mut self, input: &[u8], flush: bool, out: &mut Vec<u8>) {
        run(&mut self.filters, input, flush, out);
    }

    pub fn reset(&mut self) {
        for f in &mut self.filters {
            f.reset();
        }
    }
}

fn run(filters: &mut [Box<dyn MimeFilter>], input: &[u8], flush: bool, out: &mut Vec<u8>) {
    match filters.split_first_mut() {
        None => out.extend_from_slice(input),
        Some((first, rest)) => {
            let produced = first.transform(input, flush);
            run(rest, produced, flush, out);
        }
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain").field("len", &self.filters.len()).finish()
    }
}

impl FromIterator<Box<dyn MimeFilter>> for FilterChain {
    fn from_iter<I: IntoIterator<Item = Box<dyn MimeFilter>>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ArmoredFromFilter, Dos2UnixFilter, Unix2DosFilter};

    #[test]
    fn empty_chain_copies_input() {
        let mut chain = FilterChain::new();
        let mut out = Vec::new();
        chain.process(b"abc", false, &mut out);
        assert_eq!(out, b"abc");
    }

    #[test]
    fn filters_apply_in_order() {
        // Dos2Unix then Unix2Dos turns bare LF and CRLF alike into CRLF.
        let mut chain = FilterChain::new();
        chain.push(Box::new(Dos2UnixFilter::new()));
        chain.push(Box::new(Unix2DosFilter::new()));
        let mut out = Vec::new();
        chain.process(b"a\nb\r", false, &mut out);
        chain.process(b"\nc", false, &mut out);
        chain.process(b"", true, &mut out);
        assert_eq!(out, b"a\r\nb\r\nc");
    }

    #[test]
    fn flush_passes_through_every_filter() {
        // The armoring filter holds "Fro"; its flushed output must still reach Unix2Dos.
        let mut chain: FilterChain = vec![
            Box::new(ArmoredFromFilter::new()) as Box<dyn MimeFilter>,
            Box::new(Unix2DosFilter::new()),
        ]
        .into_iter()
        .collect();
        let mut out = Vec::new();
        chain.process(b"x\nFro", false, &mut out);
        assert_eq!(out, b"x\r\n");
        chain.process(b"", true, &mut out);
        assert_eq!(out, b"x\r\nFro");
    }

    #[test]
    fn duplicates_allowed() {
        let mut chain = FilterChain::new();
        chain.push(Box::new(Unix2DosFilter::new()));
        chain.push(Box::new(Unix2DosFilter::new()));
        assert_eq!(chain.len(), 2);
        let mut out = Vec::new();
        chain.process(b"a\n", true, &mut out);
        assert_eq!(out, b"a\r\n");
    }
}
