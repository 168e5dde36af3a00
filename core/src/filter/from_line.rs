/*
 * from_line.rs
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

//! Protection of lines starting with `From ` (the mbox message separator).

use super::{reserve_aligned, CarryOver, MimeFilter};

const FROM: &[u8] = b"From ";

#[derive(Debug, Clone, Copy)]
enum Escape {
    /// Replace the `F` with its quoted-printable form `=46`.
    QuotedPrintable,
    /// Prefix the line with `>`.
    Quote,
}

/// Line-start scanner shared by both `From ` filters.
#[derive(Debug, Default, Clone)]
struct FromLineScanner {
    carry: CarryOver,
    output: Vec<u8>,
    mid_line: bool,
}

impl FromLineScanner {
    fn scan(&mut self, input: &[u8], flush: bool, escape: Escape) -> &[u8] {
        self.output.clear();
        let data = self.carry.join(input);
        // Worst case every line is "From \n": two extra bytes per six.
        reserve_aligned(&mut self.output, data.len() + (data.len() / 6 + 1) * 2);

        let mut i = 0;
        let mut held = 0;
        while i < data.len() {
            if !self.mid_line {
                let rest = &data[i..];
                if !flush && rest.len() < FROM.len() && FROM.starts_with(rest) {
                    held = rest.len();
                    break;
                }
                if rest.starts_with(FROM) {
                    match escape {
                        Escape::QuotedPrintable => {
                            self.output.extend_from_slice(b"=46");
                            i += 1;
                        }
                        Escape::Quote => self.output.push(b'>'),
                    }
                }
                self.mid_line = true;
            }
            match data[i..].iter().position(|&b| b == b'\n') {
                Some(p) => {
                    self.output.extend_from_slice(&data[i..=i + p]);
                    i += p + 1;
                    self.mid_line = false;
                }
                None => {
                    self.output.extend_from_slice(&data[i..]);
                    i = data.len();
                }
            }
        }

        self.carry.keep_tail(input, held);
        debug_assert!(self.carry.len() < FROM.len());
        &self.output
    }

    fn reset(&mut self) {
        self.output.clear();
        self.carry.clear();
        self.mid_line = false;
    }
}

/// Armors lines beginning with `From ` by quoted-printable encoding the `F` (`=46rom `),
/// so that the content survives storage in an mbox file. Intended for bodies that are
/// already quoted-printable encoded.
#[derive(Debug, Default, Clone)]
pub struct ArmoredFromFilter {
    scanner: FromLineScanner,
}

impl ArmoredFromFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MimeFilter for ArmoredFromFilter {
    fn transform(&mut self, input: &[u8], flush: bool) -> &[u8] {
        self.scanner.scan(input, flush, Escape::QuotedPrintable)
    }

    fn reset(&mut self) {
        self.scanner.reset();
    }
}

/// Quotes lines beginning with `From ` with a leading `>` when writing messages into an mbox.
#[derive(Debug, Default, Clone)]
pub struct MboxFromFilter {
    scanner: FromLineScanner,
}

impl MboxFromFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MimeFilter for MboxFromFilter {
    fn transform(&mut self, input: &[u8], flush: bool) -> &[u8] {
        self.scanner.scan(input, flush, Escape::Quote)
    }

    fn reset(&mut self) {
        self.scanner.reset();
    }
}
