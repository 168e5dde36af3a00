/*
 * dot_stuff.rs
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

//! Dot stuffing for SMTP DATA (RFC 5321: lines starting with . get an extra .).

use super::{reserve_aligned, MimeFilter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Normal,
    SawCr,
    SawCrLf,
}

/// Performs dot stuffing: at the start of the data and after every CRLF, a leading `.` is
/// doubled. Optionally terminates the data with `CRLF.CRLF` on flush.
#[derive(Debug, Clone)]
pub struct DotStuffFilter {
    output: Vec<u8>,
    state: State,
    terminate: bool,
}

impl Default for DotStuffFilter {
    fn default() -> Self {
        Self {
            output: Vec::new(),
            state: State::SawCrLf,
            terminate: false,
        }
    }
}

impl DotStuffFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, flush appends the end-of-data marker (`.` on a line of its own),
    /// preceded by CRLF unless the data already ends with one.
    pub fn terminate(mut self, terminate: bool) -> Self {
        self.terminate = terminate;
        self
    }
}

impl MimeFilter for DotStuffFilter {
    fn transform(&mut self, input: &[u8], flush: bool) -> &[u8] {
        self.output.clear();
        reserve_aligned(&mut self.output, input.len() + input.len() / 3 + 6);

        for &b in input {
            if self.state == State::SawCrLf && b == b'.' {
                self.output.push(b'.');
            }
            self.output.push(b);
            self.state = match (self.state, b) {
                (_, b'\r') => State::SawCr,
                (State::SawCr, b'\n') => State::SawCrLf,
                _ => State::Normal,
            };
        }

        if flush && self.terminate {
            let tail: &[u8] = match self.state {
                State::SawCrLf => b".\r\n",
                State::SawCr => b"\n.\r\n",
                State::Normal => b"\r\n.\r\n",
            };
            self.output.extend_from_slice(tail);
            self.state = State::SawCrLf;
        }
        &self.output
    }

    fn reset(&mut self) {
        self.output.clear();
        self.state = State::SawCrLf;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::testing::*;

    #[test]
    fn dot_after_crlf_is_doubled() {
        let mut s = DotStuffFilter::new();
        assert_eq!(run_whole(&mut s, b"a\r\n.\r\n"), b"a\r\n..\r\n");
    }

    #[test]
    fn dot_at_start_is_doubled() {
        let mut s = DotStuffFilter::new();
        assert_eq!(run_whole(&mut s, b".hidden"), b"..hidden");
    }

    #[test]
    fn dot_mid_line_untouched() {
        let mut s = DotStuffFilter::new();
        assert_eq!(run_whole(&mut s, b"a.b\n.c"), b"a.b\n.c");
    }

    #[test]
    fn terminator_emitted_on_flush() {
        let mut s = DotStuffFilter::new().terminate(true);
        assert_eq!(run_whole(&mut s, b""), b".\r\n");
    }

    #[test]
    fn line_with_dot_stuffed() {
        let mut s = DotStuffFilter::new().terminate(true);
        assert_eq!(run_split(&mut s, b"Hi\r\n.\r\nBye", &[3, 5]), b"Hi\r\n..\r\nBye\r\n.\r\n");
    }

    #[test]
    fn terminator_after_complete_line() {
        let mut s = DotStuffFilter::new().terminate(true);
        assert_eq!(run_whole(&mut s, b"Bye\r\n"), b"Bye\r\n.\r\n");
        let mut s = DotStuffFilter::new().terminate(true);
        assert_eq!(run_whole(&mut s, b"Bye\r"), b"Bye\r\n.\r\n");
    }

    #[test]
    fn split_invariant() {
        assert_split_invariant(
            || Box::new(DotStuffFilter::new().terminate(true)),
            b".a\r\n..\r\r\n.\n.\r\n",
        );
    }

    #[test]
    fn reset_returns_to_line_start() {
        assert_reset_replays(|| Box::new(DotStuffFilter::new()), b".x\r\n.y");
    }
}
