/*
 * mod.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Shared helpers for the integration tests.
 */

#![allow(dead_code)]

use tracing_subscriber::EnvFilter;

/// Install a test subscriber once; `RUST_LOG` selects what is shown.
pub fn init_tracing() {
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt::Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .finish(),
    )
    .ok();
}

/// Deterministic text with CRLF lines, leading dots and `From ` lines.
pub fn sample_message(lines: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..lines {
        match i % 5 {
            0 => out.extend_from_slice(b"From the archive, line "),
            1 => out.extend_from_slice(b".dot line "),
            2 => out.extend_from_slice("caf\u{e9} \u{20ac} ".as_bytes()),
            3 => out.extend_from_slice(b"trailing space "),
            _ => out.extend_from_slice(b"plain "),
        }
        out.extend_from_slice(i.to_string().as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out
}
