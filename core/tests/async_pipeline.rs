/*
 * async_pipeline.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Integration tests for filter streams over tokio I/O.
 *
 * Run with:
 *   cargo test -p tagliacarte_stream --test async_pipeline
 */

mod common;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use tagliacarte_stream::codec::TransferEncoding;
use tagliacarte_stream::filter::{DecoderFilter, Dos2UnixFilter, EncoderFilter, Unix2DosFilter};
use tagliacarte_stream::{AsyncFilterStream, StreamOptions};

use common::{init_tracing, sample_message};

#[tokio::test]
async fn base64_round_trip() {
    init_tracing();
    let message = sample_message(40);

    let mut writer = AsyncFilterStream::new(Vec::new())
        .with_filter(EncoderFilter::for_encoding(TransferEncoding::Base64));
    for chunk in message.chunks(17) {
        writer.write_all(chunk).await.unwrap();
    }
    writer.shutdown().await.unwrap();
    let encoded = writer.into_inner();
    assert!(encoded.split(|&b| b == b'\n').all(|line| line.len() <= 78));

    let options = StreamOptions {
        read_block_size: 5,
        ..StreamOptions::default()
    };
    let mut reader = AsyncFilterStream::with_options(&encoded[..], &options)
        .unwrap()
        .with_filter(DecoderFilter::for_encoding(TransferEncoding::Base64));
    let mut decoded = Vec::new();
    reader.read_to_end(&mut decoded).await.unwrap();
    assert_eq!(decoded, message);
}

#[tokio::test]
async fn quoted_printable_copy_with_line_endings() {
    init_tracing();
    let message = sample_message(25);

    // Encode on the way in: LF text becomes CRLF, then quoted-printable.
    let unix: Vec<u8> = message
        .iter()
        .copied()
        .filter(|&b| b != b'\r')
        .collect();
    let mut source = AsyncFilterStream::new(&unix[..]).with_filter(Unix2DosFilter::new());
    let mut encoder = AsyncFilterStream::new(Vec::new())
        .with_filter(EncoderFilter::for_encoding(TransferEncoding::QuotedPrintable));
    tokio::io::copy(&mut source, &mut encoder).await.unwrap();
    encoder.shutdown().await.unwrap();
    let encoded = encoder.into_inner();
    assert!(encoded.windows(3).any(|w| w == b"=E2"));

    // Decode and strip carriage returns again.
    let mut reader = AsyncFilterStream::new(&encoded[..])
        .with_filter(DecoderFilter::for_encoding(TransferEncoding::QuotedPrintable))
        .with_filter(Dos2UnixFilter::new());
    assert_eq!(reader.filter_count(), 2);
    let mut decoded = Vec::new();
    reader.read_to_end(&mut decoded).await.unwrap();
    assert_eq!(decoded, unix);
}

#[tokio::test]
async fn reset_filters_starts_a_new_body() {
    init_tracing();
    let mut writer = AsyncFilterStream::new(Vec::new())
        .with_filter(EncoderFilter::for_encoding(TransferEncoding::Base64));
    writer.write_all(b"first").await.unwrap();
    writer.flush().await.unwrap();
    writer.reset_filters();
    writer.write_all(b"second").await.unwrap();
    writer.flush().await.unwrap();
    assert_eq!(writer.get_ref(), b"Zmlyc3Q=\r\nc2Vjb25k\r\n");
}
