/*
 * pipeline.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Integration tests composing bounded views, concatenation, filter streams
 * and pooled block streams the way a message body is staged for sending or
 * extracted from a stored message.
 *
 * Run with:
 *   cargo test -p tagliacarte_stream --test pipeline
 */

mod common;

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use tagliacarte_stream::codec::TransferEncoding;
use tagliacarte_stream::filter::{
    CharsetFilter, DecoderFilter, Dos2UnixFilter, DotStuffFilter, EncoderFilter,
    TrailingWhitespaceFilter,
};
use tagliacarte_stream::{
    stream_error, BoundedView, BufferPool, ConcatStream, FilterStream, PooledBlockStream,
    StreamError, StreamOptions,
};

use common::{init_tracing, sample_message};

fn crlf_to_lf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\r' && data.get(i + 1) == Some(&b'\n') {
            i += 1;
            continue;
        }
        out.push(data[i]);
        i += 1;
    }
    out
}

/// Break base64 text into CRLF lines of `width` characters.
fn wrap(text: &str, width: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for line in text.as_bytes().chunks(width) {
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out
}

#[test]
fn decode_body_split_across_bounded_views() {
    init_tracing();
    let body = b"Hello, streaming world!\r\nSecond line of the body.\r\n";
    let encoded = wrap(&STANDARD.encode(body), 20);
    let (part1, part2) = encoded.split_at(13);

    let mut message = b"Subject: test\r\n\r\n".to_vec();
    let first_start = message.len() as u64;
    message.extend_from_slice(part1);
    message.extend_from_slice(b"!!ignored!!");
    let second_start = message.len() as u64;
    message.extend_from_slice(part2);
    message.extend_from_slice(b"--trailer--\r\n");

    let views = vec![
        BoundedView::new(Cursor::new(&message[..]), first_start, part1.len() as u64),
        BoundedView::new(Cursor::new(&message[..]), second_start, part2.len() as u64),
    ];
    let mut reader = FilterStream::new(ConcatStream::new(views))
        .with_filter(DecoderFilter::for_encoding(TransferEncoding::Base64))
        .with_filter(Dos2UnixFilter::new());

    let pool = Arc::new(BufferPool::new(16, 4));
    let mut staged = PooledBlockStream::with_pool(pool);
    io::copy(&mut reader, &mut staged).unwrap();
    assert_eq!(staged.to_vec().unwrap(), crlf_to_lf(body));
}

#[test]
fn quoted_printable_round_trip_through_pooled_stream() {
    init_tracing();
    let message = b"keep me  \r\nFrom here\t\r\ncaf\xc3\xa9 = 100%\r\n.end \r\n";
    let expected = b"keep me\r\nFrom here\r\ncaf\xc3\xa9 = 100%\r\n.end\r\n";

    let pool = Arc::new(BufferPool::new(8, 4));
    let mut staged = PooledBlockStream::with_pool(pool.clone());
    {
        let mut writer = FilterStream::new(&mut staged)
            .with_filter(TrailingWhitespaceFilter::new())
            .with_filter(EncoderFilter::for_encoding(TransferEncoding::QuotedPrintable));
        for chunk in message.chunks(7) {
            writer.write_all(chunk).unwrap();
        }
        writer.flush().unwrap();
    }
    assert!(staged.block_count() > 1);
    let encoded = staged.to_vec().unwrap();
    assert!(encoded.windows(3).any(|w| w == b"=3D"));

    staged.seek(SeekFrom::Start(0)).unwrap();
    let mut reader = FilterStream::new(&mut staged)
        .with_filter(DecoderFilter::for_encoding(TransferEncoding::QuotedPrintable));
    let mut decoded = Vec::new();
    reader.read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, expected);
}

#[test]
fn smtp_data_staging() {
    init_tracing();
    let message = sample_message(10);
    let mut staged = PooledBlockStream::new();
    {
        let mut writer =
            FilterStream::new(&mut staged).with_filter(DotStuffFilter::new().terminate(true));
        writer.write_all(&message).unwrap();
        writer.flush().unwrap();
    }
    let mut wire = Vec::new();
    staged.write_to(&mut wire).unwrap();
    assert!(wire.ends_with(b"\r\n.\r\n"));
    assert_eq!(wire.len(), message.len() + 2 + 3);
    let text = String::from_utf8(wire).unwrap();
    assert!(text.contains("\r\n..dot line 1\r\n"));
    assert!(text.contains("\r\n..dot line 6\r\n"));
}

#[test]
fn encoded_output_is_contained_by_bounded_view() {
    init_tracing();
    let mut base = Cursor::new(vec![b'#'; 32]);
    {
        let view = BoundedView::new(&mut base, 8, 12);
        let mut writer = FilterStream::new(view)
            .with_filter(EncoderFilter::for_encoding(TransferEncoding::Base64));
        writer.write_all(b"abcdef").unwrap();
        writer.write_all(b"ghi").unwrap();
        // The closing CRLF would land past the end of the view.
        let err = writer.flush().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert!(matches!(
            stream_error(&err),
            Some(StreamError::OutOfBounds { offset: 14, end: 12 })
        ));
    }
    let base = base.into_inner();
    assert!(base[..8].iter().all(|&b| b == b'#'));
    assert_eq!(&base[8..20], b"YWJjZGVmZ2hp");
    assert!(base[20..].iter().all(|&b| b == b'#'));
}

#[test]
fn options_from_xml_drive_streams_and_pool() {
    init_tracing();
    let options = StreamOptions::from_xml(
        "<stream><read-block-size>5</read-block-size>\
         <pool-buffer-size>32</pool-buffer-size>\
         <pool-capacity>2</pool-capacity></stream>",
    )
    .unwrap();
    let pool = Arc::new(BufferPool::from_options(&options).unwrap());
    let message = sample_message(20);

    let mut staged = PooledBlockStream::with_pool(pool.clone());
    let mut reader = FilterStream::with_options(Cursor::new(message.clone()), &options)
        .unwrap()
        .with_filter(Dos2UnixFilter::new());
    io::copy(&mut reader, &mut staged).unwrap();
    assert_eq!(staged.block_size(), 32);
    assert_eq!(staged.to_vec().unwrap(), crlf_to_lf(&message));

    let blocks = staged.block_count();
    assert!(blocks > 2);
    drop(staged);
    // Only `capacity` blocks are retained; the rest were dropped.
    assert_eq!(pool.available(), 2);
    assert_eq!(pool.allocations(), blocks);
}

#[test]
fn transcode_quoted_printable_latin1_to_utf8() {
    init_tracing();
    let source = Cursor::new(b"caf=E9 na=EFve=\r\n d=E9j=E0 vu\r\n".to_vec());
    let mut reader = FilterStream::new(source)
        .with_filter(DecoderFilter::for_encoding(TransferEncoding::QuotedPrintable))
        .with_filter(CharsetFilter::from_names("iso-8859-1", "utf-8").unwrap());
    let mut text = String::new();
    reader.read_to_string(&mut text).unwrap();
    assert_eq!(text, "caf\u{e9} na\u{ef}ve d\u{e9}j\u{e0} vu\r\n");
}

#[test]
fn pool_shared_between_streams() {
    init_tracing();
    let pool = Arc::new(BufferPool::new(16, 8));
    let data = sample_message(3);
    for _ in 0..4 {
        let mut s = PooledBlockStream::with_pool(pool.clone());
        s.write_all(&data).unwrap();
        assert_eq!(s.to_vec().unwrap(), data);
    }
    let blocks = data.len().div_ceil(16);
    // Later streams reuse the blocks the first one returned.
    assert_eq!(pool.allocations(), blocks);
    assert_eq!(pool.available(), blocks);
}
