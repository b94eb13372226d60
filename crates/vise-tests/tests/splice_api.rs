//! Cross-codec tests for the splice engine

use std::io::{Read, Write};

use vise_core::splice;
use vise_tests::{all_codecs, pseudo_random};
use vise_types::Direction;

/// A sink that counts bytes without storing them.
#[derive(Default)]
struct NullSink {
    written: u64,
}

impl Write for NullSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.written += buf.len() as u64;
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A reader that hands out data in deliberately awkward small pieces.
struct TricklingReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Read for TricklingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let step = 1 + (self.pos % 251);
        let n = step.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[test]
fn splice_round_trip_every_codec() {
    let payload = pseudo_random(300 * 1024, 42);
    for codec in all_codecs() {
        let mut source: &[u8] = &payload;
        let mut compressed = Vec::new();
        splice(
            &codec,
            Direction::Compress,
            &mut compressed,
            &mut source,
            Some(payload.len() as u64),
            None,
        )
        .unwrap();

        let mut compressed_source: &[u8] = &compressed;
        let mut plain = Vec::new();
        splice(
            &codec,
            Direction::Decompress,
            &mut plain,
            &mut compressed_source,
            Some(compressed.len() as u64),
            None,
        )
        .unwrap();
        assert_eq!(plain, payload, "{}", codec.name());
    }
}

#[test]
fn splice_ten_mebibytes_preserves_byte_count() {
    // Pump 10 MiB through compress and decompress with the default 64 KiB
    // windows, measuring only lengths on the way out.
    let payload = pseudo_random(10 * 1024 * 1024, 7);
    let codec = vise_codecs::get_codec("zstd").unwrap();

    let mut source: &[u8] = &payload;
    let mut compressed = Vec::new();
    let written = splice(
        &codec,
        Direction::Compress,
        &mut compressed,
        &mut source,
        None,
        None,
    )
    .unwrap();
    assert_eq!(written, compressed.len() as u64);

    let mut compressed_source: &[u8] = &compressed;
    let mut sink = NullSink::default();
    let plain_len = splice(
        &codec,
        Direction::Decompress,
        &mut sink,
        &mut compressed_source,
        None,
        None,
    )
    .unwrap();
    assert_eq!(plain_len, payload.len() as u64);
    assert_eq!(sink.written, payload.len() as u64);
}

#[test]
fn splice_from_trickling_reader() {
    // Short reads from the source must not corrupt the pipeline.
    let payload = pseudo_random(100_000, 99);
    let codec = vise_codecs::get_codec("zlib").unwrap();

    let mut source = TricklingReader {
        data: &payload,
        pos: 0,
    };
    let mut compressed = Vec::new();
    splice(
        &codec,
        Direction::Compress,
        &mut compressed,
        &mut source,
        None,
        None,
    )
    .unwrap();

    let plain = codec.decompress_to_vec(&compressed, None).unwrap();
    assert_eq!(plain, payload);
}

#[test]
fn splice_through_bridged_codec() {
    let payload = pseudo_random(200_000, 5);
    let codec = vise_codecs::get_codec("brotli").unwrap();

    let mut source: &[u8] = &payload;
    let mut compressed = Vec::new();
    splice(
        &codec,
        Direction::Compress,
        &mut compressed,
        &mut source,
        None,
        None,
    )
    .unwrap();

    let mut compressed_source: &[u8] = &compressed;
    let mut plain = Vec::new();
    splice(
        &codec,
        Direction::Decompress,
        &mut plain,
        &mut compressed_source,
        None,
        None,
    )
    .unwrap();
    assert_eq!(plain, payload);
}

#[test]
fn splice_empty_source() {
    for codec in all_codecs() {
        let mut source: &[u8] = b"";
        let mut compressed = Vec::new();
        splice(
            &codec,
            Direction::Compress,
            &mut compressed,
            &mut source,
            Some(0),
            None,
        )
        .unwrap();

        let mut compressed_source: &[u8] = &compressed;
        let mut plain = Vec::new();
        splice(
            &codec,
            Direction::Decompress,
            &mut plain,
            &mut compressed_source,
            None,
            None,
        )
        .unwrap();
        assert!(plain.is_empty(), "{}", codec.name());
    }
}
