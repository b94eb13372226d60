//! gzip back-end over flate2's encoder/decoder wrappers
//!
//! Unlike the raw deflate adapter this one is one-shot only: the gzip
//! wrapper types drive whole members at a time. The compress entry point is
//! the unchecked flavor (the dispatch layer guarantees a worst-case sized
//! buffer), and the ISIZE trailer provides the uncompressed size for
//! payloads under 4 GiB.

use std::io::{Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use vise_core::{Backend, CodecDecl, OptionKind, OptionSchema, OptionSpec, Options};
use vise_types::{CodecInfo, Error, Ops, Result};

const OPT_LEVEL: usize = 0;

const GZIP_OPTIONS: &[OptionSpec] = &[OptionSpec {
    name: "level",
    kind: OptionKind::Int {
        min: 1,
        max: 9,
        modulus: None,
        allow_zero: false,
        default: 6,
    },
}];

// Header is 10 bytes without optional fields, trailer is CRC32 + ISIZE.
const GZIP_HEADER_SIZE: usize = 10;
const GZIP_TRAILER_SIZE: usize = 8;

pub(crate) struct GzipBackend;

impl Backend for GzipBackend {
    fn ops(&self) -> Ops {
        Ops::COMPRESS_BUFFER_UNCHECKED | Ops::DECOMPRESS_BUFFER | Ops::UNCOMPRESSED_SIZE
    }

    fn info(&self) -> CodecInfo {
        CodecInfo::KNOWS_UNCOMPRESSED_SIZE | CodecInfo::WRAP_SIZE
    }

    fn options_schema(&self) -> OptionSchema {
        OptionSchema::new(GZIP_OPTIONS)
    }

    fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
        let blocks = uncompressed_len / 16_383 + 1;
        uncompressed_len
            .saturating_add(blocks.saturating_mul(5))
            .saturating_add(GZIP_HEADER_SIZE + GZIP_TRAILER_SIZE)
    }

    fn uncompressed_size(&self, compressed: &[u8]) -> Option<usize> {
        if compressed.len() < GZIP_HEADER_SIZE + GZIP_TRAILER_SIZE {
            return None;
        }
        let isize_bytes: [u8; 4] = compressed[compressed.len() - 4..].try_into().ok()?;
        Some(u32::from_le_bytes(isize_bytes) as usize)
    }

    fn compress_buffer_unchecked(
        &self,
        output: &mut [u8],
        input: &[u8],
        options: &Options,
    ) -> Result<usize> {
        let level = options.int_at(OPT_LEVEL)? as u32;
        let mut encoder = GzEncoder::new(
            Vec::with_capacity(input.len() / 2 + 64),
            Compression::new(level),
        );
        encoder
            .write_all(input)
            .map_err(|e| Error::failed(format!("gzip: {e}")))?;
        let encoded = encoder
            .finish()
            .map_err(|e| Error::failed(format!("gzip: {e}")))?;
        if encoded.len() > output.len() {
            return Err(Error::BufferFull);
        }
        output[..encoded.len()].copy_from_slice(&encoded);
        Ok(encoded.len())
    }

    fn decompress_buffer(
        &self,
        output: &mut [u8],
        input: &[u8],
        _options: &Options,
    ) -> Result<usize> {
        let hint = self.uncompressed_size(input).unwrap_or(input.len() * 2);
        let mut decoded = Vec::with_capacity(hint);
        MultiGzDecoder::new(input)
            .read_to_end(&mut decoded)
            .map_err(|e| Error::failed(format!("gunzip: {e}")))?;
        if decoded.len() > output.len() {
            return Err(Error::BufferFull);
        }
        output[..decoded.len()].copy_from_slice(&decoded);
        Ok(decoded.len())
    }
}

pub(crate) fn declarations() -> Vec<CodecDecl> {
    vec![CodecDecl {
        name: "gzip",
        extension: Some("gz"),
        priority: 50,
        backend: std::sync::Arc::new(GzipBackend),
    }]
}
