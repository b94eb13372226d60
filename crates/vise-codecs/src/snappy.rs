//! Snappy back-ends over the snap raw block and frame formats
//!
//! The raw block format is one-shot: snap's compress insists on a
//! `max_compress_len` sized output up front, which makes it the unchecked
//! flavor, and decompress is sized exactly from the length carried in the
//! block header. The framed variant chunks input into checksummed frames
//! and round-trips payloads of any size, at a few bytes per frame.

use std::io::{Read, Write};

use snap::raw::{decompress_len, max_compress_len, Decoder, Encoder};
use vise_core::{Backend, CodecDecl, Options};
use vise_types::{CodecInfo, Error, Ops, Result};

pub(crate) struct SnappyBackend;

fn map_error(e: snap::Error) -> Error {
    match e {
        snap::Error::BufferTooSmall { .. } => Error::BufferFull,
        snap::Error::TooBig { given, max } => {
            Error::range(format!("snappy payload of {given} bytes exceeds {max}"))
        }
        other => Error::failed(format!("snappy: {other}")),
    }
}

impl Backend for SnappyBackend {
    fn ops(&self) -> Ops {
        Ops::COMPRESS_BUFFER_UNCHECKED | Ops::DECOMPRESS_BUFFER | Ops::UNCOMPRESSED_SIZE
    }

    fn info(&self) -> CodecInfo {
        CodecInfo::KNOWS_UNCOMPRESSED_SIZE
    }

    fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
        max_compress_len(uncompressed_len)
    }

    fn uncompressed_size(&self, compressed: &[u8]) -> Option<usize> {
        decompress_len(compressed).ok()
    }

    fn compress_buffer_unchecked(
        &self,
        output: &mut [u8],
        input: &[u8],
        _options: &Options,
    ) -> Result<usize> {
        Encoder::new().compress(input, output).map_err(map_error)
    }

    fn decompress_buffer(
        &self,
        output: &mut [u8],
        input: &[u8],
        _options: &Options,
    ) -> Result<usize> {
        let expected = decompress_len(input).map_err(map_error)?;
        if output.len() < expected {
            return Err(Error::BufferFull);
        }
        Decoder::new().decompress(input, output).map_err(map_error)
    }
}

pub(crate) struct SnappyFramedBackend;

// Frames carry up to 64 KiB of payload each.
const FRAME_PAYLOAD: usize = 65_536;
const STREAM_HEADER: usize = 10;
const FRAME_HEADER: usize = 8;

impl Backend for SnappyFramedBackend {
    fn ops(&self) -> Ops {
        Ops::COMPRESS_BUFFER | Ops::DECOMPRESS_BUFFER
    }

    fn info(&self) -> CodecInfo {
        CodecInfo::empty()
    }

    fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
        let frames = uncompressed_len / FRAME_PAYLOAD + 1;
        // Each frame's payload is at worst max_compress_len of a full chunk
        // beyond its plain size.
        let per_frame_overhead =
            FRAME_HEADER + (max_compress_len(FRAME_PAYLOAD) - FRAME_PAYLOAD);
        uncompressed_len
            .saturating_add(frames.saturating_mul(per_frame_overhead))
            .saturating_add(STREAM_HEADER)
    }

    fn compress_buffer(&self, output: &mut [u8], input: &[u8], _options: &Options) -> Result<usize> {
        let mut encoder = snap::write::FrameEncoder::new(Vec::with_capacity(
            input.len() / 2 + STREAM_HEADER + FRAME_HEADER,
        ));
        encoder
            .write_all(input)
            .map_err(|e| Error::failed(format!("snappy-framed: {e}")))?;
        let encoded = encoder
            .into_inner()
            .map_err(|e| Error::failed(format!("snappy-framed: {e}")))?;
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
        let mut decoded = Vec::with_capacity(input.len() * 2);
        snap::read::FrameDecoder::new(input)
            .read_to_end(&mut decoded)
            .map_err(|e| Error::failed(format!("snappy-framed: {e}")))?;
        if decoded.len() > output.len() {
            return Err(Error::BufferFull);
        }
        output[..decoded.len()].copy_from_slice(&decoded);
        Ok(decoded.len())
    }
}

pub(crate) fn declarations() -> Vec<CodecDecl> {
    vec![
        CodecDecl {
            name: "snappy",
            extension: Some("sz"),
            priority: 50,
            backend: std::sync::Arc::new(SnappyBackend),
        },
        CodecDecl {
            name: "snappy-framed",
            extension: None,
            priority: 50,
            backend: std::sync::Arc::new(SnappyFramedBackend),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> vise_core::Codec {
        let mut registry = vise_core::Registry::new();
        for decl in declarations() {
            registry.register(decl).unwrap();
        }
        registry.get("snappy").unwrap()
    }

    #[test]
    fn test_round_trip() {
        let c = codec();
        let payload = b"snappy favors speed over ratio".repeat(12);
        let compressed = c.compress_to_vec(&payload, None).unwrap();
        assert_eq!(c.uncompressed_size(&compressed), Some(payload.len()));
        let back = c.decompress_to_vec(&compressed, None).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_scratch_path_when_output_undersized() {
        let c = codec();
        let payload = vec![3u8; 10_000];
        let compressed = c.compress_to_vec(&payload, None).unwrap();
        // Smaller than max_compress_len but big enough for the result.
        let mut out = vec![0u8; compressed.len() + 8];
        let n = c.compress(&mut out, &payload, None).unwrap();
        assert_eq!(&out[..n], &compressed[..]);
    }

    #[test]
    fn test_empty_payload() {
        let c = codec();
        let compressed = c.compress_to_vec(b"", None).unwrap();
        let back = c.decompress_to_vec(&compressed, None).unwrap();
        assert!(back.is_empty());
    }

    fn framed_codec() -> vise_core::Codec {
        let mut registry = vise_core::Registry::new();
        for decl in declarations() {
            registry.register(decl).unwrap();
        }
        registry.get("snappy-framed").unwrap()
    }

    #[test]
    fn test_framed_round_trip_across_frames() {
        let c = framed_codec();
        // More than two 64 KiB frames.
        let payload: Vec<u8> = (0u8..=255).cycle().take(150_000).collect();
        let compressed = c.compress_to_vec(&payload, None).unwrap();
        let back = c.decompress_to_vec(&compressed, None).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_framed_corrupt_checksum_rejected() {
        let c = framed_codec();
        let mut compressed = c
            .compress_to_vec(b"checksummed frames detect damage", None)
            .unwrap();
        let last = compressed.len() - 1;
        compressed[last] ^= 0xff;
        assert!(c.decompress_to_vec(&compressed, None).is_err());
    }
}
