//! LZ4 back-end over lz4_flex's size-prepended block format
//!
//! One-shot only. The four-byte little-endian length prefix makes the
//! format self-describing, so arbitrary payloads round-trip without any
//! external length bookkeeping.

use vise_core::{Backend, CodecDecl, Options};
use vise_types::{CodecInfo, Error, Ops, Result};

const SIZE_PREFIX: usize = 4;

pub(crate) struct Lz4Backend;

impl Backend for Lz4Backend {
    fn ops(&self) -> Ops {
        Ops::COMPRESS_BUFFER | Ops::DECOMPRESS_BUFFER | Ops::UNCOMPRESSED_SIZE
    }

    fn info(&self) -> CodecInfo {
        CodecInfo::KNOWS_UNCOMPRESSED_SIZE | CodecInfo::WRAP_SIZE
    }

    fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
        lz4_flex::block::get_maximum_output_size(uncompressed_len) + SIZE_PREFIX
    }

    fn uncompressed_size(&self, compressed: &[u8]) -> Option<usize> {
        let prefix: [u8; 4] = compressed.get(..SIZE_PREFIX)?.try_into().ok()?;
        Some(u32::from_le_bytes(prefix) as usize)
    }

    fn compress_buffer(&self, output: &mut [u8], input: &[u8], _options: &Options) -> Result<usize> {
        // The length prefix is 32-bit; larger payloads cannot be framed.
        u32::try_from(input.len())
            .map_err(|_| Error::range("lz4 block input exceeds 4 GiB"))?;
        let compressed = lz4_flex::compress_prepend_size(input);
        if compressed.len() > output.len() {
            return Err(Error::BufferFull);
        }
        output[..compressed.len()].copy_from_slice(&compressed);
        Ok(compressed.len())
    }

    fn decompress_buffer(
        &self,
        output: &mut [u8],
        input: &[u8],
        _options: &Options,
    ) -> Result<usize> {
        let expected = self.uncompressed_size(input).ok_or(Error::BufferEmpty)?;
        if output.len() < expected {
            return Err(Error::BufferFull);
        }
        let decompressed = lz4_flex::decompress_size_prepended(input)
            .map_err(|e| Error::failed(format!("lz4: {e}")))?;
        output[..decompressed.len()].copy_from_slice(&decompressed);
        Ok(decompressed.len())
    }
}

pub(crate) fn declarations() -> Vec<CodecDecl> {
    vec![CodecDecl {
        name: "lz4",
        extension: Some("lz4"),
        priority: 50,
        backend: std::sync::Arc::new(Lz4Backend),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> vise_core::Codec {
        let mut registry = vise_core::Registry::new();
        for decl in declarations() {
            registry.register(decl).unwrap();
        }
        registry.get("lz4").unwrap()
    }

    #[test]
    fn test_round_trip() {
        let c = codec();
        let payload = b"lz4 blocks with a length prefix".repeat(16);
        let compressed = c.compress_to_vec(&payload, None).unwrap();
        assert_eq!(c.uncompressed_size(&compressed), Some(payload.len()));
        let back = c.decompress_to_vec(&compressed, None).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_undersized_output_is_buffer_full() {
        let c = codec();
        let compressed = c.compress_to_vec(b"some payload bytes", None).unwrap();
        let mut tiny = vec![0u8; 4];
        assert!(matches!(
            c.decompress(&mut tiny, &compressed, None),
            Err(Error::BufferFull)
        ));
    }

    #[test]
    fn test_empty_payload() {
        let c = codec();
        let compressed = c.compress_to_vec(b"", None).unwrap();
        assert_eq!(c.uncompressed_size(&compressed), Some(0));
        let back = c.decompress_to_vec(&compressed, None).unwrap();
        assert!(back.is_empty());
    }
}
