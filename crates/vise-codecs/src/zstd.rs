//! Zstandard back-end
//!
//! The richest of the built-in adapters: checked one-shot buffer operations
//! over the bulk API plus a native incremental stream over the raw
//! encoder/decoder. Frames written by the one-shot path carry their content
//! size, so the uncompressed size is usually recoverable.

use zstd::stream::raw::{CParameter, Decoder, Encoder, Operation as ZstdOperation, OutBuffer};
use vise_core::{
    Backend, BackendStream, CodecDecl, OptionKind, OptionSchema, OptionSpec, Options,
};
use vise_types::{CodecInfo, Direction, Error, Operation, Ops, Progress, Result, Status};

const OPT_LEVEL: usize = 0;
const OPT_CHECKSUM: usize = 1;
const OPT_WINDOW_LOG: usize = 2;

const ZSTD_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "level",
        kind: OptionKind::Int {
            min: 1,
            max: 22,
            modulus: None,
            allow_zero: false,
            default: 3,
        },
    },
    OptionSpec {
        name: "checksum",
        kind: OptionKind::Bool { default: false },
    },
    // 0 leaves the window at the level's default.
    OptionSpec {
        name: "window-log",
        kind: OptionKind::Int {
            min: 10,
            max: 27,
            modulus: None,
            allow_zero: true,
            default: 0,
        },
    },
];

pub(crate) struct ZstdBackend;

enum ZstdState {
    Encoding(Encoder<'static>),
    Decoding {
        decoder: Decoder<'static>,
        frame_done: bool,
    },
}

struct ZstdStream {
    state: ZstdState,
}

impl Backend for ZstdBackend {
    fn ops(&self) -> Ops {
        Ops::COMPRESS_BUFFER | Ops::DECOMPRESS_BUFFER | Ops::STREAM | Ops::UNCOMPRESSED_SIZE
    }

    fn info(&self) -> CodecInfo {
        CodecInfo::CAN_FLUSH | CodecInfo::NATIVE_STREAMING | CodecInfo::KNOWS_UNCOMPRESSED_SIZE
    }

    fn options_schema(&self) -> OptionSchema {
        OptionSchema::new(ZSTD_OPTIONS)
    }

    fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
        zstd::zstd_safe::compress_bound(uncompressed_len)
    }

    fn uncompressed_size(&self, compressed: &[u8]) -> Option<usize> {
        // Streaming-produced frames may omit the content size; callers then
        // fall back to adaptive growth.
        match zstd::zstd_safe::get_frame_content_size(compressed) {
            Ok(Some(size)) => usize::try_from(size).ok(),
            _ => None,
        }
    }

    fn compress_buffer(&self, output: &mut [u8], input: &[u8], options: &Options) -> Result<usize> {
        let mut compressor = zstd::bulk::Compressor::new(options.int_at(OPT_LEVEL)? as i32)
            .map_err(|e| Error::failed(format!("zstd: {e}")))?;
        apply_compress_options(
            |p| compressor.set_parameter(p),
            options,
        )?;
        match compressor.compress_to_buffer(input, output) {
            Ok(written) => Ok(written),
            Err(_) if output.len() < self.max_compressed_size(input.len()) => {
                Err(Error::BufferFull)
            }
            Err(e) => Err(Error::failed(format!("zstd: {e}"))),
        }
    }

    fn decompress_buffer(
        &self,
        output: &mut [u8],
        input: &[u8],
        _options: &Options,
    ) -> Result<usize> {
        match zstd::bulk::decompress_to_buffer(input, output) {
            Ok(written) => Ok(written),
            Err(e) => {
                let message = e.to_string();
                let known_too_small = self
                    .uncompressed_size(input)
                    .is_some_and(|size| output.len() < size);
                if known_too_small || message.contains("too small") {
                    Err(Error::BufferFull)
                } else {
                    Err(Error::failed(format!("zstd: {message}")))
                }
            }
        }
    }

    fn init_stream(
        &self,
        direction: Direction,
        options: &Options,
    ) -> Result<Box<dyn BackendStream>> {
        let state = match direction {
            Direction::Compress => {
                let mut encoder = Encoder::new(options.int_at(OPT_LEVEL)? as i32)
                    .map_err(|e| Error::failed(format!("zstd: {e}")))?;
                apply_compress_options(|p| encoder.set_parameter(p), options)?;
                ZstdState::Encoding(encoder)
            }
            Direction::Decompress => ZstdState::Decoding {
                decoder: Decoder::new().map_err(|e| Error::failed(format!("zstd: {e}")))?,
                frame_done: false,
            },
        };
        Ok(Box::new(ZstdStream { state }))
    }
}

fn apply_compress_options(
    mut set: impl FnMut(CParameter) -> std::io::Result<()>,
    options: &Options,
) -> Result<()> {
    if options.bool_at(OPT_CHECKSUM)? {
        set(CParameter::ChecksumFlag(true)).map_err(|e| Error::failed(format!("zstd: {e}")))?;
    }
    let window_log = options.int_at(OPT_WINDOW_LOG)?;
    if window_log != 0 {
        set(CParameter::WindowLog(window_log as u32))
            .map_err(|e| Error::failed(format!("zstd: {e}")))?;
    }
    Ok(())
}

impl BackendStream for ZstdStream {
    fn process(&mut self, op: Operation, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        match &mut self.state {
            ZstdState::Encoding(encoder) => match op {
                Operation::Process => {
                    let status = encoder
                        .run_on_buffers(input, output)
                        .map_err(|e| Error::failed(format!("zstd: {e}")))?;
                    let st = if status.bytes_read == input.len() {
                        Status::Ok
                    } else {
                        Status::Processing
                    };
                    Ok(Progress::new(st, status.bytes_read, status.bytes_written))
                }
                Operation::Flush => {
                    let mut out = OutBuffer::around(output);
                    let remaining = encoder
                        .flush(&mut out)
                        .map_err(|e| Error::failed(format!("zstd: {e}")))?;
                    let st = if remaining == 0 {
                        Status::Ok
                    } else {
                        Status::Processing
                    };
                    Ok(Progress::new(st, 0, out.pos()))
                }
                Operation::Finish | Operation::Terminate => {
                    let mut out = OutBuffer::around(output);
                    let remaining = encoder
                        .finish(&mut out, true)
                        .map_err(|e| Error::failed(format!("zstd: {e}")))?;
                    let st = if remaining == 0 {
                        Status::Ok
                    } else {
                        Status::Processing
                    };
                    Ok(Progress::new(st, 0, out.pos()))
                }
            },
            ZstdState::Decoding {
                decoder,
                frame_done,
            } => match op {
                Operation::Process | Operation::Flush => {
                    let status = decoder
                        .run_on_buffers(input, output)
                        .map_err(|e| Error::failed(format!("zstd: {e}")))?;
                    if status.remaining == 0 {
                        *frame_done = true;
                    }
                    let st = if *frame_done {
                        Status::EndOfStream
                    } else if status.bytes_read == input.len() {
                        Status::Ok
                    } else {
                        Status::Processing
                    };
                    Ok(Progress::new(st, status.bytes_read, status.bytes_written))
                }
                Operation::Finish | Operation::Terminate => {
                    let mut out = OutBuffer::around(output);
                    decoder
                        .finish(&mut out, *frame_done)
                        .map_err(|e| Error::failed(format!("zstd: {e}")))?;
                    Ok(Progress::new(Status::Ok, 0, out.pos()))
                }
            },
        }
    }
}

pub(crate) fn declarations() -> Vec<CodecDecl> {
    vec![CodecDecl {
        name: "zstd",
        extension: Some("zst"),
        priority: 50,
        backend: std::sync::Arc::new(ZstdBackend),
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
        registry.get("zstd").unwrap()
    }

    #[test]
    fn test_bulk_round_trip_with_content_size() {
        let c = codec();
        let payload = b"zstandard round trip with frame content size".repeat(30);
        let compressed = c.compress_to_vec(&payload, None).unwrap();
        assert!(compressed.len() < payload.len());
        assert_eq!(c.uncompressed_size(&compressed), Some(payload.len()));
        let back = c.decompress_to_vec(&compressed, None).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_stream_compress_bulk_decompress() {
        let c = codec();
        let payload = b"stream compressed, bulk decompressed".repeat(50);
        let mut stream = c.stream(Direction::Compress, None).unwrap();
        let mut out = vec![0u8; 256];
        let mut compressed = Vec::new();

        let mut pos = 0;
        while pos < payload.len() {
            let end = (pos + 777).min(payload.len());
            let mut slice = &payload[pos..end];
            loop {
                let p = stream.process(slice, &mut out).unwrap();
                compressed.extend_from_slice(&out[..p.written]);
                slice = &slice[p.read..];
                if slice.is_empty() && p.status == Status::Ok {
                    break;
                }
            }
            pos = end;
        }
        loop {
            let p = stream.finish(&mut out).unwrap();
            compressed.extend_from_slice(&out[..p.written]);
            if p.status != Status::Processing {
                break;
            }
        }

        // Streaming frames omit the content size, so sizing falls back to
        // adaptive growth.
        let back = c.decompress_to_vec(&compressed, None).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_stream_decompress_reports_end() {
        let c = codec();
        let compressed = c.compress_to_vec(b"ends in band", None).unwrap();
        let mut stream = c.stream(Direction::Decompress, None).unwrap();
        let mut out = vec![0u8; 64];
        let p = stream.process(&compressed, &mut out).unwrap();
        assert_eq!(p.status, Status::EndOfStream);
        assert_eq!(&out[..p.written], b"ends in band");
    }

    #[test]
    fn test_checksum_option_round_trips() {
        let c = codec();
        let opts = c
            .build_options(&[("level", "5"), ("checksum", "true")])
            .unwrap();
        let payload = b"with xxhash checksum appended".repeat(10);
        let compressed = c.compress_to_vec(&payload, Some(&opts)).unwrap();
        let back = c.decompress_to_vec(&compressed, None).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_level_bounds() {
        let c = codec();
        assert!(c.build_options(&[("level", "22")]).is_ok());
        assert!(c.build_options(&[("level", "23")]).is_err());
        assert!(c.build_options(&[("window-log", "0")]).is_ok());
        assert!(c.build_options(&[("window-log", "9")]).is_err());
    }

    #[test]
    fn test_buffer_full_on_small_output() {
        let c = codec();
        let payload = b"does not fit in four bytes".repeat(4);
        let mut out = vec![0u8; 4];
        assert!(matches!(
            c.compress(&mut out, &payload, None),
            Err(Error::BufferFull)
        ));
    }
}
