//! DEFLATE and zlib back-ends over flate2's raw stream API
//!
//! Both codecs share one adapter; the only difference is whether the zlib
//! header and Adler-32 trailer wrap the deflate payload. The status mapping
//! is the delicate part: flate2 reports `Ok`, `BufError` and `StreamEnd`,
//! which combine with the current operation and cursor positions to decide
//! between progress, completion and a recoverable full buffer.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress};
use vise_core::{
    Backend, BackendStream, CodecDecl, OptionKind, OptionSchema, OptionSpec, Options,
};
use vise_types::{CodecInfo, Direction, Error, Operation, Ops, Progress, Result, Status};

const OPT_LEVEL: usize = 0;

const FLATE_OPTIONS: &[OptionSpec] = &[OptionSpec {
    name: "level",
    kind: OptionKind::Int {
        min: 1,
        max: 9,
        modulus: None,
        allow_zero: false,
        default: 6,
    },
}];

#[derive(Clone, Copy)]
enum Framing {
    Raw,
    Zlib,
}

pub(crate) struct FlateBackend {
    framing: Framing,
}

enum FlateState {
    Deflating(Compress),
    Inflating(Decompress),
}

struct FlateStream {
    direction: Direction,
    state: FlateState,
}

impl Backend for FlateBackend {
    fn ops(&self) -> Ops {
        Ops::STREAM
    }

    fn info(&self) -> CodecInfo {
        CodecInfo::CAN_FLUSH | CodecInfo::NATIVE_STREAMING
    }

    fn options_schema(&self) -> OptionSchema {
        OptionSchema::new(FLATE_OPTIONS)
    }

    fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
        // Worst case is stored blocks: five bytes of block overhead per
        // 16383-byte block, plus the zlib header and Adler-32 trailer.
        let blocks = uncompressed_len / 16_383 + 1;
        let framing = match self.framing {
            Framing::Raw => 0,
            Framing::Zlib => 6,
        };
        uncompressed_len
            .saturating_add(blocks.saturating_mul(5))
            .saturating_add(framing)
    }

    fn init_stream(
        &self,
        direction: Direction,
        options: &Options,
    ) -> Result<Box<dyn BackendStream>> {
        let zlib_header = matches!(self.framing, Framing::Zlib);
        let state = match direction {
            Direction::Compress => {
                let level = options.int_at(OPT_LEVEL)? as u32;
                FlateState::Deflating(Compress::new(Compression::new(level), zlib_header))
            }
            Direction::Decompress => FlateState::Inflating(Decompress::new(zlib_header)),
        };
        Ok(Box::new(FlateStream { direction, state }))
    }
}

impl BackendStream for FlateStream {
    fn process(&mut self, op: Operation, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        if op == Operation::Terminate {
            return Ok(Progress::done());
        }

        let (flate_status, read, written) = match &mut self.state {
            FlateState::Deflating(compress) => {
                let flush = match op {
                    Operation::Process => FlushCompress::None,
                    Operation::Flush => FlushCompress::Sync,
                    _ => FlushCompress::Finish,
                };
                let before_in = compress.total_in();
                let before_out = compress.total_out();
                let status = compress
                    .compress(input, output, flush)
                    .map_err(|e| Error::failed(format!("deflate: {e}")))?;
                (
                    status,
                    (compress.total_in() - before_in) as usize,
                    (compress.total_out() - before_out) as usize,
                )
            }
            FlateState::Inflating(decompress) => {
                let flush = match op {
                    Operation::Process => FlushDecompress::None,
                    Operation::Flush => FlushDecompress::Sync,
                    _ => FlushDecompress::Finish,
                };
                let before_in = decompress.total_in();
                let before_out = decompress.total_out();
                let status = decompress
                    .decompress(input, output, flush)
                    .map_err(|e| Error::failed(format!("inflate: {e}")))?;
                (
                    status,
                    (decompress.total_in() - before_in) as usize,
                    (decompress.total_out() - before_out) as usize,
                )
            }
        };

        let input_drained = read == input.len();
        let output_full = written == output.len();
        let status = match flate_status {
            flate2::Status::StreamEnd => match (self.direction, op) {
                (Direction::Decompress, Operation::Process) => Status::EndOfStream,
                _ => Status::Ok,
            },
            flate2::Status::Ok => match op {
                Operation::Process => {
                    if input_drained {
                        Status::Ok
                    } else {
                        Status::Processing
                    }
                }
                _ => Status::Processing,
            },
            flate2::Status::BufError => match op {
                Operation::Process => {
                    if input_drained {
                        Status::Ok
                    } else {
                        return Err(Error::BufferFull);
                    }
                }
                _ => {
                    if input_drained && !output_full {
                        Status::Ok
                    } else {
                        Status::Processing
                    }
                }
            },
        };
        Ok(Progress::new(status, read, written))
    }
}

pub(crate) fn declarations() -> Vec<CodecDecl> {
    vec![
        CodecDecl {
            name: "deflate",
            extension: None,
            priority: 50,
            backend: std::sync::Arc::new(FlateBackend {
                framing: Framing::Raw,
            }),
        },
        CodecDecl {
            name: "zlib",
            extension: None,
            priority: 50,
            backend: std::sync::Arc::new(FlateBackend {
                framing: Framing::Zlib,
            }),
        },
    ]
}
