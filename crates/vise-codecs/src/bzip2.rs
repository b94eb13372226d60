//! bzip2 back-end over the libbz2 stream wrappers
//!
//! Stream-only: libbz2 has no one-shot API worth wrapping. Compression
//! tracks the Run/Flush/Finish action model directly; decompression takes
//! no action and signals completion through `StreamEnd`.

use bzip2::{Action, Compress, Compression, Decompress};
use vise_core::{
    Backend, BackendStream, CodecDecl, OptionKind, OptionSchema, OptionSpec, Options,
};
use vise_types::{CodecInfo, Direction, Error, Operation, Ops, Progress, Result, Status};

const OPT_LEVEL: usize = 0;
const OPT_WORK_FACTOR: usize = 1;
const OPT_SMALL: usize = 2;

const BZIP2_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "level",
        kind: OptionKind::Int {
            min: 1,
            max: 9,
            modulus: None,
            allow_zero: false,
            default: 9,
        },
    },
    OptionSpec {
        name: "work-factor",
        kind: OptionKind::Int {
            min: 0,
            max: 250,
            modulus: None,
            allow_zero: false,
            default: 30,
        },
    },
    OptionSpec {
        name: "small",
        kind: OptionKind::Bool { default: false },
    },
];

pub(crate) struct Bzip2Backend;

enum Bzip2State {
    Compressing(Compress),
    Decompressing(Decompress),
}

struct Bzip2Stream {
    direction: Direction,
    state: Bzip2State,
}

impl Backend for Bzip2Backend {
    fn ops(&self) -> Ops {
        Ops::STREAM
    }

    fn info(&self) -> CodecInfo {
        CodecInfo::CAN_FLUSH | CodecInfo::NATIVE_STREAMING
    }

    fn options_schema(&self) -> OptionSchema {
        OptionSchema::new(BZIP2_OPTIONS)
    }

    fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
        // libbz2's documented worst case: one percent overhead plus 600
        // bytes of header.
        uncompressed_len
            .saturating_add(uncompressed_len / 100)
            .saturating_add(600)
    }

    fn init_stream(
        &self,
        direction: Direction,
        options: &Options,
    ) -> Result<Box<dyn BackendStream>> {
        let state = match direction {
            Direction::Compress => {
                let level = options.int_at(OPT_LEVEL)? as u32;
                let work_factor = options.int_at(OPT_WORK_FACTOR)? as u32;
                Bzip2State::Compressing(Compress::new(Compression::new(level), work_factor))
            }
            Direction::Decompress => {
                Bzip2State::Decompressing(Decompress::new(options.bool_at(OPT_SMALL)?))
            }
        };
        Ok(Box::new(Bzip2Stream { direction, state }))
    }
}

impl BackendStream for Bzip2Stream {
    fn process(&mut self, op: Operation, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        if op == Operation::Terminate {
            return Ok(Progress::done());
        }

        let (bz_status, read, written) = match &mut self.state {
            Bzip2State::Compressing(compress) => {
                let action = match op {
                    Operation::Process => Action::Run,
                    Operation::Flush => Action::Flush,
                    _ => Action::Finish,
                };
                let before_in = compress.total_in();
                let before_out = compress.total_out();
                let status = compress
                    .compress(input, output, action)
                    .map_err(|e| Error::failed(format!("bzip2: {e}")))?;
                (
                    status,
                    (compress.total_in() - before_in) as usize,
                    (compress.total_out() - before_out) as usize,
                )
            }
            Bzip2State::Decompressing(decompress) => {
                let before_in = decompress.total_in();
                let before_out = decompress.total_out();
                let status = decompress
                    .decompress(input, output)
                    .map_err(|e| Error::failed(format!("bzip2: {e}")))?;
                (
                    status,
                    (decompress.total_in() - before_in) as usize,
                    (decompress.total_out() - before_out) as usize,
                )
            }
        };

        let input_drained = read == input.len();
        let status = match bz_status {
            bzip2::Status::StreamEnd => match (self.direction, op) {
                (Direction::Decompress, Operation::Process) => Status::EndOfStream,
                _ => Status::Ok,
            },
            bzip2::Status::MemNeeded => return Err(Error::Memory),
            // RunOk / FlushOk / FinishOk / Ok: completion depends on the
            // operation, not the particular intermediate code.
            _ => match op {
                Operation::Process => {
                    if input_drained {
                        Status::Ok
                    } else {
                        Status::Processing
                    }
                }
                Operation::Flush => {
                    if matches!(bz_status, bzip2::Status::FlushOk) {
                        Status::Processing
                    } else {
                        Status::Ok
                    }
                }
                _ => Status::Processing,
            },
        };
        Ok(Progress::new(status, read, written))
    }
}

pub(crate) fn declarations() -> Vec<CodecDecl> {
    vec![CodecDecl {
        name: "bzip2",
        extension: Some("bz2"),
        priority: 50,
        backend: std::sync::Arc::new(Bzip2Backend),
    }]
}
