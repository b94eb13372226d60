//! xz back-end over liblzma's stream API
//!
//! Uses the easy encoder at a preset level with a selectable integrity
//! check. Sync flush maps onto liblzma's `LZMA_SYNC_FLUSH`; note that
//! liblzma reports a completed flush as `StreamEnd`, which for a flush
//! means the boundary was reached, not that the stream is over.

use xz2::stream::{Action, Check, Status as XzStatus, Stream};
use vise_core::{
    Backend, BackendStream, CodecDecl, OptionKind, OptionSchema, OptionSpec, Options,
};
use vise_types::{CodecInfo, Direction, Error, Operation, Ops, Progress, Result, Status};

const OPT_LEVEL: usize = 0;
const OPT_EXTREME: usize = 1;
const OPT_CHECK: usize = 2;

// lzma_check constants; the decoder accepts whatever the frame declares.
const CHECK_NONE: i64 = 0;
const CHECK_CRC32: i64 = 1;
const CHECK_CRC64: i64 = 4;
const CHECK_SHA256: i64 = 10;

// LZMA_PRESET_EXTREME
const PRESET_EXTREME: u32 = 1 << 31;

const XZ_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "level",
        kind: OptionKind::Int {
            min: 0,
            max: 9,
            modulus: None,
            allow_zero: false,
            default: 6,
        },
    },
    OptionSpec {
        name: "extreme",
        kind: OptionKind::Bool { default: false },
    },
    OptionSpec {
        name: "check",
        kind: OptionKind::EnumString {
            values: &[
                ("none", CHECK_NONE),
                ("crc32", CHECK_CRC32),
                ("crc64", CHECK_CRC64),
                ("sha256", CHECK_SHA256),
            ],
            default: CHECK_CRC64,
        },
    },
];

pub(crate) struct XzBackend;

struct XzStream {
    direction: Direction,
    stream: Stream,
}

impl Backend for XzBackend {
    fn ops(&self) -> Ops {
        Ops::STREAM
    }

    fn info(&self) -> CodecInfo {
        CodecInfo::CAN_FLUSH | CodecInfo::NATIVE_STREAMING
    }

    fn options_schema(&self) -> OptionSchema {
        OptionSchema::new(XZ_OPTIONS)
    }

    fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
        // lzma_stream_buffer_bound's shape, rounded up generously.
        uncompressed_len
            .saturating_add(uncompressed_len / 3)
            .saturating_add(128)
    }

    fn init_stream(
        &self,
        direction: Direction,
        options: &Options,
    ) -> Result<Box<dyn BackendStream>> {
        let stream = match direction {
            Direction::Compress => {
                let mut preset = options.int_at(OPT_LEVEL)? as u32;
                if options.bool_at(OPT_EXTREME)? {
                    preset |= PRESET_EXTREME;
                }
                let check = match options.int_at(OPT_CHECK)? {
                    CHECK_NONE => Check::None,
                    CHECK_CRC32 => Check::Crc32,
                    CHECK_SHA256 => Check::Sha256,
                    _ => Check::Crc64,
                };
                Stream::new_easy_encoder(preset, check)
                    .map_err(|e| Error::failed(format!("xz: {e}")))?
            }
            Direction::Decompress => Stream::new_stream_decoder(u64::MAX, 0)
                .map_err(|e| Error::failed(format!("xz: {e}")))?,
        };
        Ok(Box::new(XzStream { direction, stream }))
    }
}

impl BackendStream for XzStream {
    fn process(&mut self, op: Operation, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        let action = match op {
            Operation::Process => Action::Run,
            Operation::Flush => Action::SyncFlush,
            Operation::Finish | Operation::Terminate => Action::Finish,
        };

        let before_in = self.stream.total_in();
        let before_out = self.stream.total_out();
        let xz_status = match self.stream.process(input, output, action) {
            Ok(status) => status,
            Err(e) => {
                return match e {
                    xz2::stream::Error::Mem | xz2::stream::Error::MemLimit => Err(Error::Memory),
                    other => Err(Error::failed(format!("xz: {other}"))),
                };
            }
        };
        let read = (self.stream.total_in() - before_in) as usize;
        let written = (self.stream.total_out() - before_out) as usize;

        let status = match xz_status {
            XzStatus::StreamEnd => match (self.direction, op) {
                (Direction::Decompress, Operation::Process) => Status::EndOfStream,
                // For a sync flush, StreamEnd means the flush boundary was
                // reached; the stream itself continues.
                _ => Status::Ok,
            },
            XzStatus::MemNeeded => return Err(Error::Memory),
            _ => match op {
                Operation::Process => {
                    if read == input.len() {
                        Status::Ok
                    } else {
                        Status::Processing
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
        name: "xz",
        extension: Some("xz"),
        priority: 50,
        backend: std::sync::Arc::new(XzBackend),
    }]
}
