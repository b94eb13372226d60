//! Legacy `.lzma` (LZMA-alone) back-end over liblzma
//!
//! The alone container predates xz: no integrity check, no sync flush,
//! just raw LZMA1 with a small header. Worth carrying because the encoder
//! takes the classic tunables (dictionary size, literal/position bits)
//! rather than a preset, which the xz adapter hides.

use xz2::stream::{Action, LzmaOptions, Status as XzStatus, Stream};
use vise_core::{
    Backend, BackendStream, CodecDecl, OptionKind, OptionSchema, OptionSpec, Options,
};
use vise_types::{CodecInfo, Direction, Error, Operation, Ops, Progress, Result, Status};

const OPT_LEVEL: usize = 0;
const OPT_DICT_SIZE: usize = 1;
const OPT_LC: usize = 2;
const OPT_LP: usize = 3;
const OPT_PB: usize = 4;

const LZMA_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "level",
        kind: OptionKind::Int {
            min: 1,
            max: 9,
            modulus: None,
            allow_zero: false,
            default: 6,
        },
    },
    // 0 keeps the dictionary size the preset chose.
    OptionSpec {
        name: "dict-size",
        kind: OptionKind::Size {
            min: 4096,
            max: 1_610_612_736,
            allow_zero: true,
            default: 0,
        },
    },
    OptionSpec {
        name: "lc",
        kind: OptionKind::Int {
            min: 0,
            max: 4,
            modulus: None,
            allow_zero: false,
            default: 3,
        },
    },
    OptionSpec {
        name: "lp",
        kind: OptionKind::Int {
            min: 0,
            max: 4,
            modulus: None,
            allow_zero: false,
            default: 0,
        },
    },
    OptionSpec {
        name: "pb",
        kind: OptionKind::Int {
            min: 0,
            max: 4,
            modulus: None,
            allow_zero: false,
            default: 2,
        },
    },
];

pub(crate) struct LzmaBackend;

struct LzmaStream {
    direction: Direction,
    stream: Stream,
}

impl Backend for LzmaBackend {
    fn ops(&self) -> Ops {
        Ops::STREAM
    }

    fn info(&self) -> CodecInfo {
        CodecInfo::NATIVE_STREAMING
    }

    fn options_schema(&self) -> OptionSchema {
        OptionSchema::new(LZMA_OPTIONS)
    }

    fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
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
                let preset = options.int_at(OPT_LEVEL)? as u32;
                let mut lzma = LzmaOptions::new_preset(preset)
                    .map_err(|e| Error::failed(format!("lzma: {e}")))?;
                let dict_size = options.size_at(OPT_DICT_SIZE)?;
                if dict_size != 0 {
                    let dict_size = u32::try_from(dict_size)
                        .map_err(|_| Error::range("lzma dictionary size exceeds 32 bits"))?;
                    lzma.dict_size(dict_size);
                }
                lzma.literal_context_bits(options.int_at(OPT_LC)? as u32);
                lzma.literal_position_bits(options.int_at(OPT_LP)? as u32);
                lzma.position_bits(options.int_at(OPT_PB)? as u32);
                Stream::new_lzma_encoder(&lzma).map_err(|e| Error::failed(format!("lzma: {e}")))?
            }
            Direction::Decompress => Stream::new_lzma_decoder(u64::MAX)
                .map_err(|e| Error::failed(format!("lzma: {e}")))?,
        };
        Ok(Box::new(LzmaStream { direction, stream }))
    }
}

impl BackendStream for LzmaStream {
    fn process(&mut self, op: Operation, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        let action = match op {
            Operation::Process => Action::Run,
            // The alone format has no flush boundary; unreachable behind the
            // capability gate.
            Operation::Flush => {
                return Err(Error::invalid_operation("lzma cannot flush"));
            }
            Operation::Finish | Operation::Terminate => Action::Finish,
        };

        let before_in = self.stream.total_in();
        let before_out = self.stream.total_out();
        let xz_status = match self.stream.process(input, output, action) {
            Ok(status) => status,
            Err(e) => {
                return match e {
                    xz2::stream::Error::Mem | xz2::stream::Error::MemLimit => Err(Error::Memory),
                    other => Err(Error::failed(format!("lzma: {other}"))),
                };
            }
        };
        let read = (self.stream.total_in() - before_in) as usize;
        let written = (self.stream.total_out() - before_out) as usize;

        let status = match xz_status {
            XzStatus::StreamEnd => match (self.direction, op) {
                (Direction::Decompress, Operation::Process) => Status::EndOfStream,
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
        name: "lzma",
        extension: Some("lzma"),
        priority: 50,
        backend: std::sync::Arc::new(LzmaBackend),
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
        registry.get("lzma").unwrap()
    }

    #[test]
    fn test_round_trip() {
        let c = codec();
        let payload = b"the alone container, end marker and all".repeat(25);
        let compressed = c.compress_to_vec(&payload, None).unwrap();
        assert!(compressed.len() < payload.len());
        let back = c.decompress_to_vec(&compressed, None).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_dict_size_option() {
        let c = codec();
        let opts = c
            .build_options(&[("level", "3"), ("dict-size", "65536")])
            .unwrap();
        let payload = b"constrained dictionary".repeat(50);
        let compressed = c.compress_to_vec(&payload, Some(&opts)).unwrap();
        let back = c.decompress_to_vec(&compressed, None).unwrap();
        assert_eq!(back, payload);

        assert!(c.build_options(&[("dict-size", "4095")]).is_err());
        assert!(c.build_options(&[("dict-size", "0")]).is_ok());
    }

    #[test]
    fn test_flush_is_rejected() {
        let c = codec();
        let mut stream = c.stream(Direction::Compress, None).unwrap();
        let mut out = vec![0u8; 64];
        assert!(matches!(
            stream.flush(&mut out),
            Err(Error::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_literal_bits_round_trip() {
        let c = codec();
        let opts = c
            .build_options(&[("lc", "0"), ("lp", "2"), ("pb", "0")])
            .unwrap();
        let payload = b"tuned literal coder".repeat(40);
        let compressed = c.compress_to_vec(&payload, Some(&opts)).unwrap();
        let back = c.decompress_to_vec(&compressed, None).unwrap();
        assert_eq!(back, payload);
    }
}
