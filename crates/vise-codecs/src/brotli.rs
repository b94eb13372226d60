//! Brotli back-end driven through the thread bridge
//!
//! The only brotli API used here is the blocking reader-to-writer pair,
//! which runs to completion and cannot be suspended. Declaring the `run`
//! entry point hands the codec to the core's worker-thread bridge, which
//! turns the blocking loop into the ordinary incremental stream contract.

use std::io::{Read, Write};

use brotli::enc::BrotliEncoderParams;
use vise_core::{Backend, CodecDecl, OptionKind, OptionSchema, OptionSpec, Options};
use vise_types::{CodecInfo, Direction, Error, Ops, Result};

const OPT_QUALITY: usize = 0;
const OPT_WINDOW: usize = 1;

const BROTLI_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "quality",
        kind: OptionKind::Int {
            min: 0,
            max: 11,
            modulus: None,
            allow_zero: false,
            default: 6,
        },
    },
    OptionSpec {
        name: "window",
        kind: OptionKind::Int {
            min: 10,
            max: 24,
            modulus: None,
            allow_zero: false,
            default: 22,
        },
    },
];

pub(crate) struct BrotliBackend;

impl Backend for BrotliBackend {
    fn ops(&self) -> Ops {
        Ops::RUN
    }

    fn info(&self) -> CodecInfo {
        CodecInfo::RUN_IN_THREAD
    }

    fn options_schema(&self) -> OptionSchema {
        OptionSchema::new(BROTLI_OPTIONS)
    }

    fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
        // Incompressible input is stored in raw metablocks with a few bytes
        // of framing each; a quarter extra plus a constant covers it with
        // room to spare.
        uncompressed_len
            .saturating_add(uncompressed_len / 4)
            .saturating_add(1024)
    }

    fn run(
        &self,
        direction: Direction,
        reader: &mut dyn Read,
        writer: &mut dyn Write,
        options: &Options,
    ) -> Result<()> {
        match direction {
            Direction::Compress => {
                let params = BrotliEncoderParams {
                    quality: options.int_at(OPT_QUALITY)? as i32,
                    lgwin: options.int_at(OPT_WINDOW)? as i32,
                    ..Default::default()
                };
                brotli::BrotliCompress(&mut &mut *reader, &mut &mut *writer, &params)
                    .map_err(Error::from)?;
            }
            Direction::Decompress => {
                brotli::BrotliDecompress(&mut &mut *reader, &mut &mut *writer)
                    .map_err(Error::from)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn declarations() -> Vec<CodecDecl> {
    vec![CodecDecl {
        name: "brotli",
        extension: Some("br"),
        priority: 50,
        backend: std::sync::Arc::new(BrotliBackend),
    }]
}
