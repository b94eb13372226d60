//! The pass-through codec
//!
//! Useful as a baseline and for pipelines that want the vise API without
//! actual compression. It exercises every dispatch path: one-shot buffer
//! operations, a native stream and a native splice hook.

use std::io::{Read, Write};

use vise_core::{Backend, BackendStream, CodecDecl, Options};
use vise_types::{CodecInfo, Direction, Error, Operation, Ops, Progress, Result, Status};

pub(crate) struct CopyBackend;

struct CopyStream;

impl BackendStream for CopyStream {
    fn process(&mut self, _op: Operation, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        let status = if n < input.len() {
            Status::Processing
        } else {
            Status::Ok
        };
        Ok(Progress::new(status, n, n))
    }
}

impl Backend for CopyBackend {
    fn ops(&self) -> Ops {
        Ops::COMPRESS_BUFFER
            | Ops::DECOMPRESS_BUFFER
            | Ops::STREAM
            | Ops::SPLICE
            | Ops::UNCOMPRESSED_SIZE
    }

    fn info(&self) -> CodecInfo {
        CodecInfo::CAN_FLUSH | CodecInfo::KNOWS_UNCOMPRESSED_SIZE | CodecInfo::NATIVE_STREAMING
    }

    fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
        uncompressed_len
    }

    fn uncompressed_size(&self, compressed: &[u8]) -> Option<usize> {
        Some(compressed.len())
    }

    fn compress_buffer(&self, output: &mut [u8], input: &[u8], _options: &Options) -> Result<usize> {
        if output.len() < input.len() {
            return Err(Error::BufferFull);
        }
        output[..input.len()].copy_from_slice(input);
        Ok(input.len())
    }

    fn decompress_buffer(
        &self,
        output: &mut [u8],
        input: &[u8],
        options: &Options,
    ) -> Result<usize> {
        self.compress_buffer(output, input, options)
    }

    fn init_stream(
        &self,
        _direction: Direction,
        _options: &Options,
    ) -> Result<Box<dyn BackendStream>> {
        Ok(Box::new(CopyStream))
    }

    fn splice(
        &self,
        _direction: Direction,
        reader: &mut dyn Read,
        writer: &mut dyn Write,
        _size_hint: Option<u64>,
        _options: &Options,
    ) -> Result<u64> {
        Ok(std::io::copy(reader, writer)?)
    }
}

pub(crate) fn declarations() -> Vec<CodecDecl> {
    vec![CodecDecl {
        name: "copy",
        extension: None,
        priority: 10,
        backend: std::sync::Arc::new(CopyBackend),
    }]
}
