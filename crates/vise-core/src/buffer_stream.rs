//! Stream facade for back-ends that only expose one-shot buffer operations
//!
//! Input is accumulated until finish; the actual transformation runs once,
//! either straight into the caller's output window when it is large enough
//! to hold the whole result, or into an internal buffer that is then
//! drained across repeated finish calls.

use vise_types::{Direction, Error, Operation, Progress, Result, Status};

use crate::buffer::ByteBuffer;
use crate::codec::Codec;
use crate::options::Options;

pub(crate) struct BufferStream {
    input: ByteBuffer,
    output: Option<ByteBuffer>,
    output_pos: usize,
}

impl BufferStream {
    pub(crate) fn new() -> Self {
        Self {
            input: ByteBuffer::new(),
            output: None,
            output_pos: 0,
        }
    }

    pub(crate) fn process(
        &mut self,
        codec: &Codec,
        direction: Direction,
        options: &Options,
        op: Operation,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<Progress> {
        match op {
            Operation::Process => {
                self.input.append(input)?;
                Ok(Progress::new(Status::Ok, input.len(), 0))
            }
            Operation::Finish => self.finish(codec, direction, options, output),
            Operation::Flush | Operation::Terminate => Err(Error::invalid_operation(format!(
                "{:?} on a buffer-backed stream",
                op
            ))),
        }
    }

    fn finish(
        &mut self,
        codec: &Codec,
        direction: Direction,
        options: &Options,
        output: &mut [u8],
    ) -> Result<Progress> {
        if self.output.is_none() {
            let gathered = self.input.as_slice();
            match direction {
                Direction::Compress => {
                    let bound = codec.max_compressed_size(gathered.len());
                    if output.len() >= bound {
                        // The caller's window holds the worst case; write
                        // straight into it.
                        let written = codec.compress(output, gathered, Some(options))?;
                        return Ok(Progress::new(Status::Ok, 0, written));
                    }
                    let mut buffered = ByteBuffer::with_size(bound)?;
                    let written = codec.compress(buffered.as_mut_slice(), gathered, Some(options))?;
                    buffered.set_len(written)?;
                    self.output = Some(buffered);
                }
                Direction::Decompress => {
                    if let Some(size) = codec.uncompressed_size(gathered) {
                        if output.len() >= size {
                            let written = codec.decompress(output, gathered, Some(options))?;
                            return Ok(Progress::new(Status::Ok, 0, written));
                        }
                        let mut buffered = ByteBuffer::with_size(size)?;
                        let written =
                            codec.decompress(buffered.as_mut_slice(), gathered, Some(options))?;
                        buffered.set_len(written)?;
                        self.output = Some(buffered);
                    } else {
                        // Unknown result size: first try the caller's window
                        // directly, which saves the allocation and copy when
                        // it happens to fit.
                        if !output.is_empty() {
                            match codec.decompress(output, gathered, Some(options)) {
                                Ok(written) => {
                                    return Ok(Progress::new(Status::Ok, 0, written));
                                }
                                Err(Error::BufferFull) => {}
                                Err(e) => return Err(e),
                            }
                        }
                        let decompressed = codec.decompress_to_vec(gathered, Some(options))?;
                        self.output = Some(ByteBuffer::from(decompressed));
                    }
                }
            }
        }

        // Drain the internal buffer into the caller's window.
        let buffered = match &self.output {
            Some(buffered) => buffered,
            None => return Err(Error::state("buffer-backed stream lost its output")),
        };
        let remaining = buffered.len() - self.output_pos;
        let step = remaining.min(output.len());
        if step != 0 {
            output[..step]
                .copy_from_slice(&buffered.as_slice()[self.output_pos..self.output_pos + step]);
            self.output_pos += step;
        }
        let status = if self.output_pos == buffered.len() {
            Status::Ok
        } else {
            Status::Processing
        };
        Ok(Progress::new(status, 0, step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Backend, CodecDecl};
    use crate::stream::Stream;
    use std::sync::Arc;
    use vise_types::Ops;

    // One-shot codec that prefixes a length header, with size knowledge.
    struct Framed;

    impl Backend for Framed {
        fn ops(&self) -> Ops {
            Ops::COMPRESS_BUFFER | Ops::DECOMPRESS_BUFFER | Ops::UNCOMPRESSED_SIZE
        }
        fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
            uncompressed_len + 4
        }
        fn uncompressed_size(&self, compressed: &[u8]) -> Option<usize> {
            let header: [u8; 4] = compressed.get(..4)?.try_into().ok()?;
            Some(u32::from_le_bytes(header) as usize)
        }
        fn compress_buffer(
            &self,
            output: &mut [u8],
            input: &[u8],
            _options: &Options,
        ) -> Result<usize> {
            if output.len() < input.len() + 4 {
                return Err(Error::BufferFull);
            }
            output[..4].copy_from_slice(&(input.len() as u32).to_le_bytes());
            output[4..4 + input.len()].copy_from_slice(input);
            Ok(input.len() + 4)
        }
        fn decompress_buffer(
            &self,
            output: &mut [u8],
            input: &[u8],
            _options: &Options,
        ) -> Result<usize> {
            let payload = &input[4..];
            if output.len() < payload.len() {
                return Err(Error::BufferFull);
            }
            output[..payload.len()].copy_from_slice(payload);
            Ok(payload.len())
        }
    }

    fn framed_codec() -> Codec {
        Codec::from_decl(CodecDecl {
            name: "framed",
            extension: None,
            priority: 50,
            backend: Arc::new(Framed),
        })
    }

    #[test]
    fn test_accumulate_then_finish_zero_copy() {
        let c = framed_codec();
        let mut stream = Stream::new(&c, Direction::Compress, None).unwrap();
        let mut out = vec![0u8; 64];

        // Accumulation always reports Ok immediately.
        let p = stream.process(b"hello ", &mut out).unwrap();
        assert_eq!(p.status, Status::Ok);
        assert_eq!(p.written, 0);
        stream.process(b"world", &mut out).unwrap();

        // The window fits the worst case, so finish completes in one call.
        let p = stream.finish(&mut out).unwrap();
        assert_eq!(p.status, Status::Ok);
        assert_eq!(p.written, 11 + 4);
        assert_eq!(&out[4..15], b"hello world");
    }

    #[test]
    fn test_finish_drains_across_calls() {
        let c = framed_codec();
        let mut stream = Stream::new(&c, Direction::Compress, None).unwrap();
        let payload = b"drained through a keyhole";
        let mut sink = vec![0u8; 64];
        stream.process(payload, &mut sink).unwrap();

        // A 3-byte window forces the internal buffer and repeated drains.
        let mut out = vec![0u8; 3];
        let mut compressed = Vec::new();
        loop {
            let p = stream.finish(&mut out).unwrap();
            compressed.extend_from_slice(&out[..p.written]);
            if p.status == Status::Ok {
                break;
            }
            assert_eq!(p.status, Status::Processing);
        }
        assert_eq!(compressed.len(), payload.len() + 4);
        assert_eq!(&compressed[4..], payload);
        assert_eq!(stream.total_out(), (payload.len() + 4) as u64);
    }

    #[test]
    fn test_decompress_with_known_size() {
        let c = framed_codec();
        let compressed = c.compress_to_vec(b"sized", None).unwrap();

        let mut stream = Stream::new(&c, Direction::Decompress, None).unwrap();
        let mut out = vec![0u8; 16];
        stream.process(&compressed, &mut out).unwrap();
        let p = stream.finish(&mut out).unwrap();
        assert_eq!(p.status, Status::Ok);
        assert_eq!(&out[..p.written], b"sized");
    }

    #[test]
    fn test_empty_input_finishes_cleanly() {
        let c = framed_codec();
        let mut stream = Stream::new(&c, Direction::Compress, None).unwrap();
        let mut out = vec![0u8; 16];
        let p = stream.finish(&mut out).unwrap();
        assert_eq!(p.status, Status::Ok);
        assert_eq!(p.written, 4);
    }
}
