//! The incremental stream state machine
//!
//! Every codec, whatever its back-end shape, is exposed to callers through
//! the same push/pull contract: repeated [`process`](Stream::process) calls
//! feed input and drain output, [`flush`](Stream::flush) forces a
//! synchronisation boundary for codecs that support one, and
//! [`finish`](Stream::finish) signals end of input and drains the tail.
//!
//! The core owns the lifecycle (`Created → Running → Finishing → Finished`
//! or `Failed`) and normalizes back-end statuses to one rule: `process`
//! reports [`Status::Ok`] exactly when all supplied input was consumed.

use tracing::debug;
use vise_types::{CodecInfo, Direction, Error, Operation, Ops, Progress, Result, Status};

use crate::bridge::BridgeStream;
use crate::buffer_stream::BufferStream;
use crate::codec::Codec;
use crate::options::Options;

/// Native incremental stream state created by a back-end (shape A).
///
/// Implementations mutate only their private state; byte accounting is
/// reported through the returned [`Progress`] and totalled by the core.
pub trait BackendStream: Send {
    /// Advance the transformation by one bounded step.
    fn process(&mut self, op: Operation, input: &[u8], output: &mut [u8]) -> Result<Progress>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Running,
    Finishing,
    Finished,
    Failed,
}

enum Inner {
    Native(Box<dyn BackendStream>),
    Buffered(BufferStream),
    Bridged(BridgeStream),
}

/// A live transformation: single owner, single direction, mutable cursors.
///
/// The caller owns the I/O buffers passed to each call and advances its own
/// position by the returned [`Progress`] counts; the stream owns only the
/// codec's private state (and, for buffer-backed or bridged codecs, the
/// internal accumulator or worker thread).
pub struct Stream {
    codec: Codec,
    direction: Direction,
    options: Options,
    state: State,
    saw_end: bool,
    inner: Inner,
    total_in: u64,
    total_out: u64,
}

impl Stream {
    /// Create a stream for `codec` in the given direction.
    ///
    /// The back-end shape decides the adapter: native streams are used
    /// directly, blocking reader/writer back-ends get a worker-thread
    /// bridge, and one-shot-only back-ends get the accumulating stream.
    pub fn new(codec: &Codec, direction: Direction, options: Option<Options>) -> Result<Self> {
        let options = match options {
            Some(opts) => {
                opts.ensure_codec(codec.name())?;
                opts
            }
            None => codec.options(),
        };

        let ops = codec.ops();
        let inner = if ops.contains(Ops::STREAM) {
            Inner::Native(codec.backend().init_stream(direction, &options)?)
        } else if ops.contains(Ops::RUN) {
            Inner::Bridged(BridgeStream::new(codec.clone(), direction, options.clone()))
        } else if Self::has_buffer_ops(ops, direction) {
            Inner::Buffered(BufferStream::new())
        } else {
            return Err(Error::invalid_operation(format!(
                "codec '{}' cannot stream in direction {:?}",
                codec.name(),
                direction
            )));
        };

        let shape = match &inner {
            Inner::Native(_) => "native",
            Inner::Buffered(_) => "buffered",
            Inner::Bridged(_) => "bridged",
        };
        debug!(codec = codec.name(), ?direction, shape, "created stream");

        Ok(Self {
            codec: codec.clone(),
            direction,
            options,
            state: State::Created,
            saw_end: false,
            inner,
            total_in: 0,
            total_out: 0,
        })
    }

    fn has_buffer_ops(ops: Ops, direction: Direction) -> bool {
        match direction {
            Direction::Compress => {
                ops.intersects(Ops::COMPRESS_BUFFER | Ops::COMPRESS_BUFFER_UNCHECKED)
            }
            Direction::Decompress => ops.contains(Ops::DECOMPRESS_BUFFER),
        }
    }

    /// The codec this stream transforms through.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// The stream's direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Total bytes consumed across all calls. Monotonically non-decreasing.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total bytes emitted across all calls. Monotonically non-decreasing.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Consume input and emit output.
    pub fn process(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        self.execute(Operation::Process, input, output)
    }

    /// Emit buffered output up to a synchronisation boundary.
    ///
    /// Only valid for codecs advertising [`CodecInfo::CAN_FLUSH`].
    pub fn flush(&mut self, output: &mut [u8]) -> Result<Progress> {
        self.execute(Operation::Flush, &[], output)
    }

    /// Signal end of input and drain remaining output. Returns
    /// [`Status::Processing`] until the output side is fully drained.
    pub fn finish(&mut self, output: &mut [u8]) -> Result<Progress> {
        self.execute(Operation::Finish, &[], output)
    }

    fn execute(&mut self, op: Operation, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        match self.state {
            State::Failed => {
                return Err(Error::state("stream has failed"));
            }
            State::Finished => {
                // A decompressor that hit the end marker keeps reporting it;
                // finish completes idempotently. Anything else is misuse.
                if self.saw_end && op == Operation::Process {
                    return Ok(Progress::new(Status::EndOfStream, 0, 0));
                }
                if self.saw_end && op == Operation::Finish {
                    return Ok(Progress::done());
                }
                return Err(Error::state(format!("{:?} on a finished stream", op)));
            }
            State::Finishing if op != Operation::Finish => {
                return Err(Error::state(format!("{:?} after finish was requested", op)));
            }
            _ => {}
        }

        if op == Operation::Flush && !self.codec.info().contains(CodecInfo::CAN_FLUSH) {
            return Err(Error::invalid_operation(format!(
                "codec '{}' cannot flush",
                self.codec.name()
            )));
        }

        if self.state == State::Created {
            self.state = State::Running;
        }
        if op == Operation::Finish {
            self.state = State::Finishing;
        }

        let result = match &mut self.inner {
            Inner::Native(stream) => stream.process(op, input, output),
            Inner::Buffered(stream) => stream.process(
                &self.codec,
                self.direction,
                &self.options,
                op,
                input,
                output,
            ),
            Inner::Bridged(stream) => stream.process(op, input, output),
        };

        match result {
            Ok(mut progress) => {
                // One rule for every adapter: process is Ok only when the
                // caller's input was fully consumed.
                if op == Operation::Process
                    && progress.status == Status::Ok
                    && progress.read < input.len()
                {
                    progress.status = Status::Processing;
                }
                self.total_in += progress.read as u64;
                self.total_out += progress.written as u64;

                match progress.status {
                    Status::EndOfStream => {
                        self.saw_end = true;
                        self.state = State::Finished;
                    }
                    Status::Ok if op == Operation::Finish => {
                        self.state = State::Finished;
                    }
                    _ => {}
                }
                Ok(progress)
            }
            Err(e) => {
                if !e.is_recoverable() {
                    self.state = State::Failed;
                }
                Err(e)
            }
        }
    }
}
