//! Worker-thread bridge for blocking reader/writer back-ends
//!
//! Some libraries expose nothing but a blocking `(Reader, Writer)` call
//! that runs to completion and cannot be yielded from. The bridge lets
//! them participate in the incremental stream contract without buffering
//! the whole payload: the back-end runs on a dedicated worker thread whose
//! reader and writer endpoints suspend it whenever a buffer edge is
//! reached, handing control back to the caller.
//!
//! The handshake is a strict request/reply rendezvous over two bounded
//! channels of depth one. The caller posts `{operation, input chunk,
//! output budget}` and blocks for the reply; the worker consumes and
//! produces until it needs more input (yielding `Ok`) or runs out of
//! output budget (yielding `Processing`), then blocks for the next
//! request. Each request observes all output its input chunk produced
//! before the reply returns, so the pairs are totally ordered. The caller
//! blocks only on the reply channel and the worker only on the request
//! channel; since every send targets an empty depth-one slot, neither side
//! can wait on a full channel and the handoff is deadlock free.

use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;
use vise_types::{Direction, Error, Operation, Progress, Result, Status};

use crate::codec::Codec;
use crate::options::Options;

enum Request {
    Drive {
        op: Operation,
        input: Vec<u8>,
        out_budget: usize,
    },
    Terminate,
}

struct Reply {
    result: Result<Status>,
    output: Vec<u8>,
    read: usize,
    done: bool,
}

pub(crate) struct BridgeStream {
    codec: Codec,
    direction: Direction,
    options: Options,
    request_tx: Option<Sender<Request>>,
    reply_rx: Option<Receiver<Reply>>,
    worker: Option<JoinHandle<()>>,
    done: bool,
}

impl BridgeStream {
    pub(crate) fn new(codec: Codec, direction: Direction, options: Options) -> Self {
        Self {
            codec,
            direction,
            options,
            request_tx: None,
            reply_rx: None,
            worker: None,
            done: false,
        }
    }

    pub(crate) fn process(
        &mut self,
        op: Operation,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<Progress> {
        if self.done {
            // The back-end already ran to completion; only a drained
            // finish remains meaningful.
            return match op {
                Operation::Finish => Ok(Progress::done()),
                _ => Err(Error::state("bridge worker has completed")),
            };
        }

        self.spawn_if_needed();
        let request_tx = match &self.request_tx {
            Some(tx) => tx,
            None => return Err(Error::failed("bridge worker unavailable")),
        };
        let reply_rx = match &self.reply_rx {
            Some(rx) => rx,
            None => return Err(Error::failed("bridge worker unavailable")),
        };

        request_tx
            .send(Request::Drive {
                op,
                input: input.to_vec(),
                out_budget: output.len(),
            })
            .map_err(|_| Error::failed("bridge worker exited unexpectedly"))?;

        let reply = reply_rx
            .recv()
            .map_err(|_| Error::failed("bridge worker exited without replying"))?;

        if reply.done {
            self.done = true;
            self.join_worker();
        }

        let written = reply.output.len();
        if written > output.len() {
            return Err(Error::failed("bridge worker overran its output budget"));
        }
        output[..written].copy_from_slice(&reply.output);

        let mut status = reply.result?;
        if reply.done {
            // Completion during Process means the codec hit its in-band end
            // marker; completion during Finish is a normal drain.
            status = match op {
                Operation::Process => Status::EndOfStream,
                _ => Status::Ok,
            };
        }
        Ok(Progress::new(status, reply.read, written))
    }

    fn spawn_if_needed(&mut self) {
        if self.worker.is_some() || self.done {
            return;
        }
        let (request_tx, request_rx) = bounded::<Request>(1);
        let (reply_tx, reply_rx) = bounded::<Reply>(1);
        let backend = self.codec.backend().clone();
        let direction = self.direction;
        let options = self.options.clone();

        debug!(codec = self.codec.name(), "spawning bridge worker");
        let handle = std::thread::spawn(move || {
            worker_main(&*backend, direction, &options, &request_rx, &reply_tx);
        });

        self.request_tx = Some(request_tx);
        self.reply_rx = Some(reply_rx);
        self.worker = Some(handle);
    }

    fn join_worker(&mut self) {
        self.request_tx = None;
        if let Some(rx) = self.reply_rx.take() {
            while rx.recv().is_ok() {}
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for BridgeStream {
    fn drop(&mut self) {
        if let Some(tx) = self.request_tx.take() {
            // Wake a worker parked on the request channel; if it is still
            // mid-computation it observes the terminate at its next yield.
            let _ = tx.send(Request::Terminate);
        }
        if let Some(rx) = self.reply_rx.take() {
            while rx.recv().is_ok() {}
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

fn worker_main(
    backend: &dyn crate::codec::Backend,
    direction: Direction,
    options: &Options,
    request_rx: &Receiver<Request>,
    reply_tx: &Sender<Reply>,
) {
    let first = match request_rx.recv() {
        Ok(Request::Drive {
            op,
            input,
            out_budget,
        }) => (op, input, out_budget),
        Ok(Request::Terminate) | Err(_) => return,
    };

    let io = Rc::new(RefCell::new(WorkerIo {
        request_rx,
        reply_tx,
        op: first.0,
        input: first.1,
        pos: 0,
        out: Vec::new(),
        out_budget: first.2,
        terminated: false,
    }));

    let mut reader = BridgeReader { io: Rc::clone(&io) };
    let mut writer = BridgeWriter { io: Rc::clone(&io) };
    let result = backend.run(direction, &mut reader, &mut writer, options);

    let mut io = io.borrow_mut();
    if io.terminated {
        return;
    }
    let reply = Reply {
        result: result.map(|_| Status::Ok),
        output: std::mem::take(&mut io.out),
        read: io.pos,
        done: true,
    };
    let _ = io.reply_tx.send(reply);
}

struct WorkerIo<'a> {
    request_rx: &'a Receiver<Request>,
    reply_tx: &'a Sender<Reply>,
    op: Operation,
    input: Vec<u8>,
    pos: usize,
    out: Vec<u8>,
    out_budget: usize,
    terminated: bool,
}

impl WorkerIo<'_> {
    /// Hand the cursors back to the caller and wait for the next request.
    fn yield_with(&mut self, status: Status) -> io::Result<()> {
        let reply = Reply {
            result: Ok(status),
            output: std::mem::take(&mut self.out),
            read: self.pos,
            done: false,
        };
        if self.reply_tx.send(reply).is_err() {
            self.terminated = true;
            return Err(terminated());
        }
        match self.request_rx.recv() {
            Ok(Request::Drive {
                op,
                input,
                out_budget,
            }) => {
                self.op = op;
                self.input = input;
                self.pos = 0;
                self.out = Vec::new();
                self.out_budget = out_budget;
                Ok(())
            }
            Ok(Request::Terminate) | Err(_) => {
                self.terminated = true;
                Err(terminated())
            }
        }
    }
}

fn terminated() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "stream terminated")
}

struct BridgeReader<'a> {
    io: Rc<RefCell<WorkerIo<'a>>>,
}

impl Read for BridgeReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut io = self.io.borrow_mut();
        while io.pos == io.input.len() && io.op == Operation::Process {
            // Input exhausted mid-stream: ask the caller for more.
            io.yield_with(Status::Ok)?;
        }
        if io.pos == io.input.len() {
            return Ok(0);
        }
        let n = (io.input.len() - io.pos).min(buf.len());
        buf[..n].copy_from_slice(&io.input[io.pos..io.pos + n]);
        io.pos += n;
        Ok(n)
    }
}

struct BridgeWriter<'a> {
    io: Rc<RefCell<WorkerIo<'a>>>,
}

impl Write for BridgeWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut io = self.io.borrow_mut();
        loop {
            let room = io.out_budget - io.out.len();
            if room == 0 {
                // Output window full: hand what we have to the caller.
                io.yield_with(Status::Processing)?;
                continue;
            }
            let n = room.min(buf.len());
            io.out.extend_from_slice(&buf[..n]);
            return Ok(n);
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
