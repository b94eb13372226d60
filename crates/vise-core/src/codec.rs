//! Codec handles, the back-end contract, and the one-shot buffer API
//!
//! A [`Codec`] is a cheap handle over a registered back-end plus its
//! metadata. The buffer API here is stateless: each call selects the
//! smallest adapter the back-end's declared operation vector allows, from
//! direct one-shot calls down to a transient stream or an in-memory splice.

use std::io::{Read, Write};
use std::sync::Arc;

use tracing::debug;
use vise_types::{CodecInfo, Direction, Error, Ops, Result, Status};

use crate::buffer::ByteBuffer;
use crate::options::{OptionSchema, Options};
use crate::stream::{BackendStream, Stream};

/// Ceiling for the adaptive output-growth strategy used when a codec cannot
/// report the uncompressed size. Exceeding it surrenders with
/// [`Error::Range`].
pub(crate) const ADAPTIVE_GROWTH_CAP: usize = 256 * 1024 * 1024;

/// The contract a compression back-end implements.
///
/// A back-end declares the subset of operations it supports through
/// [`ops`](Backend::ops) and implements exactly that subset; the default
/// method bodies report [`Error::InvalidOperation`] so undeclared entries
/// are never reachable through the dispatch layer.
pub trait Backend: Send + Sync {
    /// The operation vector this back-end provides.
    fn ops(&self) -> Ops;

    /// Capability flags advertised to callers.
    fn info(&self) -> CodecInfo {
        CodecInfo::empty()
    }

    /// The options this back-end understands.
    fn options_schema(&self) -> OptionSchema {
        OptionSchema::default()
    }

    /// Upper bound on the compressed size of `uncompressed_len` input bytes.
    ///
    /// Must be a true upper bound; the scratch-buffer compress path and the
    /// buffer-backed stream both size storage from it.
    fn max_compressed_size(&self, uncompressed_len: usize) -> usize;

    /// Recover the uncompressed size from compressed data, when the format
    /// carries it.
    fn uncompressed_size(&self, _compressed: &[u8]) -> Option<usize> {
        None
    }

    /// One-shot compress tolerating undersized output ([`Error::BufferFull`]
    /// when the result does not fit).
    fn compress_buffer(&self, _output: &mut [u8], _input: &[u8], _options: &Options) -> Result<usize> {
        Err(Error::invalid_operation("compress_buffer"))
    }

    /// One-shot compress requiring `output.len() >=`
    /// [`max_compressed_size`](Backend::max_compressed_size); the dispatch
    /// layer guarantees the bound, routing through a scratch buffer if the
    /// caller's buffer is smaller.
    fn compress_buffer_unchecked(
        &self,
        _output: &mut [u8],
        _input: &[u8],
        _options: &Options,
    ) -> Result<usize> {
        Err(Error::invalid_operation("compress_buffer_unchecked"))
    }

    /// One-shot decompress ([`Error::BufferFull`] when the result does not
    /// fit the supplied output).
    fn decompress_buffer(
        &self,
        _output: &mut [u8],
        _input: &[u8],
        _options: &Options,
    ) -> Result<usize> {
        Err(Error::invalid_operation("decompress_buffer"))
    }

    /// Create native incremental stream state (back-end shape A).
    fn init_stream(
        &self,
        _direction: Direction,
        _options: &Options,
    ) -> Result<Box<dyn BackendStream>> {
        Err(Error::invalid_operation("init_stream"))
    }

    /// Run the back-end's blocking reader/writer loop to completion
    /// (back-end shape C). Only ever invoked on the thread bridge's worker
    /// thread; the supplied reader and writer suspend the loop at buffer
    /// edges.
    fn run(
        &self,
        _direction: Direction,
        _reader: &mut dyn Read,
        _writer: &mut dyn Write,
        _options: &Options,
    ) -> Result<()> {
        Err(Error::invalid_operation("run"))
    }

    /// Native source-to-sink splice through the codec's own scheduler.
    /// Returns the number of bytes written to `writer`.
    fn splice(
        &self,
        _direction: Direction,
        _reader: &mut dyn Read,
        _writer: &mut dyn Write,
        _size_hint: Option<u64>,
        _options: &Options,
    ) -> Result<u64> {
        Err(Error::invalid_operation("splice"))
    }
}

/// A codec registration: metadata plus the back-end that serves it.
pub struct CodecDecl {
    /// Codec name, matched case-sensitively on lookup
    pub name: &'static str,
    /// File extension associated with the codec's output, if any
    pub extension: Option<&'static str>,
    /// Tie-break when several codecs claim the same extension
    pub priority: u32,
    /// The back-end implementation
    pub backend: Arc<dyn Backend>,
}

struct CodecInner {
    name: &'static str,
    extension: Option<&'static str>,
    priority: u32,
    info: CodecInfo,
    schema: OptionSchema,
    backend: Arc<dyn Backend>,
}

/// Handle to a registered codec. Cloning is cheap.
#[derive(Clone)]
pub struct Codec {
    inner: Arc<CodecInner>,
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("name", &self.inner.name)
            .field("info", &self.inner.info)
            .finish()
    }
}

impl Codec {
    pub(crate) fn from_decl(decl: CodecDecl) -> Self {
        let info = decl.backend.info();
        let schema = decl.backend.options_schema();
        Self {
            inner: Arc::new(CodecInner {
                name: decl.name,
                extension: decl.extension,
                priority: decl.priority,
                info,
                schema,
                backend: decl.backend,
            }),
        }
    }

    /// Codec name.
    pub fn name(&self) -> &str {
        self.inner.name
    }

    /// Associated file extension, if any.
    pub fn extension(&self) -> Option<&str> {
        self.inner.extension
    }

    /// Extension tie-break priority.
    pub fn priority(&self) -> u32 {
        self.inner.priority
    }

    /// Capability flags.
    pub fn info(&self) -> CodecInfo {
        self.inner.info
    }

    /// The codec's option schema.
    pub fn schema(&self) -> OptionSchema {
        self.inner.schema
    }

    /// The back-end's declared operation vector.
    pub fn ops(&self) -> Ops {
        self.inner.backend.ops()
    }

    pub(crate) fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner.backend
    }

    /// An options bag with every entry at its schema default.
    pub fn options(&self) -> Options {
        Options::new(self.inner.name, self.inner.schema)
    }

    /// Build an options bag from `(key, value)` pairs.
    pub fn build_options(&self, pairs: &[(&str, &str)]) -> Result<Options> {
        Options::from_pairs(self.inner.name, self.inner.schema, pairs)
    }

    /// Upper bound on compressed size for `uncompressed_len` input bytes.
    pub fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
        self.inner.backend.max_compressed_size(uncompressed_len)
    }

    /// Uncompressed size recovered from `compressed`, when the codec's
    /// format carries it.
    pub fn uncompressed_size(&self, compressed: &[u8]) -> Option<usize> {
        self.inner.backend.uncompressed_size(compressed)
    }

    /// Create an incremental stream for this codec.
    pub fn stream(&self, direction: Direction, options: Option<Options>) -> Result<Stream> {
        Stream::new(self, direction, options)
    }

    /// One-shot compress of `input` into `output`, returning the number of
    /// bytes written.
    pub fn compress(
        &self,
        output: &mut [u8],
        input: &[u8],
        options: Option<&Options>,
    ) -> Result<usize> {
        let mut storage = None;
        let opts = self.resolve_options(options, &mut storage)?;
        let ops = self.ops();

        if ops.contains(Ops::COMPRESS_BUFFER) {
            return self.inner.backend.compress_buffer(output, input, opts);
        }
        if ops.contains(Ops::COMPRESS_BUFFER_UNCHECKED) {
            let bound = self.max_compressed_size(input.len());
            if output.len() >= bound {
                return self
                    .inner
                    .backend
                    .compress_buffer_unchecked(output, input, opts);
            }
            debug!(
                codec = self.name(),
                bound, "compressing through worst-case scratch buffer"
            );
            let mut scratch = ByteBuffer::with_size(bound)?;
            let written = self
                .inner
                .backend
                .compress_buffer_unchecked(scratch.as_mut_slice(), input, opts)?;
            if written > output.len() {
                return Err(Error::BufferFull);
            }
            output[..written].copy_from_slice(&scratch.as_slice()[..written]);
            return Ok(written);
        }
        if ops.intersects(Ops::STREAM | Ops::RUN) {
            return self.transform_with_stream(Direction::Compress, output, input, opts);
        }
        if ops.contains(Ops::SPLICE) {
            return self.transform_with_splice(Direction::Compress, output, input, opts);
        }
        Err(Error::invalid_operation(format!(
            "codec '{}' has no compression entry point",
            self.name()
        )))
    }

    /// One-shot decompress of `input` into `output`, returning the number
    /// of bytes written.
    pub fn decompress(
        &self,
        output: &mut [u8],
        input: &[u8],
        options: Option<&Options>,
    ) -> Result<usize> {
        let mut storage = None;
        let opts = self.resolve_options(options, &mut storage)?;
        let ops = self.ops();

        if ops.contains(Ops::DECOMPRESS_BUFFER) {
            return self.inner.backend.decompress_buffer(output, input, opts);
        }
        if ops.intersects(Ops::STREAM | Ops::RUN) {
            return self.transform_with_stream(Direction::Decompress, output, input, opts);
        }
        if ops.contains(Ops::SPLICE) {
            return self.transform_with_splice(Direction::Decompress, output, input, opts);
        }
        Err(Error::invalid_operation(format!(
            "codec '{}' has no decompression entry point",
            self.name()
        )))
    }

    /// Compress `input` into a freshly allocated vector.
    pub fn compress_to_vec(&self, input: &[u8], options: Option<&Options>) -> Result<Vec<u8>> {
        let bound = self.max_compressed_size(input.len());
        let mut buf = ByteBuffer::with_size(bound)?;
        let written = self.compress(buf.as_mut_slice(), input, options)?;
        buf.set_len(written)?;
        Ok(buf.steal())
    }

    /// Decompress `input` into a freshly allocated vector, sizing it from
    /// the codec's knowledge of the uncompressed size or by adaptive
    /// growth.
    pub fn decompress_to_vec(&self, input: &[u8], options: Option<&Options>) -> Result<Vec<u8>> {
        if let Some(size) = self.uncompressed_size(input) {
            let mut buf = ByteBuffer::with_size(size)?;
            let written = self.decompress(buf.as_mut_slice(), input, options)?;
            buf.set_len(written)?;
            return Ok(buf.steal());
        }

        let mut size = adaptive_start(input.len());
        loop {
            let mut buf = ByteBuffer::with_size(size)?;
            match self.decompress(buf.as_mut_slice(), input, options) {
                Ok(written) => {
                    buf.set_len(written)?;
                    return Ok(buf.steal());
                }
                Err(Error::BufferFull) => {
                    size = size.saturating_mul(2);
                    if size > ADAPTIVE_GROWTH_CAP {
                        return Err(Error::range(format!(
                            "decompressed size exceeds the {} byte safety cap",
                            ADAPTIVE_GROWTH_CAP
                        )));
                    }
                    debug!(codec = self.name(), size, "growing decompress buffer");
                }
                Err(other) => return Err(other),
            }
        }
    }

    pub(crate) fn resolve_options<'a>(
        &self,
        options: Option<&'a Options>,
        storage: &'a mut Option<Options>,
    ) -> Result<&'a Options> {
        match options {
            Some(opts) => {
                opts.ensure_codec(self.name())?;
                Ok(opts)
            }
            None => Ok(storage.insert(self.options())),
        }
    }

    /// Run a full buffer-to-buffer transformation through a transient
    /// stream (covers back-end shapes A and C).
    fn transform_with_stream(
        &self,
        direction: Direction,
        output: &mut [u8],
        input: &[u8],
        opts: &Options,
    ) -> Result<usize> {
        let mut stream = Stream::new(self, direction, Some(opts.clone()))?;
        let mut in_pos = 0;
        let mut out_pos = 0;

        loop {
            let p = stream.process(&input[in_pos..], &mut output[out_pos..])?;
            in_pos += p.read;
            out_pos += p.written;
            match p.status {
                Status::Ok if in_pos == input.len() => break,
                Status::EndOfStream => break,
                _ => {
                    if p.read == 0 && p.written == 0 {
                        if out_pos == output.len() {
                            return Err(Error::BufferFull);
                        }
                        return Err(Error::failed("stream made no progress"));
                    }
                }
            }
        }

        loop {
            let p = stream.finish(&mut output[out_pos..])?;
            out_pos += p.written;
            match p.status {
                Status::Processing => {
                    if p.written == 0 {
                        if out_pos == output.len() {
                            return Err(Error::BufferFull);
                        }
                        return Err(Error::failed("stream stalled while finishing"));
                    }
                }
                _ => break,
            }
        }
        Ok(out_pos)
    }

    /// Run a buffer-to-buffer transformation through the back-end's native
    /// splice hook over in-memory endpoints.
    fn transform_with_splice(
        &self,
        direction: Direction,
        output: &mut [u8],
        input: &[u8],
        opts: &Options,
    ) -> Result<usize> {
        let mut reader: &[u8] = input;
        let mut remaining: &mut [u8] = output;
        let before = remaining.len();
        let result = self.inner.backend.splice(
            direction,
            &mut reader,
            &mut remaining,
            Some(input.len() as u64),
            opts,
        );
        match result {
            Ok(_) => Ok(before - remaining.len()),
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::WriteZero => {
                Err(Error::BufferFull)
            }
            Err(e) => Err(e),
        }
    }
}

fn adaptive_start(input_len: usize) -> usize {
    let pot = input_len.next_power_of_two();
    input_len.saturating_mul(8).max(pot).max(64)
}
