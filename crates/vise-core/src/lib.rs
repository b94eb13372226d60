//! Codec-agnostic compression core for vise
//!
//! This crate provides the dispatch and streaming layer that unifies
//! byte-oriented compression back-ends behind one API:
//!
//! - **Codec registry**: back-end discovery, operation-vector binding and
//!   per-codec capability flags
//! - **Typed options**: schema-driven configuration parsed from string
//!   key/value pairs
//! - **Buffer API**: stateless one-shot compress/decompress over
//!   contiguous memory
//! - **Streams**: one incremental push/pull contract over native-streaming,
//!   one-shot-only and thread-bridged back-ends
//! - **Splice**: bounded-memory pumping from any reader to any writer
//!
//! Individual algorithms live behind the [`Backend`] trait; the built-in
//! adapters are collected in the `vise-codecs` crate.
//!
//! # Examples
//!
//! ```rust
//! use vise_core::{Backend, CodecDecl, Registry};
//! use vise_core::options::Options;
//! use std::sync::Arc;
//!
//! struct Identity;
//!
//! impl Backend for Identity {
//!     fn ops(&self) -> vise_core::Ops {
//!         vise_core::Ops::COMPRESS_BUFFER | vise_core::Ops::DECOMPRESS_BUFFER
//!     }
//!     fn max_compressed_size(&self, n: usize) -> usize {
//!         n
//!     }
//!     fn compress_buffer(
//!         &self,
//!         output: &mut [u8],
//!         input: &[u8],
//!         _options: &Options,
//!     ) -> vise_core::Result<usize> {
//!         if output.len() < input.len() {
//!             return Err(vise_core::Error::BufferFull);
//!         }
//!         output[..input.len()].copy_from_slice(input);
//!         Ok(input.len())
//!     }
//!     fn decompress_buffer(
//!         &self,
//!         output: &mut [u8],
//!         input: &[u8],
//!         options: &Options,
//!     ) -> vise_core::Result<usize> {
//!         self.compress_buffer(output, input, options)
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(CodecDecl {
//!         name: "identity",
//!         extension: None,
//!         priority: 50,
//!         backend: Arc::new(Identity),
//!     })
//!     .unwrap();
//!
//! let codec = registry.get("identity").unwrap();
//! let compressed = codec.compress_to_vec(b"hello", None).unwrap();
//! assert_eq!(compressed, b"hello");
//! ```

#![warn(clippy::all)]

pub mod buffer;
mod bridge;
mod buffer_stream;
pub mod codec;
pub mod options;
pub mod registry;
pub mod splice;
pub mod stream;

// Re-export the main types
pub use buffer::ByteBuffer;
pub use codec::{Backend, Codec, CodecDecl};
pub use options::{OptionKind, OptionSchema, OptionSpec, Options};
pub use registry::Registry;
pub use splice::splice;
pub use stream::{BackendStream, Stream};

// Re-export the shared type system alongside the machinery that uses it
pub use vise_types::{
    CodecInfo, Direction, Error, ErrorKind, Operation, Ops, Progress, Result, Status,
};
