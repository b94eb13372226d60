//! Built-in compression back-ends for vise
//!
//! Each module adapts one library to the [`vise_core::Backend`] contract,
//! the way a plugin binds its operation vector in the original design.
//! Three back-end shapes are represented:
//!
//! - **Native streaming** (`deflate`, `zlib`, `zstd`, `bzip2`, `xz`,
//!   `lzma`, `copy`): the library exposes a true incremental stream
//! - **One-shot buffer** (`gzip`, `lz4`, `snappy`, `snappy-framed`): only
//!   whole-buffer calls exist; the core's accumulating stream provides the
//!   facade
//! - **Thread-bridged** (`brotli`): only a blocking reader/writer pair
//!   exists; the core drives it on a worker thread
//!
//! # Examples
//!
//! ```rust
//! let codec = vise_codecs::get_codec("zstd").unwrap();
//! let compressed = codec.compress_to_vec(b"hello from vise", None).unwrap();
//! let back = codec.decompress_to_vec(&compressed, None).unwrap();
//! assert_eq!(back, b"hello from vise");
//! ```

#![warn(clippy::all)]

use once_cell::sync::Lazy;
use tracing::error;
use vise_core::{Codec, Registry};

mod brotli;
mod bzip2;
mod copy;
mod deflate;
mod gzip;
mod lz4;
mod lzma;
mod snappy;
mod xz;
mod zstd;

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::new();
    let declarations = copy::declarations()
        .into_iter()
        .chain(deflate::declarations())
        .chain(gzip::declarations())
        .chain(zstd::declarations())
        .chain(lz4::declarations())
        .chain(snappy::declarations())
        .chain(bzip2::declarations())
        .chain(xz::declarations())
        .chain(lzma::declarations())
        .chain(brotli::declarations());
    for decl in declarations {
        let name = decl.name;
        if let Err(e) = registry.register(decl) {
            error!(codec = name, "failed to register built-in codec: {e}");
        }
    }
    registry
});

/// The process-wide registry holding every built-in codec.
///
/// Initialized lazily on first use; the instance is read-only afterwards
/// and shared without locking.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Look up a built-in codec by name (case-sensitive).
pub fn get_codec(name: &str) -> Option<Codec> {
    registry().get(name)
}

/// Look up a built-in codec by file extension (case-insensitive).
pub fn get_codec_from_extension(extension: &str) -> Option<Codec> {
    registry().get_by_extension(extension)
}
