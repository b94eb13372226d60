//! The codec registry
//!
//! Maps codec names to codec handles, validating each back-end's declared
//! operation vector at registration time. Lookups by name are
//! case-sensitive; extension lookups are case-insensitive with the codec's
//! priority breaking ties.

use std::collections::BTreeMap;

use tracing::debug;
use vise_types::{Error, Result};

use crate::codec::{Codec, CodecDecl};

/// A set of registered codecs.
///
/// The process-wide instance holding the built-in codecs lives in the
/// `vise-codecs` crate; this type itself is plain data and can also be
/// assembled locally (tests do exactly that). Once populated it is
/// effectively read-only and can be shared freely.
#[derive(Default)]
pub struct Registry {
    by_name: BTreeMap<&'static str, Codec>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codec declaration.
    ///
    /// Fails with [`Error::UnableToLoad`] when the back-end declares no
    /// compression entry point at all, and with [`Error::BadParam`] when
    /// the name is empty or already taken.
    pub fn register(&mut self, decl: CodecDecl) -> Result<()> {
        if decl.name.is_empty() {
            return Err(Error::bad_param("codec name must not be empty"));
        }
        if !decl.backend.ops().has_entry_point() {
            return Err(Error::unable_to_load(decl.name));
        }
        if self.by_name.contains_key(decl.name) {
            return Err(Error::bad_param(format!(
                "codec '{}' is already registered",
                decl.name
            )));
        }
        let name = decl.name;
        let codec = Codec::from_decl(decl);
        debug!(codec = name, info = ?codec.info(), "registered codec");
        self.by_name.insert(name, codec);
        Ok(())
    }

    /// Look up a codec by name (case-sensitive).
    pub fn get(&self, name: &str) -> Option<Codec> {
        self.by_name.get(name).cloned()
    }

    /// Look up a codec by file extension (case-insensitive). When several
    /// codecs claim the extension, the highest priority wins.
    pub fn get_by_extension(&self, extension: &str) -> Option<Codec> {
        self.by_name
            .values()
            .filter(|codec| {
                codec
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .max_by_key(|codec| codec.priority())
            .cloned()
    }

    /// Iterate over all registered codecs in name order.
    pub fn codecs(&self) -> impl Iterator<Item = &Codec> {
        self.by_name.values()
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the registry holds no codecs.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Backend;
    use crate::options::Options;
    use std::sync::Arc;
    use vise_types::Ops;

    struct Passthrough;

    impl Backend for Passthrough {
        fn ops(&self) -> Ops {
            Ops::COMPRESS_BUFFER | Ops::DECOMPRESS_BUFFER
        }
        fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
            uncompressed_len
        }
        fn compress_buffer(
            &self,
            output: &mut [u8],
            input: &[u8],
            _options: &Options,
        ) -> vise_types::Result<usize> {
            output[..input.len()].copy_from_slice(input);
            Ok(input.len())
        }
    }

    struct NoEntryPoint;

    impl Backend for NoEntryPoint {
        fn ops(&self) -> Ops {
            Ops::DECOMPRESS_BUFFER | Ops::UNCOMPRESSED_SIZE
        }
        fn max_compressed_size(&self, uncompressed_len: usize) -> usize {
            uncompressed_len
        }
    }

    fn decl(name: &'static str, extension: Option<&'static str>, priority: u32) -> CodecDecl {
        CodecDecl {
            name,
            extension,
            priority,
            backend: Arc::new(Passthrough),
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry.register(decl("alpha", Some("az"), 50)).unwrap();
        assert!(registry.get("alpha").is_some());
        // Codec names are case-sensitive.
        assert!(registry.get("Alpha").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = Registry::new();
        registry.register(decl("alpha", None, 50)).unwrap();
        assert!(matches!(
            registry.register(decl("alpha", None, 50)),
            Err(Error::BadParam { .. })
        ));
    }

    #[test]
    fn test_backend_without_entry_point_rejected() {
        let mut registry = Registry::new();
        let result = registry.register(CodecDecl {
            name: "broken",
            extension: None,
            priority: 50,
            backend: Arc::new(NoEntryPoint),
        });
        assert!(matches!(result, Err(Error::UnableToLoad { .. })));
    }

    #[test]
    fn test_extension_lookup_priority() {
        let mut registry = Registry::new();
        registry.register(decl("low", Some("xy"), 10)).unwrap();
        registry.register(decl("high", Some("xy"), 90)).unwrap();
        let found = registry.get_by_extension("XY").unwrap();
        assert_eq!(found.name(), "high");
    }

    #[test]
    fn test_codecs_iteration_is_ordered() {
        let mut registry = Registry::new();
        registry.register(decl("zeta", None, 50)).unwrap();
        registry.register(decl("alpha", None, 50)).unwrap();
        let names: Vec<&str> = registry.codecs().map(Codec::name).collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }
}
