//! Typed, schema-driven codec configuration
//!
//! Each codec declares an ordered schema of option descriptors. An
//! [`Options`] bag is created against that schema with every entry resolved
//! to its default, then populated from string key/value pairs. Back-ends
//! read values by schema index (the fast path); parsers resolve names
//! case-insensitively (the slow path).

use vise_types::{Error, Result};

/// Constraint and default carried by one schema entry.
#[derive(Debug, Clone, Copy)]
pub enum OptionKind {
    /// A boolean, spelled "true" or "false" (case-insensitive)
    Bool {
        /// Value used when the option is not supplied
        default: bool,
    },
    /// A ranged integer. `modulus` additionally requires
    /// `(value - min) % modulus == 0`; `allow_zero` admits 0 outside the
    /// range.
    Int {
        /// Inclusive lower bound
        min: i64,
        /// Inclusive upper bound
        max: i64,
        /// Optional step constraint relative to `min`
        modulus: Option<i64>,
        /// Whether 0 is accepted even when outside `[min, max]`
        allow_zero: bool,
        /// Value used when the option is not supplied
        default: i64,
    },
    /// An integer restricted to an explicit list of values
    IntEnum {
        /// The admissible values, in declaration order
        allowed: &'static [i64],
        /// Value used when the option is not supplied
        default: i64,
    },
    /// A ranged byte count
    Size {
        /// Inclusive lower bound
        min: u64,
        /// Inclusive upper bound
        max: u64,
        /// Whether 0 is accepted even when outside `[min, max]`
        allow_zero: bool,
        /// Value used when the option is not supplied
        default: u64,
    },
    /// A string matched case-insensitively against a name→integer map
    EnumString {
        /// Ordered `(name, value)` pairs
        values: &'static [(&'static str, i64)],
        /// Mapped integer used when the option is not supplied
        default: i64,
    },
    /// A free-form string
    Str {
        /// Value used when the option is not supplied
        default: &'static str,
    },
}

/// One entry of a codec's option schema.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    /// Option name, matched case-insensitively
    pub name: &'static str,
    /// Type, constraints and default
    pub kind: OptionKind,
}

/// Ordered, finite schema of options a codec declares.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionSchema {
    specs: &'static [OptionSpec],
}

impl OptionSchema {
    /// Wrap a static table of option descriptors.
    pub const fn new(specs: &'static [OptionSpec]) -> Self {
        Self { specs }
    }

    /// Number of entries in the schema.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the schema declares no options.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Entry at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&OptionSpec> {
        self.specs.get(index)
    }

    /// Resolve an option name (case-insensitive) to its schema index.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.specs
            .iter()
            .position(|spec| spec.name.eq_ignore_ascii_case(name))
    }

    /// Iterate over the schema entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &OptionSpec> {
        self.specs.iter()
    }
}

/// A resolved option value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OptionValue {
    Bool(bool),
    Int(i64),
    Size(u64),
    Str(String),
}

/// Configuration bag bound to one codec.
///
/// Every schema index always holds a resolved value; construction fills in
/// defaults and [`parse`](Options::parse) replaces them. Once handed to a
/// stream or buffer operation the bag is read-only.
#[derive(Debug, Clone)]
pub struct Options {
    codec: String,
    schema: OptionSchema,
    values: Vec<OptionValue>,
}

impl Options {
    /// Create an options bag for `codec` with every entry at its default.
    pub fn new(codec: &str, schema: OptionSchema) -> Self {
        let values = schema
            .iter()
            .map(|spec| match spec.kind {
                OptionKind::Bool { default } => OptionValue::Bool(default),
                OptionKind::Int { default, .. } | OptionKind::IntEnum { default, .. } => {
                    OptionValue::Int(default)
                }
                OptionKind::Size { default, .. } => OptionValue::Size(default),
                OptionKind::EnumString { default, .. } => OptionValue::Int(default),
                OptionKind::Str { default } => OptionValue::Str(default.to_owned()),
            })
            .collect();
        Self {
            codec: codec.to_owned(),
            schema,
            values,
        }
    }

    /// Create an options bag and populate it from `(key, value)` pairs.
    pub fn from_pairs(codec: &str, schema: OptionSchema, pairs: &[(&str, &str)]) -> Result<Self> {
        let mut options = Self::new(codec, schema);
        for (key, value) in pairs {
            options.parse(key, value)?;
        }
        Ok(options)
    }

    /// Parse one `(key, value)` pair against the schema.
    ///
    /// Unknown keys yield [`Error::BadParam`]; malformed or out-of-range
    /// values yield [`Error::BadValue`].
    pub fn parse(&mut self, key: &str, value: &str) -> Result<()> {
        let index = self
            .schema
            .find(key)
            .ok_or_else(|| Error::bad_param(key))?;
        let spec = &self.schema.specs[index];
        self.values[index] = parse_value(spec, value)?;
        Ok(())
    }

    /// Name of the codec this bag is bound to.
    pub fn codec(&self) -> &str {
        &self.codec
    }

    /// Verify the bag is bound to `codec`, the guard consumers apply before
    /// trusting index lookups.
    pub fn ensure_codec(&self, codec: &str) -> Result<()> {
        if self.codec == codec {
            Ok(())
        } else {
            Err(Error::bad_param(format!(
                "options bound to codec '{}' passed to codec '{}'",
                self.codec, codec
            )))
        }
    }

    /// Integer value at `index` (covers `Int`, `IntEnum` and `EnumString`).
    pub fn int_at(&self, index: usize) -> Result<i64> {
        match self.values.get(index) {
            Some(OptionValue::Int(v)) => Ok(*v),
            _ => Err(self.index_error(index)),
        }
    }

    /// Boolean value at `index`.
    pub fn bool_at(&self, index: usize) -> Result<bool> {
        match self.values.get(index) {
            Some(OptionValue::Bool(v)) => Ok(*v),
            _ => Err(self.index_error(index)),
        }
    }

    /// Size value at `index`.
    pub fn size_at(&self, index: usize) -> Result<u64> {
        match self.values.get(index) {
            Some(OptionValue::Size(v)) => Ok(*v),
            _ => Err(self.index_error(index)),
        }
    }

    /// String value at `index`.
    pub fn str_at(&self, index: usize) -> Result<&str> {
        match self.values.get(index) {
            Some(OptionValue::Str(v)) => Ok(v),
            _ => Err(self.index_error(index)),
        }
    }

    /// Integer value looked up by name.
    pub fn int(&self, name: &str) -> Result<i64> {
        let index = self.schema.find(name).ok_or_else(|| Error::bad_param(name))?;
        self.int_at(index)
    }

    /// Boolean value looked up by name.
    pub fn bool(&self, name: &str) -> Result<bool> {
        let index = self.schema.find(name).ok_or_else(|| Error::bad_param(name))?;
        self.bool_at(index)
    }

    /// Size value looked up by name.
    pub fn size(&self, name: &str) -> Result<u64> {
        let index = self.schema.find(name).ok_or_else(|| Error::bad_param(name))?;
        self.size_at(index)
    }

    fn index_error(&self, index: usize) -> Error {
        Error::bad_param(format!(
            "option index {} does not exist or has a different type for codec '{}'",
            index, self.codec
        ))
    }
}

fn parse_value(spec: &OptionSpec, value: &str) -> Result<OptionValue> {
    let reject = || Error::bad_value(spec.name, value);
    match spec.kind {
        OptionKind::Bool { .. } => {
            if value.eq_ignore_ascii_case("true") {
                Ok(OptionValue::Bool(true))
            } else if value.eq_ignore_ascii_case("false") {
                Ok(OptionValue::Bool(false))
            } else {
                Err(reject())
            }
        }
        OptionKind::Int {
            min,
            max,
            modulus,
            allow_zero,
            ..
        } => {
            let v: i64 = value.trim().parse().map_err(|_| reject())?;
            if v == 0 && allow_zero {
                return Ok(OptionValue::Int(0));
            }
            if v < min || v > max {
                return Err(reject());
            }
            if let Some(m) = modulus {
                if m > 0 && (v - min) % m != 0 {
                    return Err(reject());
                }
            }
            Ok(OptionValue::Int(v))
        }
        OptionKind::IntEnum { allowed, .. } => {
            let v: i64 = value.trim().parse().map_err(|_| reject())?;
            if allowed.contains(&v) {
                Ok(OptionValue::Int(v))
            } else {
                Err(reject())
            }
        }
        OptionKind::Size {
            min,
            max,
            allow_zero,
            ..
        } => {
            let v: u64 = value.trim().parse().map_err(|_| reject())?;
            if v == 0 && allow_zero {
                return Ok(OptionValue::Size(0));
            }
            if v < min || v > max {
                return Err(reject());
            }
            Ok(OptionValue::Size(v))
        }
        OptionKind::EnumString { values, .. } => values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(value))
            .map(|(_, mapped)| OptionValue::Int(*mapped))
            .ok_or_else(reject),
        OptionKind::Str { .. } => Ok(OptionValue::Str(value.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: OptionSchema = OptionSchema::new(&[
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
        OptionSpec {
            name: "block-size",
            kind: OptionKind::Int {
                min: 100,
                max: 900,
                modulus: Some(100),
                allow_zero: true,
                default: 100,
            },
        },
        OptionSpec {
            name: "threads",
            kind: OptionKind::IntEnum {
                allowed: &[1, 2, 4, 8],
                default: 1,
            },
        },
        OptionSpec {
            name: "dict-size",
            kind: OptionKind::Size {
                min: 4096,
                max: 1 << 30,
                allow_zero: false,
                default: 1 << 23,
            },
        },
        OptionSpec {
            name: "strategy",
            kind: OptionKind::EnumString {
                values: &[("default", 0), ("filtered", 1), ("rle", 3)],
                default: 0,
            },
        },
        OptionSpec {
            name: "comment",
            kind: OptionKind::Bool { default: false },
        },
    ]);

    fn options() -> Options {
        Options::new("test", SCHEMA)
    }

    #[test]
    fn test_defaults_resolved() {
        let opts = options();
        assert_eq!(opts.int_at(0).unwrap(), 6);
        assert_eq!(opts.int_at(1).unwrap(), 100);
        assert_eq!(opts.size_at(3).unwrap(), 1 << 23);
        assert_eq!(opts.int_at(4).unwrap(), 0);
        assert!(!opts.bool_at(5).unwrap());
    }

    #[test]
    fn test_unknown_key_is_bad_param() {
        let mut opts = options();
        assert!(matches!(
            opts.parse("leve", "5"),
            Err(Error::BadParam { .. })
        ));
    }

    #[test]
    fn test_int_range_boundaries() {
        let mut opts = options();
        opts.parse("level", "1").unwrap();
        opts.parse("level", "9").unwrap();
        assert!(matches!(
            opts.parse("level", "0"),
            Err(Error::BadValue { .. })
        ));
        assert!(matches!(
            opts.parse("level", "10"),
            Err(Error::BadValue { .. })
        ));
        assert!(matches!(
            opts.parse("level", "six"),
            Err(Error::BadValue { .. })
        ));
    }

    #[test]
    fn test_modulus_and_allow_zero() {
        let mut opts = options();
        opts.parse("block-size", "300").unwrap();
        assert_eq!(opts.int("block-size").unwrap(), 300);
        assert!(opts.parse("block-size", "250").is_err());
        // 0 is outside [100, 900] but admitted by allow_zero
        opts.parse("block-size", "0").unwrap();
        assert_eq!(opts.int("block-size").unwrap(), 0);
    }

    #[test]
    fn test_int_enum() {
        let mut opts = options();
        opts.parse("threads", "4").unwrap();
        assert_eq!(opts.int("threads").unwrap(), 4);
        assert!(opts.parse("threads", "3").is_err());
    }

    #[test]
    fn test_enum_string_case_insensitive() {
        let mut opts = options();
        opts.parse("STRATEGY", "RLE").unwrap();
        assert_eq!(opts.int("strategy").unwrap(), 3);
        assert!(matches!(
            opts.parse("strategy", "huffman"),
            Err(Error::BadValue { .. })
        ));
    }

    #[test]
    fn test_bool_parsing() {
        let mut opts = options();
        opts.parse("comment", "TRUE").unwrap();
        assert!(opts.bool("comment").unwrap());
        opts.parse("comment", "false").unwrap();
        assert!(!opts.bool("comment").unwrap());
        assert!(opts.parse("comment", "yes").is_err());
    }

    #[test]
    fn test_size_range() {
        let mut opts = options();
        opts.parse("dict-size", "4096").unwrap();
        assert!(opts.parse("dict-size", "4095").is_err());
        assert!(opts.parse("dict-size", "-1").is_err());
    }

    #[test]
    fn test_codec_binding_guard() {
        let opts = options();
        assert!(opts.ensure_codec("test").is_ok());
        assert!(matches!(
            opts.ensure_codec("other"),
            Err(Error::BadParam { .. })
        ));
    }

    #[test]
    fn test_from_pairs() {
        let opts =
            Options::from_pairs("test", SCHEMA, &[("level", "3"), ("strategy", "filtered")])
                .unwrap();
        assert_eq!(opts.int("level").unwrap(), 3);
        assert_eq!(opts.int("strategy").unwrap(), 1);
    }
}
