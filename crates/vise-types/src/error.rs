//! Error types for vise operations
//!
//! Every fallible operation in the system returns one member of this closed
//! taxonomy. Back-end specific error codes are mapped onto it at the adapter
//! boundary; codes without a defined mapping become [`Error::Failed`].

/// Main error type shared by every vise operation.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The operation failed for a codec-specific reason
    #[error("operation failed: {message}")]
    Failed {
        /// Description of the failure, usually from the wrapped library
        message: String,
    },

    /// The requested codec could not be bound to a back-end
    #[error("unable to load codec '{name}'")]
    UnableToLoad {
        /// Name of the codec that failed to load
        name: String,
    },

    /// An unknown parameter name was supplied
    #[error("unknown parameter '{name}'")]
    BadParam {
        /// The offending parameter name
        name: String,
    },

    /// A parameter value was malformed or out of range
    #[error("bad value '{value}' for parameter '{name}'")]
    BadValue {
        /// The parameter the value was supplied for
        name: String,
        /// The rejected value
        value: String,
    },

    /// Memory allocation failed
    #[error("allocation failure")]
    Memory,

    /// The supplied output buffer is too small; retry with more space
    #[error("output buffer too small")]
    BufferFull,

    /// The supplied input buffer is insufficient for a bounded step
    #[error("input buffer exhausted")]
    BufferEmpty,

    /// The operation is invalid in the stream's current lifecycle state
    #[error("invalid stream state: {message}")]
    State {
        /// What was attempted and why the state forbids it
        message: String,
    },

    /// A size conversion or derived quantity fell outside the representable range
    #[error("value out of range: {message}")]
    Range {
        /// Description of the overflowing quantity
        message: String,
    },

    /// The codec does not provide the requested operation
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// The operation that is unavailable
        message: String,
    },

    /// An I/O error from a caller-supplied reader or writer, returned verbatim
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error category, mirroring the taxonomy in the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller mistakes: bad parameters, bad values, unsupported operations
    User,
    /// Insufficient resources: memory, output space, input bytes
    Resource,
    /// Data or state errors fatal to the stream
    Data,
    /// I/O failures from caller-supplied callbacks
    Io,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadParam { .. }
            | Self::BadValue { .. }
            | Self::InvalidOperation { .. }
            | Self::Range { .. } => ErrorKind::User,
            Self::Memory | Self::BufferFull | Self::BufferEmpty => ErrorKind::Resource,
            Self::Failed { .. } | Self::UnableToLoad { .. } | Self::State { .. } => ErrorKind::Data,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether the caller can retry the same operation with more resources.
    ///
    /// Only `BufferFull` and `BufferEmpty` qualify; they never poison a
    /// stream.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::BufferFull | Self::BufferEmpty)
    }

    /// Create a new generic failure
    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Create a new codec-load failure
    pub fn unable_to_load<S: Into<String>>(name: S) -> Self {
        Self::UnableToLoad { name: name.into() }
    }

    /// Create a new unknown-parameter error
    pub fn bad_param<S: Into<String>>(name: S) -> Self {
        Self::BadParam { name: name.into() }
    }

    /// Create a new bad-value error
    pub fn bad_value<S: Into<String>, V: Into<String>>(name: S, value: V) -> Self {
        Self::BadValue {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a new lifecycle-state error
    pub fn state<S: Into<String>>(message: S) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a new out-of-range error
    pub fn range<S: Into<String>>(message: S) -> Self {
        Self::Range {
            message: message.into(),
        }
    }

    /// Create a new unsupported-operation error
    pub fn invalid_operation<S: Into<String>>(message: S) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
