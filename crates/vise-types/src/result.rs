//! Result type alias for vise operations

/// A specialized `Result` carrying the unified [`crate::Error`].
pub type Result<T> = std::result::Result<T, crate::Error>;
