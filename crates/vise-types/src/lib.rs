//! Core type system and error handling for vise
//!
//! This crate provides the foundational types used throughout the vise
//! workspace:
//!
//! - **Status taxonomy**: the closed set of operation outcomes, split into
//!   [`Status`] (progress) and [`Error`] (failure)
//! - **Stream types**: [`Direction`], [`Operation`] and per-call
//!   [`Progress`] accounting
//! - **Capability flags**: [`CodecInfo`] advertised to callers and the
//!   [`Ops`] vector back-ends declare at registration
//!
//! # Features
//!
//! - `serde`: Enable serialization support for the plain data types
//!
//! # Examples
//!
//! ```rust
//! use vise_types::{Error, Result, Status};
//!
//! fn example_operation() -> Result<Status> {
//!     Err(Error::bad_param("leve"))
//! }
//!
//! assert!(example_operation().is_err());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod result;
pub mod status;
pub mod types;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
pub use result::Result;
pub use status::{Progress, Status};
pub use types::{CodecInfo, Direction, Operation, Ops};
