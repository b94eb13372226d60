//! Non-failure stream outcomes and progress reporting

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Successful outcome of a stream operation.
///
/// Failures are carried separately by [`crate::Error`]; together the two
/// form the closed status set every operation reports from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    /// The request was satisfied. For `process` this additionally means all
    /// supplied input was consumed.
    Ok,
    /// The back-end produced output but has more work pending; invoke the
    /// same operation again with output space (and input, if relevant).
    Processing,
    /// A decompressor observed the codec's in-band end marker; further
    /// `process` calls yield no more output. Codecs without framing never
    /// report this.
    EndOfStream,
}

impl Status {
    /// Whether this status terminates the current operation sequence.
    pub fn is_complete(self) -> bool {
        !matches!(self, Self::Processing)
    }
}

/// Byte accounting for a single stream operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Outcome of the operation
    pub status: Status,
    /// Bytes consumed from the caller's input slice
    pub read: usize,
    /// Bytes written to the caller's output slice
    pub written: usize,
}

impl Progress {
    /// Create a new progress record
    pub fn new(status: Status, read: usize, written: usize) -> Self {
        Self {
            status,
            read,
            written,
        }
    }

    /// A completed operation that moved no bytes
    pub fn done() -> Self {
        Self::new(Status::Ok, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion() {
        assert!(Status::Ok.is_complete());
        assert!(Status::EndOfStream.is_complete());
        assert!(!Status::Processing.is_complete());
    }

    #[test]
    fn test_progress_done() {
        let p = Progress::done();
        assert_eq!(p.status, Status::Ok);
        assert_eq!(p.read, 0);
        assert_eq!(p.written, 0);
    }
}
