//! Direction, operation and capability types shared across the workspace

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Direction of a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Encode plain bytes into the codec's compressed form
    Compress,
    /// Decode the codec's compressed form back into plain bytes
    Decompress,
}

/// Operation driving a stream's next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Consume input and emit output
    Process,
    /// Emit buffered output up to a synchronisation boundary
    Flush,
    /// Signal end of input and drain all remaining output
    Finish,
    /// Abandon the stream. Produced internally during teardown; never
    /// observed by callers as a live operation.
    Terminate,
}

bitflags::bitflags! {
    /// Capability flags a codec advertises to callers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CodecInfo: u32 {
        /// The codec can emit a synchronisation boundary on demand
        const CAN_FLUSH = 1 << 0;
        /// The codec can recover the uncompressed size from compressed data
        const KNOWS_UNCOMPRESSED_SIZE = 1 << 1;
        /// The codec embeds the original size, so it round-trips arbitrary
        /// payloads without external length bookkeeping
        const WRAP_SIZE = 1 << 2;
        /// The back-end exposes a true incremental stream of its own
        const NATIVE_STREAMING = 1 << 3;
        /// The back-end only offers a blocking reader/writer interface and
        /// is driven on a dedicated worker thread
        const RUN_IN_THREAD = 1 << 4;
    }
}

bitflags::bitflags! {
    /// The operation vector a back-end declares at registration time.
    ///
    /// Any subset may be present, but a back-end with no compression entry
    /// point at all (`COMPRESS_BUFFER`, `COMPRESS_BUFFER_UNCHECKED`,
    /// `STREAM`, `RUN` or `SPLICE`) fails to register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ops: u32 {
        /// One-shot compress that tolerates undersized output buffers
        const COMPRESS_BUFFER = 1 << 0;
        /// One-shot compress requiring a worst-case sized output buffer
        const COMPRESS_BUFFER_UNCHECKED = 1 << 1;
        /// One-shot decompress over contiguous memory
        const DECOMPRESS_BUFFER = 1 << 2;
        /// Incremental stream state (`init_stream`)
        const STREAM = 1 << 3;
        /// Blocking reader/writer pair (`run`), bridged onto a worker thread
        const RUN = 1 << 4;
        /// Native source-to-sink splice hook
        const SPLICE = 1 << 5;
        /// Can recover the uncompressed size from a compressed buffer
        const UNCOMPRESSED_SIZE = 1 << 6;
    }
}

impl Ops {
    /// Whether this vector contains at least one compression entry point.
    pub fn has_entry_point(self) -> bool {
        self.intersects(
            Self::COMPRESS_BUFFER
                | Self::COMPRESS_BUFFER_UNCHECKED
                | Self::STREAM
                | Self::RUN
                | Self::SPLICE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_point_detection() {
        assert!(Ops::COMPRESS_BUFFER.has_entry_point());
        assert!(Ops::STREAM.has_entry_point());
        assert!(Ops::RUN.has_entry_point());
        assert!(!Ops::DECOMPRESS_BUFFER.has_entry_point());
        assert!(!(Ops::UNCOMPRESSED_SIZE | Ops::DECOMPRESS_BUFFER).has_entry_point());
    }

    #[test]
    fn test_codec_info_flags() {
        let info = CodecInfo::CAN_FLUSH | CodecInfo::NATIVE_STREAMING;
        assert!(info.contains(CodecInfo::CAN_FLUSH));
        assert!(!info.contains(CodecInfo::RUN_IN_THREAD));
    }
}
