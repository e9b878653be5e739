//! Snapshot file framing
//!
//! ```text
//! +------------------+
//! | Magic (4 bytes)  |  "AFSN"
//! +------------------+
//! | Version (1)      |  Format version (1)
//! +------------------+
//! | Payload Len (8)  |  u64 LE
//! +------------------+
//! | Payload          |  MessagePack SnapshotBody
//! +------------------+
//! | CRC32 (4)        |  u32 LE, checksum of everything above
//! +------------------+
//! ```

use affine_core::StoreError;
use thiserror::Error;

/// Snapshot file magic bytes
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"AFSN";

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u8 = 1;

/// Header size: Magic(4) + Version(1) + PayloadLen(8)
pub const SNAPSHOT_HEADER_SIZE: usize = 13;

/// Footer size: CRC32(4)
pub const SNAPSHOT_FOOTER_SIZE: usize = 4;

/// Smallest well-formed snapshot (empty payload)
pub const MIN_SNAPSHOT_SIZE: usize = SNAPSHOT_HEADER_SIZE + SNAPSHOT_FOOTER_SIZE;

/// Conventional snapshot file extension
pub const SNAPSHOT_EXTENSION: &str = "afsn";

/// Snapshot errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Magic bytes do not match
    #[error("Invalid magic bytes")]
    InvalidMagic,

    /// Format version is not supported
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u8),

    /// Input ended before the declared content
    #[error("Snapshot too short: expected {expected} bytes, got {actual}")]
    TooShort {
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// Declared payload length disagrees with the data
    #[error("Payload length mismatch: header says {declared} bytes, found {actual}")]
    LengthMismatch {
        /// Length from the header
        declared: u64,
        /// Length actually present
        actual: u64,
    },

    /// Footer checksum does not match the content
    #[error("Checksum mismatch: stored {stored:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// CRC32 stored in the footer
        stored: u32,
        /// CRC32 computed over the content
        computed: u32,
    },

    /// Payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Payload could not be decoded
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

impl SnapshotError {
    /// Check if this error means the framing is damaged
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            SnapshotError::InvalidMagic
                | SnapshotError::UnsupportedVersion(_)
                | SnapshotError::TooShort { .. }
                | SnapshotError::LengthMismatch { .. }
                | SnapshotError::ChecksumMismatch { .. }
        )
    }
}

impl From<SnapshotError> for StoreError {
    fn from(e: SnapshotError) -> Self {
        match e {
            SnapshotError::Io(io) => StoreError::Io(io),
            SnapshotError::Serialize(msg) | SnapshotError::Deserialize(msg) => {
                StoreError::Serialization(msg)
            }
            other => StoreError::Corruption(other.to_string()),
        }
    }
}
