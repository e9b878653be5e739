//! Snapshot persistence for Affine
//!
//! This crate provides:
//! - Snapshot data model (collections, schemas, identified records)
//! - Framed codec: magic, version, MessagePack payload, CRC32 footer
//! - Crash-safe snapshot files (write-fsync-rename)
//!
//! Snapshots are whole-store and blocking: there is no incremental or
//! streaming persistence.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod format;
pub mod snapshot;
pub mod writer;

pub use codec::{decode_from_slice, decode_snapshot, encode_snapshot, encode_to_vec};
pub use format::{
    SnapshotError, MIN_SNAPSHOT_SIZE, SNAPSHOT_EXTENSION, SNAPSHOT_FORMAT_VERSION,
    SNAPSHOT_HEADER_SIZE, SNAPSHOT_MAGIC,
};
pub use snapshot::{CollectionSnapshot, SnapshotBody, SnapshotRecord};
pub use writer::{read_snapshot, temp_path_for, write_snapshot_atomic, SnapshotInfo};
