//! Crash-safe snapshot files
//!
//! Snapshot creation follows the write-fsync-rename pattern:
//! 1. Write to a temporary file next to the target (`.<name>.tmp`)
//! 2. fsync the temporary file
//! 3. Atomic rename to the final path
//! 4. fsync the parent directory
//!
//! Either the complete snapshot exists at the target path or the previous
//! file is left untouched.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codec::{decode_snapshot, encode_to_vec};
use crate::format::SnapshotError;
use crate::snapshot::SnapshotBody;

/// Information about a written snapshot
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    /// Final path
    pub path: PathBuf,
    /// File size in bytes
    pub size_bytes: u64,
    /// CRC32 footer
    pub crc: u32,
}

/// Temporary path used while writing `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Write a snapshot atomically
///
/// The parent directory is created if needed. A stale temporary file from
/// an earlier failed attempt is removed first; on failure the temporary
/// file is cleaned up and the target is left as it was.
pub fn write_snapshot_atomic(body: &SnapshotBody, path: &Path) -> Result<SnapshotInfo, SnapshotError> {
    let bytes = encode_to_vec(body)?;
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if temp_path.exists() {
        warn!(target: "affine::snapshot", path = %temp_path.display(), "Removing stale temp file");
        let _ = std::fs::remove_file(&temp_path);
    }

    match write_and_rename(&bytes, &temp_path, path) {
        Ok(()) => {
            let crc = u32::from_le_bytes(footer(&bytes));
            info!(
                target: "affine::snapshot",
                path = %path.display(),
                collections = body.len(),
                records = body.record_count(),
                size_bytes = bytes.len(),
                "Snapshot written"
            );
            Ok(SnapshotInfo {
                path: path.to_path_buf(),
                size_bytes: bytes.len() as u64,
                crc,
            })
        }
        Err(e) => {
            warn!(
                target: "affine::snapshot",
                temp_path = %temp_path.display(),
                error = %e,
                "Snapshot write failed, cleaning up temp file"
            );
            let _ = std::fs::remove_file(&temp_path);
            Err(SnapshotError::Io(e))
        }
    }
}

fn write_and_rename(bytes: &[u8], temp_path: &Path, path: &Path) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(temp_path, path)?;
    debug!(target: "affine::snapshot", path = %path.display(), "Atomic rename completed");

    sync_parent_dir(path)
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => File::open(parent)?.sync_all(),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn footer(bytes: &[u8]) -> [u8; 4] {
    let mut crc = [0u8; 4];
    if bytes.len() >= 4 {
        crc.copy_from_slice(&bytes[bytes.len() - 4..]);
    }
    crc
}

/// Read and validate a snapshot file
pub fn read_snapshot(path: &Path) -> Result<SnapshotBody, SnapshotError> {
    let mut reader = BufReader::new(File::open(path)?);
    decode_snapshot(&mut reader)
}
