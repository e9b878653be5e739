//! Snapshot codec
//!
//! Frames a MessagePack [`SnapshotBody`] with magic, version, payload length
//! and a CRC32 footer. Decoding verifies the whole frame before the payload
//! is deserialized, so a damaged file never yields a partial store.

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::format::{
    SnapshotError, MIN_SNAPSHOT_SIZE, SNAPSHOT_FOOTER_SIZE, SNAPSHOT_FORMAT_VERSION,
    SNAPSHOT_HEADER_SIZE, SNAPSHOT_MAGIC,
};
use crate::snapshot::SnapshotBody;

/// Encode a snapshot into a framed byte buffer
pub fn encode_to_vec(body: &SnapshotBody) -> Result<Vec<u8>, SnapshotError> {
    let payload =
        rmp_serde::to_vec_named(body).map_err(|e| SnapshotError::Serialize(e.to_string()))?;

    let mut buf = Vec::with_capacity(MIN_SNAPSHOT_SIZE + payload.len());
    buf.write_all(SNAPSHOT_MAGIC)?;
    buf.write_u8(SNAPSHOT_FORMAT_VERSION)?;
    buf.write_u64::<LittleEndian>(payload.len() as u64)?;
    buf.write_all(&payload)?;

    let crc = crc32fast::hash(&buf);
    buf.write_u32::<LittleEndian>(crc)?;
    Ok(buf)
}

/// Write a framed snapshot to a sink
///
/// Returns the number of bytes written.
pub fn encode_snapshot<W: Write>(body: &SnapshotBody, writer: &mut W) -> Result<u64, SnapshotError> {
    let buf = encode_to_vec(body)?;
    writer.write_all(&buf)?;
    writer.flush()?;
    debug!(
        target: "affine::snapshot",
        collections = body.len(),
        records = body.record_count(),
        size_bytes = buf.len(),
        "Snapshot encoded"
    );
    Ok(buf.len() as u64)
}

/// Decode a framed snapshot from bytes
pub fn decode_from_slice(data: &[u8]) -> Result<SnapshotBody, SnapshotError> {
    if data.len() < MIN_SNAPSHOT_SIZE {
        return Err(SnapshotError::TooShort {
            expected: MIN_SNAPSHOT_SIZE,
            actual: data.len(),
        });
    }
    if &data[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(SnapshotError::InvalidMagic);
    }

    let mut header = Cursor::new(&data[SNAPSHOT_MAGIC.len()..SNAPSHOT_HEADER_SIZE]);
    let version = header.read_u8()?;
    if version != SNAPSHOT_FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(version));
    }
    let declared = header.read_u64::<LittleEndian>()?;
    let actual = (data.len() - MIN_SNAPSHOT_SIZE) as u64;
    if declared != actual {
        return Err(SnapshotError::LengthMismatch { declared, actual });
    }

    let (content, footer) = data.split_at(data.len() - SNAPSHOT_FOOTER_SIZE);
    let stored = Cursor::new(footer).read_u32::<LittleEndian>()?;
    let computed = crc32fast::hash(content);
    if stored != computed {
        return Err(SnapshotError::ChecksumMismatch { stored, computed });
    }

    rmp_serde::from_slice(&content[SNAPSHOT_HEADER_SIZE..])
        .map_err(|e| SnapshotError::Deserialize(e.to_string()))
}

/// Read and decode a framed snapshot from a source
///
/// The source is read to its end.
pub fn decode_snapshot<R: Read>(reader: &mut R) -> Result<SnapshotBody, SnapshotError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let body = decode_from_slice(&data)?;
    debug!(
        target: "affine::snapshot",
        collections = body.len(),
        records = body.record_count(),
        size_bytes = data.len(),
        "Snapshot decoded"
    );
    Ok(body)
}
