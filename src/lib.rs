//! Affine - embeddable schema-typed record store with vector search
//!
//! Affine stores records of declared collections, filters them with a small
//! predicate algebra, and ranks them by vector similarity through a pluggable
//! nearest-neighbor backend. The whole store persists as one checksummed
//! snapshot.
//!
//! # Quick Start
//!
//! ```
//! use affine::{CollectionSchema, DistanceMetric, FieldType, LocalEngine, StorageEngine};
//!
//! # fn main() -> affine::StoreResult<()> {
//! let person = CollectionSchema::builder("person")
//!     .field("name", FieldType::String)
//!     .field("age", FieldType::Int)
//!     .vector("embedding", 2, DistanceMetric::Euclidean)
//!     .build()?;
//!
//! let mut engine = LocalEngine::new();
//! engine.insert(person.record().set("name", "John").set("age", 20).set("embedding", vec![3.0f32, 0.0]).build()?)?;
//! engine.insert(person.record().set("name", "Jane").set("age", 30).set("embedding", vec![1.0f32, 2.0]).build()?)?;
//!
//! let nearest = engine
//!     .collection(&person)?
//!     .similarity(person.field("embedding")?.similar_to(vec![1.8f32, 2.3])?)
//!     .limit(1)?;
//! assert_eq!(nearest[0].get("name").and_then(|v| v.as_str()), Some("Jane"));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `affine-core`: schemas, records, values, filters, errors
//! - `affine-durability`: snapshot format and crash-safe snapshot files
//! - `affine-engine`: the storage-engine contract, the local engine, the
//!   query builder and the nearest-neighbor backends

pub use affine_core::*;
pub use affine_durability::{
    decode_from_slice, decode_snapshot, encode_snapshot, encode_to_vec, read_snapshot,
    temp_path_for, write_snapshot_atomic, CollectionSnapshot, SnapshotBody, SnapshotError,
    SnapshotInfo, SnapshotRecord, SNAPSHOT_EXTENSION, SNAPSHOT_FORMAT_VERSION, SNAPSHOT_MAGIC,
};
pub use affine_engine::vector;
pub use affine_engine::{
    Criterion, DeleteTarget, EngineConfig, HnswConfig, IndexBackendFactory, KdTreeConfig,
    LocalEngine, QueryBuilder, StorageEngine, VectorMatrix, CONFIG_FILE_NAME,
};
