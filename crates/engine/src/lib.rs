//! Storage engine for Affine
//!
//! This crate evaluates queries over schema-typed records:
//! - StorageEngine: the operations every record store provides
//! - LocalEngine: in-process store with whole-store snapshots
//! - QueryBuilder: fluent filter/similarity accumulation
//! - vector: nearest-neighbor backends (brute force, KD-tree, HNSW)
//! - EngineConfig: backend selection via `affine.toml`
//!
//! Similarity queries build a fresh index over the filtered candidates
//! every time; nothing is cached between queries.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod contract;
pub mod local;
pub mod query;
pub mod vector;

pub use config::{EngineConfig, HnswSection, KdTreeSection, CONFIG_FILE_NAME};
pub use contract::{DeleteTarget, StorageEngine};
pub use local::LocalEngine;
pub use query::{Criterion, QueryBuilder};
pub use vector::{
    BruteForceBackend, HnswConfig, IndexBackendFactory, KdTreeConfig, Neighbor, VectorIndex,
    VectorIndexBackend, VectorMatrix,
};
