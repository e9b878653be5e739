//! Nearest-neighbor search
//!
//! This module provides the similarity half of query evaluation:
//!
//! - **VectorMatrix**: contiguous row-major candidate vectors
//! - **distance**: Euclidean, Cosine and DotProduct distances (lower = nearer)
//! - **VectorIndexBackend**: trait for swappable index implementations
//! - **BruteForceBackend**: exact O(n) search, always available
//! - **KdTreeBackend**: exact tree search (`kd-tree` feature)
//! - **HnswBackend**: approximate graph search (`hnsw` feature)
//! - **IndexBackendFactory**: capability-checked backend selection

pub mod backend;
pub mod brute_force;
pub mod distance;
#[cfg(feature = "hnsw")]
pub mod hnsw;
#[cfg(feature = "kd-tree")]
pub mod kd_tree;
pub mod matrix;

pub use backend::{
    HnswConfig, IndexBackendFactory, KdTreeConfig, Neighbor, VectorIndex, VectorIndexBackend,
    HNSW_FEATURE, KD_TREE_FEATURE,
};
pub use brute_force::{BruteForceBackend, BruteForceIndex};
#[cfg(feature = "hnsw")]
pub use hnsw::{HnswBackend, HnswIndex};
#[cfg(feature = "kd-tree")]
pub use kd_tree::{KdTreeBackend, KdTreeIndex};
pub use matrix::VectorMatrix;
