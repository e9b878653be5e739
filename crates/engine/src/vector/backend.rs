//! Vector Index Backend trait
//!
//! Defines the interface for swappable nearest-neighbor implementations.
//! A backend builds a one-shot [`VectorIndex`] over a [`VectorMatrix`];
//! the engine builds a fresh index for every similarity query, over exactly
//! the candidates that survived filtering.
//!
//! - BruteForceBackend: exact, always available
//! - KdTreeBackend: exact, behind the `kd-tree` feature
//! - HnswBackend: approximate, behind the `hnsw` feature

use affine_core::{DistanceMetric, StoreResult};

use crate::vector::brute_force::BruteForceBackend;
use crate::vector::matrix::VectorMatrix;

#[cfg(feature = "hnsw")]
use crate::vector::hnsw::HnswBackend;
#[cfg(feature = "kd-tree")]
use crate::vector::kd_tree::KdTreeBackend;

/// Cargo feature providing the KD-tree backend
pub const KD_TREE_FEATURE: &str = "kd-tree";

/// Cargo feature providing the HNSW backend
pub const HNSW_FEATURE: &str = "hnsw";

/// A neighbor returned by a search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row index into the matrix the index was built over
    pub index: usize,
    /// Distance to the query (lower = nearer)
    pub distance: f32,
}

/// Trait for swappable nearest-neighbor implementations
pub trait VectorIndexBackend: Send + Sync {
    /// Backend name for logs and errors
    fn name(&self) -> &'static str;

    /// Build a one-shot index over `matrix`
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if the backend cannot rank by `metric`.
    fn build(&self, matrix: VectorMatrix, metric: DistanceMetric) -> StoreResult<Box<dyn VectorIndex>>;
}

/// A built index
pub trait VectorIndex: Send + Sync {
    /// Search for the `k` nearest rows
    ///
    /// Results are sorted by (distance asc, row asc). `k = 0` or an empty
    /// index yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns `Schema` if the query length differs from the index dimension.
    fn search(&self, query: &[f32], k: usize) -> StoreResult<Vec<Neighbor>>;

    /// Number of indexed rows
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension
    fn dimension(&self) -> usize;

    /// Distance metric
    fn metric(&self) -> DistanceMetric;
}

/// KD-tree parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdTreeConfig {
    /// Max rows per leaf (default: 16)
    pub leaf_size: usize,
}

impl Default for KdTreeConfig {
    fn default() -> Self {
        KdTreeConfig { leaf_size: 16 }
    }
}

/// HNSW configuration parameters
///
/// Built only through [`HnswConfig::new`], which clamps `m >= 2` so the level
/// multiplier stays finite.
#[derive(Debug, Clone, PartialEq)]
pub struct HnswConfig {
    m: usize,
    ef_construction: usize,
    ef_search: usize,
    ml: f64,
}

impl Default for HnswConfig {
    fn default() -> Self {
        HnswConfig::new(16, 200, 50)
    }
}

impl HnswConfig {
    /// Create a config, deriving the level multiplier from `m`
    pub fn new(m: usize, ef_construction: usize, ef_search: usize) -> Self {
        let m = m.max(2);
        HnswConfig {
            m,
            ef_construction: ef_construction.max(1),
            ef_search: ef_search.max(1),
            ml: 1.0 / (m as f64).ln(),
        }
    }

    /// Max connections per layer (default: 16)
    pub fn m(&self) -> usize {
        self.m
    }

    /// Build-time beam width (default: 200)
    pub fn ef_construction(&self) -> usize {
        self.ef_construction
    }

    /// Search-time beam width (default: 50)
    pub fn ef_search(&self) -> usize {
        self.ef_search
    }

    /// Level multiplier: 1/ln(m)
    pub fn ml(&self) -> f64 {
        self.ml
    }

    /// Max connections for layer 0 (2*M)
    pub(crate) fn max_connections_layer0(&self) -> usize {
        self.m * 2
    }

    /// Max connections for layers > 0
    pub(crate) fn max_connections(&self) -> usize {
        self.m
    }
}

/// Factory for creating index backends
///
/// Optional backends are checked when the backend is created, so a missing
/// feature surfaces as `MissingDependency` before any query runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum IndexBackendFactory {
    /// Exact O(n) scan
    #[default]
    BruteForce,
    /// Exact KD-tree search
    KdTree(KdTreeConfig),
    /// Approximate HNSW graph search
    Hnsw(HnswConfig),
}

impl IndexBackendFactory {
    /// Backend name
    pub fn name(&self) -> &'static str {
        match self {
            IndexBackendFactory::BruteForce => "brute_force",
            IndexBackendFactory::KdTree(_) => "kd_tree",
            IndexBackendFactory::Hnsw(_) => "hnsw",
        }
    }

    /// Check whether the backend was compiled in
    pub fn is_available(&self) -> bool {
        match self {
            IndexBackendFactory::BruteForce => true,
            IndexBackendFactory::KdTree(_) => cfg!(feature = "kd-tree"),
            IndexBackendFactory::Hnsw(_) => cfg!(feature = "hnsw"),
        }
    }

    /// Create a backend instance
    ///
    /// # Errors
    ///
    /// Returns `MissingDependency` if the backend's feature is disabled.
    pub fn create(&self) -> StoreResult<Box<dyn VectorIndexBackend>> {
        match self {
            IndexBackendFactory::BruteForce => Ok(Box::new(BruteForceBackend)),
            IndexBackendFactory::KdTree(config) => create_kd_tree(*config),
            IndexBackendFactory::Hnsw(config) => create_hnsw(config.clone()),
        }
    }
}

#[cfg(feature = "kd-tree")]
fn create_kd_tree(config: KdTreeConfig) -> StoreResult<Box<dyn VectorIndexBackend>> {
    Ok(Box::new(KdTreeBackend::new(config)))
}

#[cfg(not(feature = "kd-tree"))]
fn create_kd_tree(_config: KdTreeConfig) -> StoreResult<Box<dyn VectorIndexBackend>> {
    Err(affine_core::StoreError::missing_dependency("kd_tree", KD_TREE_FEATURE))
}

#[cfg(feature = "hnsw")]
fn create_hnsw(config: HnswConfig) -> StoreResult<Box<dyn VectorIndexBackend>> {
    Ok(Box::new(HnswBackend::new(config)))
}

#[cfg(not(feature = "hnsw"))]
fn create_hnsw(_config: HnswConfig) -> StoreResult<Box<dyn VectorIndexBackend>> {
    Err(affine_core::StoreError::missing_dependency("hnsw", HNSW_FEATURE))
}
