//! Identity and metric types
//!
//! - RecordId: per-collection record identity
//! - DistanceMetric: similarity metric declared by vector fields

use serde::{Deserialize, Serialize};
use std::fmt;

/// Record identifier (stable within a collection)
///
/// Ids start at 1 and are assigned in strictly increasing order.
/// They are never reused, even after the record is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Create a new RecordId
    pub fn new(id: u64) -> Self {
        RecordId(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        RecordId(id)
    }
}

/// Distance metric for nearest-neighbor ranking
///
/// Backends rank by distance, lower = nearer:
/// - Euclidean: L2 distance
/// - Cosine: `1 - cos(a, b)`
/// - DotProduct: `-dot(a, b)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Straight-line distance
    #[default]
    Euclidean,

    /// Angle between vectors; magnitude is ignored
    Cosine,

    /// Inner product; assumes vectors are pre-normalized
    DotProduct,
}

impl DistanceMetric {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::DotProduct => "dot_product",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "euclidean" | "l2" => Some(DistanceMetric::Euclidean),
            "cosine" => Some(DistanceMetric::Cosine),
            "dot_product" | "dot" | "inner_product" => Some(DistanceMetric::DotProduct),
            _ => None,
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
