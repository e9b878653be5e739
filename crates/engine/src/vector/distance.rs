//! Shared distance functions for nearest-neighbor ranking.
//!
//! These functions are used by every backend. All values are distances,
//! "lower = nearer":
//! - Euclidean: L2 distance
//! - Cosine: `1 - cos(a, b)`, with zero-norm vectors at cosine 0
//! - DotProduct: `-dot(a, b)`
//!
//! Functions are single-threaded and never normalize their inputs.

use std::cmp::Ordering;

use affine_core::DistanceMetric;

/// Compute the distance between two vectors under a metric
pub fn distance(a: &[f32], b: &[f32], metric: DistanceMetric) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Dimension mismatch in distance computation");

    match metric {
        DistanceMetric::Euclidean => euclidean_distance(a, b),
        DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
        DistanceMetric::DotProduct => -dot_product(a, b),
    }
}

/// Cosine similarity: dot(a,b) / (||a|| * ||b||)
///
/// Range: [-1, 1]. Returns 0.0 if either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Dot product (inner product)
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm (Euclidean length)
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Squared Euclidean distance
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Euclidean distance (L2 distance)
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    squared_euclidean(a, b).sqrt()
}

/// Scale a vector to unit length; zero vectors are returned unchanged
pub fn normalized(v: &[f32]) -> Vec<f32> {
    let norm = l2_norm(v);
    if norm == 0.0 {
        v.to_vec()
    } else {
        v.iter().map(|x| x / norm).collect()
    }
}

/// Order `(distance, row)` pairs nearest first, ties by row ascending
///
/// NaN distances sort after every number.
pub(crate) fn cmp_nearest(a: (f32, usize), b: (f32, usize)) -> Ordering {
    a.0.partial_cmp(&b.0)
        .unwrap_or_else(|| a.0.is_nan().cmp(&b.0.is_nan()))
        .then_with(|| a.1.cmp(&b.1))
}
