//! Brute-Force Vector Search Backend
//!
//! Exact O(n) search: compute the distance to every row, keep the `k`
//! nearest with a partial sort, then order them.

use affine_core::{DistanceMetric, StoreResult};

use crate::vector::backend::{Neighbor, VectorIndex, VectorIndexBackend};
use crate::vector::distance::{cmp_nearest, distance};
use crate::vector::matrix::VectorMatrix;

/// Brute-force vector search backend
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceBackend;

impl VectorIndexBackend for BruteForceBackend {
    fn name(&self) -> &'static str {
        "brute_force"
    }

    fn build(&self, matrix: VectorMatrix, metric: DistanceMetric) -> StoreResult<Box<dyn VectorIndex>> {
        Ok(Box::new(BruteForceIndex { matrix, metric }))
    }
}

/// Index that scans every row
pub struct BruteForceIndex {
    matrix: VectorMatrix,
    metric: DistanceMetric,
}

impl BruteForceIndex {
    /// Wrap a matrix
    pub fn new(matrix: VectorMatrix, metric: DistanceMetric) -> Self {
        BruteForceIndex { matrix, metric }
    }
}

impl VectorIndex for BruteForceIndex {
    fn search(&self, query: &[f32], k: usize) -> StoreResult<Vec<Neighbor>> {
        self.matrix.check_query(query)?;
        Ok(exhaustive_search(&self.matrix, k, |row| {
            distance(query, row, self.metric)
        }))
    }

    fn len(&self) -> usize {
        self.matrix.len()
    }

    fn dimension(&self) -> usize {
        self.matrix.dimension()
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }
}

/// Rank every row with `score` and keep the `k` nearest
///
/// Order is (distance asc, row asc) so equal distances keep matrix order.
pub(crate) fn exhaustive_search<F>(matrix: &VectorMatrix, k: usize, score: F) -> Vec<Neighbor>
where
    F: Fn(&[f32]) -> f32,
{
    if k == 0 || matrix.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f32, usize)> = matrix
        .rows()
        .enumerate()
        .map(|(index, row)| (score(row), index))
        .collect();

    if k < scored.len() {
        scored.select_nth_unstable_by(k - 1, |a, b| cmp_nearest(*a, *b));
        scored.truncate(k);
    }
    scored.sort_by(|a, b| cmp_nearest(*a, *b));

    scored
        .into_iter()
        .map(|(distance, index)| Neighbor { index, distance })
        .collect()
}
