//! KD-Tree Vector Search Backend
//!
//! Exact nearest-neighbor search over an axis-aligned space partition.
//! Built once per query over the filtered candidates; the tree lives in a
//! flat arena of nodes.
//!
//! ## Metrics
//!
//! - Euclidean: the tree partitions the rows as given
//! - Cosine: the tree partitions unit-normalized rows; zero-norm rows sit
//!   outside the tree at cosine distance 1
//! - DotProduct: not a metric space, rejected at build time
//!
//! Reported distances are always computed on the original rows, so results
//! agree with the brute-force backend.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use affine_core::{DistanceMetric, StoreError, StoreResult};

use crate::vector::backend::{KdTreeConfig, Neighbor, VectorIndex, VectorIndexBackend};
use crate::vector::distance::{cmp_nearest, distance, l2_norm, normalized};
use crate::vector::matrix::VectorMatrix;

/// Slack on the cosine pruning bound (covers rounding in normalization)
const COSINE_BOUND_SLACK: f32 = 1e-5;

/// KD-tree backend
#[derive(Debug, Clone, Copy, Default)]
pub struct KdTreeBackend {
    config: KdTreeConfig,
}

impl KdTreeBackend {
    /// Create a backend with the given leaf size
    pub fn new(config: KdTreeConfig) -> Self {
        KdTreeBackend {
            config: KdTreeConfig {
                leaf_size: config.leaf_size.max(1),
            },
        }
    }
}

impl VectorIndexBackend for KdTreeBackend {
    fn name(&self) -> &'static str {
        "kd_tree"
    }

    fn build(&self, matrix: VectorMatrix, metric: DistanceMetric) -> StoreResult<Box<dyn VectorIndex>> {
        Ok(Box::new(KdTreeIndex::build(matrix, metric, self.config)?))
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        rows: Vec<usize>,
    },
    Split {
        axis: usize,
        value: f32,
        left: usize,
        right: usize,
    },
}

/// Built KD-tree
#[derive(Debug)]
pub struct KdTreeIndex {
    /// Original rows (exact distances)
    rows: VectorMatrix,
    /// Partitioned coordinates: the rows, or their normalized form for Cosine
    points: VectorMatrix,
    metric: DistanceMetric,
    nodes: Vec<Node>,
    root: Option<usize>,
    /// Zero-norm rows kept out of a Cosine tree
    zero_rows: Vec<usize>,
}

impl KdTreeIndex {
    /// Build the tree
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for DotProduct.
    pub fn build(rows: VectorMatrix, metric: DistanceMetric, config: KdTreeConfig) -> StoreResult<Self> {
        let mut zero_rows = Vec::new();
        let mut indexed = Vec::with_capacity(rows.len());
        let points = match metric {
            DistanceMetric::Euclidean => {
                indexed.extend(0..rows.len());
                rows.clone()
            }
            DistanceMetric::Cosine => {
                let mut points = VectorMatrix::with_capacity(rows.dimension(), rows.len());
                for (i, row) in rows.rows().enumerate() {
                    if l2_norm(row) == 0.0 {
                        zero_rows.push(i);
                    } else {
                        indexed.push(i);
                    }
                    points.push(&normalized(row))?;
                }
                points
            }
            DistanceMetric::DotProduct => {
                return Err(StoreError::unsupported(
                    "kd_tree backend cannot rank by dot_product",
                ))
            }
        };

        let mut index = KdTreeIndex {
            rows,
            points,
            metric,
            nodes: Vec::new(),
            root: None,
            zero_rows,
        };
        if !indexed.is_empty() {
            index.root = Some(index.build_node(indexed, config.leaf_size.max(1)));
        }
        Ok(index)
    }

    fn coord(&self, row: usize, axis: usize) -> f32 {
        self.points.as_slice()[row * self.points.dimension() + axis]
    }

    /// Axis with the widest spread, and that spread
    fn widest_axis(&self, rows: &[usize]) -> (usize, f32) {
        let mut best = (0, 0.0f32);
        for axis in 0..self.points.dimension() {
            let (min, max) = rows.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &r| {
                let c = self.coord(r, axis);
                (lo.min(c), hi.max(c))
            });
            let spread = max - min;
            if spread > best.1 {
                best = (axis, spread);
            }
        }
        best
    }

    fn build_node(&mut self, mut rows: Vec<usize>, leaf_size: usize) -> usize {
        let (axis, spread) = self.widest_axis(&rows);
        if rows.len() <= leaf_size || spread <= 0.0 || spread.is_nan() {
            rows.sort_unstable();
            self.nodes.push(Node::Leaf { rows });
            return self.nodes.len() - 1;
        }

        let mid = rows.len() / 2;
        rows.select_nth_unstable_by(mid, |&a, &b| {
            self.coord(a, axis)
                .partial_cmp(&self.coord(b, axis))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.cmp(&b))
        });
        let value = self.coord(rows[mid], axis);
        let right_rows = rows.split_off(mid);

        let left = self.build_node(rows, leaf_size);
        let right = self.build_node(right_rows, leaf_size);
        self.nodes.push(Node::Split {
            axis,
            value,
            left,
            right,
        });
        self.nodes.len() - 1
    }

    /// Lower bound on the distance of any row beyond a splitting plane
    fn plane_bound(&self, diff: f32) -> f32 {
        match self.metric {
            // On unit vectors: 1 - cos = |a - b|^2 / 2
            DistanceMetric::Cosine => diff * diff / 2.0 - COSINE_BOUND_SLACK,
            _ => diff.abs(),
        }
    }

    fn search_node(&self, node: usize, query: &[f32], point: &[f32], k: usize, best: &mut BinaryHeap<Candidate>) {
        match &self.nodes[node] {
            Node::Leaf { rows } => {
                for &row in rows {
                    let Some(values) = self.rows.row(row) else {
                        continue;
                    };
                    offer(best, k, Candidate(distance(query, values, self.metric), row));
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = point[*axis] - value;
                let (near, far) = if diff < 0.0 {
                    (*left, *right)
                } else {
                    (*right, *left)
                };
                self.search_node(near, query, point, k, best);

                let must_visit = match best.peek() {
                    Some(worst) if best.len() >= k => self.plane_bound(diff) <= worst.0 || worst.0.is_nan(),
                    _ => true,
                };
                if must_visit {
                    self.search_node(far, query, point, k, best);
                }
            }
        }
    }
}

impl VectorIndex for KdTreeIndex {
    fn search(&self, query: &[f32], k: usize) -> StoreResult<Vec<Neighbor>> {
        self.rows.check_query(query)?;
        if k == 0 || self.rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut best = BinaryHeap::with_capacity(k + 1);
        match self.metric {
            DistanceMetric::Cosine if l2_norm(query) == 0.0 => {
                // Every row is at cosine distance 1 from a zero query
                for row in 0..self.rows.len().min(k) {
                    offer(&mut best, k, Candidate(1.0, row));
                }
            }
            DistanceMetric::Cosine => {
                let point = normalized(query);
                if let Some(root) = self.root {
                    self.search_node(root, query, &point, k, &mut best);
                }
                for &row in self.zero_rows.iter().take(k) {
                    offer(&mut best, k, Candidate(1.0, row));
                }
            }
            _ => {
                if let Some(root) = self.root {
                    self.search_node(root, query, query, k, &mut best);
                }
            }
        }

        let mut found: Vec<Candidate> = best.into_vec();
        found.sort();
        Ok(found
            .into_iter()
            .map(|Candidate(distance, index)| Neighbor { index, distance })
            .collect())
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn dimension(&self) -> usize {
        self.rows.dimension()
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }
}

/// `(distance, row)` ordered nearest first; a max-heap keeps the worst on top
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate(f32, usize);

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_nearest((self.0, self.1), (other.0, other.1))
    }
}

/// Keep the `k` nearest candidates seen so far
fn offer(best: &mut BinaryHeap<Candidate>, k: usize, candidate: Candidate) {
    if best.len() < k {
        best.push(candidate);
    } else if best.peek().is_some_and(|worst| candidate < *worst) {
        best.pop();
        best.push(candidate);
    }
}
