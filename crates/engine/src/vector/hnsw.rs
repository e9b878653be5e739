//! HNSW (Hierarchical Navigable Small World) Index Backend
//!
//! Approximate nearest-neighbor search over a layered proximity graph.
//!
//! ## Algorithm
//!
//! HNSW builds a multi-layer graph where:
//! - Layer 0 contains all nodes with up to 2*M connections each
//! - Higher layers contain a subset of nodes with up to M connections each
//! - Search starts from the top layer and greedily descends to layer 0
//! - At each layer, a beam search finds the ef closest neighbors
//!
//! ## Determinism
//!
//! - Fixed RNG seed + monotonic counter for level assignment
//! - Rows are inserted in matrix order
//! - BTreeSet for neighbor lists (sorted)
//! - Tie-breaking: (distance asc, row asc)
//!
//! The graph is built for one query and dropped afterwards. When `k` covers
//! every row the search ranks all rows exhaustively.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap};

use affine_core::{DistanceMetric, StoreResult};

use crate::vector::backend::{HnswConfig, Neighbor, VectorIndex, VectorIndexBackend};
use crate::vector::brute_force::exhaustive_search;
use crate::vector::distance::{cmp_nearest, distance};
use crate::vector::matrix::VectorMatrix;

/// Fixed seed for level assignment
const LEVEL_SEED: u64 = 42;

/// Highest layer a node can be assigned to
const MAX_LEVEL: usize = 16;

/// HNSW backend
#[derive(Debug, Clone, Default)]
pub struct HnswBackend {
    config: HnswConfig,
}

impl HnswBackend {
    /// Create a backend with the given parameters
    pub fn new(config: HnswConfig) -> Self {
        HnswBackend { config }
    }
}

impl VectorIndexBackend for HnswBackend {
    fn name(&self) -> &'static str {
        "hnsw"
    }

    fn build(&self, matrix: VectorMatrix, metric: DistanceMetric) -> StoreResult<Box<dyn VectorIndex>> {
        Ok(Box::new(HnswIndex::build(matrix, metric, self.config.clone())))
    }
}

/// A node in the HNSW graph
#[derive(Debug, Clone)]
struct HnswNode {
    /// Neighbors per layer: neighbors[layer] = set of neighbor rows
    neighbors: Vec<BTreeSet<usize>>,
}

impl HnswNode {
    fn new(max_layer: usize) -> Self {
        HnswNode {
            neighbors: (0..=max_layer).map(|_| BTreeSet::new()).collect(),
        }
    }
}

/// Scored candidate (max-heap pops the nearest, tie-break by row asc)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scored {
    distance: f32,
    row: usize,
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        // Nearer = Greater
        // BinaryHeap<Scored> pops the nearest candidate
        // BinaryHeap<Reverse<Scored>> pops the worst result
        cmp_nearest((other.distance, other.row), (self.distance, self.row))
    }
}

/// Built HNSW graph over a matrix
pub struct HnswIndex {
    config: HnswConfig,
    matrix: VectorMatrix,
    metric: DistanceMetric,
    nodes: Vec<HnswNode>,
    entry_point: Option<usize>,
    max_level: usize,
    rng_counter: u64,
}

impl HnswIndex {
    /// Build the graph by inserting every row in order
    pub fn build(matrix: VectorMatrix, metric: DistanceMetric, config: HnswConfig) -> Self {
        let mut index = HnswIndex {
            config,
            nodes: Vec::with_capacity(matrix.len()),
            matrix,
            metric,
            entry_point: None,
            max_level: 0,
            rng_counter: 0,
        };
        for row in 0..index.matrix.len() {
            index.insert(row);
        }
        index
    }

    // ========================================================================
    // Level Assignment
    // ========================================================================

    /// Assign a level for a new node using a deterministic hash-based PRNG
    fn assign_level(&mut self) -> usize {
        self.rng_counter += 1;
        let hash = splitmix64(LEVEL_SEED.wrapping_add(self.rng_counter));

        // Convert to uniform [0, 1) and apply exponential distribution
        let uniform = (hash as f64) / (u64::MAX as f64);
        let uniform = uniform.max(1e-15);
        let level = -uniform.ln() * self.config.ml();
        if level.is_finite() {
            (level as usize).min(MAX_LEVEL)
        } else {
            MAX_LEVEL
        }
    }

    fn row(&self, row: usize) -> &[f32] {
        self.matrix.row(row).unwrap_or(&[])
    }

    fn dist(&self, query: &[f32], row: usize) -> f32 {
        distance(query, self.row(row), self.metric)
    }

    // ========================================================================
    // Graph Operations
    // ========================================================================

    /// Beam search at a single layer
    ///
    /// Returns up to `ef` nearest rows sorted by (distance asc, row asc).
    fn search_layer(&self, query: &[f32], entry: usize, ef: usize, layer: usize) -> Vec<Scored> {
        let start = Scored {
            distance: self.dist(query, entry),
            row: entry,
        };

        let mut visited = vec![false; self.nodes.len()];
        visited[entry] = true;

        let mut candidates = BinaryHeap::new();
        candidates.push(start);
        let mut results: BinaryHeap<Reverse<Scored>> = BinaryHeap::new();
        results.push(Reverse(start));

        while let Some(nearest) = candidates.pop() {
            // Stop once the nearest candidate is worse than the worst result
            if let Some(Reverse(worst)) = results.peek() {
                if results.len() >= ef && nearest < *worst {
                    break;
                }
            }

            let Some(neighbors) = self.nodes[nearest.row].neighbors.get(layer) else {
                continue;
            };
            for &neighbor in neighbors {
                if visited[neighbor] {
                    continue;
                }
                visited[neighbor] = true;

                let scored = Scored {
                    distance: self.dist(query, neighbor),
                    row: neighbor,
                };
                let improves = match results.peek() {
                    Some(Reverse(worst)) => results.len() < ef || scored > *worst,
                    None => true,
                };
                if improves {
                    candidates.push(scored);
                    results.push(Reverse(scored));
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut found: Vec<Scored> = results.into_iter().map(|r| r.0).collect();
        found.sort_by(|a, b| b.cmp(a));
        found
    }

    /// Greedy descent from `from_layer` down to `to_layer`
    ///
    /// At each layer, moves to the best neighbor until no neighbor improves.
    fn greedy_search_to_layer(&self, query: &[f32], entry: usize, from_layer: usize, to_layer: usize) -> usize {
        let mut current = Scored {
            distance: self.dist(query, entry),
            row: entry,
        };

        for layer in (to_layer..=from_layer).rev() {
            loop {
                let mut best = current;
                if let Some(neighbors) = self.nodes[current.row].neighbors.get(layer) {
                    for &neighbor in neighbors {
                        let scored = Scored {
                            distance: self.dist(query, neighbor),
                            row: neighbor,
                        };
                        if scored > best {
                            best = scored;
                        }
                    }
                }
                if best.row == current.row {
                    break;
                }
                current = best;
            }
        }

        current.row
    }

    /// Keep the nearest `max_connections` neighbors of `row` at `layer`
    fn prune_neighbors_for(&mut self, row: usize, layer: usize, max_connections: usize) {
        let Some(neighbors) = self.nodes[row].neighbors.get(layer) else {
            return;
        };
        let origin = self.row(row);
        let mut scored: Vec<Scored> = neighbors
            .iter()
            .map(|&n| Scored {
                distance: distance(origin, self.row(n), self.metric),
                row: n,
            })
            .collect();
        scored.sort_by(|a, b| b.cmp(a));

        let keep: BTreeSet<usize> = scored.iter().take(max_connections).map(|s| s.row).collect();
        self.nodes[row].neighbors[layer] = keep;
    }

    /// Insert a row into the graph
    fn insert(&mut self, row: usize) {
        let level = self.assign_level();
        self.nodes.push(HnswNode::new(level));

        let Some(entry) = self.entry_point else {
            self.entry_point = Some(row);
            self.max_level = level;
            return;
        };

        let query = self.row(row).to_vec();

        let mut current_entry = entry;
        if self.max_level > level {
            current_entry = self.greedy_search_to_layer(&query, entry, self.max_level, level + 1);
        }

        for layer in (0..=level.min(self.max_level)).rev() {
            let candidates = self.search_layer(&query, current_entry, self.config.ef_construction(), layer);
            let selected: Vec<usize> = candidates
                .iter()
                .filter(|s| s.row != row)
                .take(self.config.m())
                .map(|s| s.row)
                .collect();

            let max_conn = if layer == 0 {
                self.config.max_connections_layer0()
            } else {
                self.config.max_connections()
            };

            for &neighbor in &selected {
                self.nodes[row].neighbors[layer].insert(neighbor);
                let over = match self.nodes[neighbor].neighbors.get_mut(layer) {
                    Some(set) => {
                        set.insert(row);
                        set.len() > max_conn
                    }
                    None => false,
                };
                if over {
                    self.prune_neighbors_for(neighbor, layer, max_conn);
                }
            }

            if let Some(closest) = candidates.first() {
                current_entry = closest.row;
            }
        }

        if level > self.max_level {
            self.entry_point = Some(row);
            self.max_level = level;
        }
    }
}

/// SplitMix64 hash function for deterministic PRNG
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}

impl VectorIndex for HnswIndex {
    fn search(&self, query: &[f32], k: usize) -> StoreResult<Vec<Neighbor>> {
        self.matrix.check_query(query)?;
        let Some(entry) = self.entry_point else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }
        if k >= self.nodes.len() {
            return Ok(exhaustive_search(&self.matrix, k, |row| {
                distance(query, row, self.metric)
            }));
        }

        let mut current = entry;
        if self.max_level > 0 {
            current = self.greedy_search_to_layer(query, entry, self.max_level, 1);
        }

        let ef = self.config.ef_search().max(k);
        Ok(self
            .search_layer(query, current, ef, 0)
            .into_iter()
            .take(k)
            .map(|s| Neighbor {
                index: s.row,
                distance: s.distance,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn dimension(&self) -> usize {
        self.matrix.dimension()
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }
}
