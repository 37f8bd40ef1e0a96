//! Complete weighted graph over proper-motion space.
//!
//! Vertices are catalog sources, edge weights are Euclidean distances between
//! `(pmra, pmdec)` pairs. The graph is stored as a dense `n x n` matrix behind
//! a stable id -> index table.
//!
//! # Scaling
//!
//! Construction is O(n^2) in both time and memory and dominates the cost of a
//! pipeline run. A nearest-neighbor structure (KD-tree) could restrict the
//! candidate edges Prim's algorithm needs to consider, but is not required for
//! correctness. Rows are filled in parallel with rayon.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::core::loaders::PointSet;

/// Dense symmetric weight matrix. Absent edges are stored as `+inf`.
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    ids: Vec<u64>,
    index: HashMap<u64, usize>,
    weights: Vec<f64>,
}

impl WeightedGraph {
    /// Build a graph over `ids`, asking `weight` for each unordered pair
    /// `(i, j)` with `i < j`. `None` leaves the pair unconnected.
    pub fn from_weights<F>(ids: Vec<u64>, weight: F) -> Self
    where
        F: Fn(usize, usize) -> Option<f64> + Sync,
    {
        let n = ids.len();
        let index = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let mut weights = vec![f64::INFINITY; n * n];

        if n > 0 {
            weights.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
                for (j, cell) in row.iter_mut().enumerate() {
                    if i == j {
                        continue;
                    }
                    // Always evaluate in (low, high) order so both halves agree bit for bit
                    let (a, b) = if i < j { (i, j) } else { (j, i) };
                    if let Some(w) = weight(a, b) {
                        *cell = w;
                    }
                }
            });
        }

        Self {
            ids,
            index,
            weights,
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Vertex ids in index order.
    #[inline]
    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Vertex id at `idx`.
    #[inline]
    pub fn id_at(&self, idx: usize) -> u64 {
        self.ids[idx]
    }

    /// Index of the vertex with the given id.
    #[inline]
    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Weight of the edge between two vertex indices. Self-edges do not exist.
    #[inline]
    pub fn weight(&self, a: usize, b: usize) -> Option<f64> {
        if a == b {
            return None;
        }
        let w = self.weights[a * self.len() + b];
        w.is_finite().then_some(w)
    }

    /// Weight of the edge between two vertex ids.
    pub fn weight_by_id(&self, a: u64, b: u64) -> Option<f64> {
        self.weight(self.index_of(a)?, self.index_of(b)?)
    }

    /// Neighbors of `idx` with their edge weights, in index order.
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let n = self.len();
        self.weights[idx * n..(idx + 1) * n]
            .iter()
            .enumerate()
            .filter(move |&(j, w)| j != idx && w.is_finite())
            .map(|(j, &w)| (j, w))
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        let n = self.len();
        (0..n)
            .map(|i| self.neighbors(i).filter(|&(j, _)| j > i).count())
            .sum()
    }
}

/// Build the complete proper-motion graph over `points`.
///
/// Produces `C(n, 2)` edges weighted by `sqrt(dpmra^2 + dpmdec^2)`. An empty
/// set yields an empty graph.
pub fn build_pm_graph(points: &PointSet) -> WeightedGraph {
    let coords = points.pm_coords();
    let ids = points.ids();

    let graph = WeightedGraph::from_weights(ids, |i, j| {
        let dx = coords[i][0] - coords[j][0];
        let dy = coords[i][1] - coords[j][1];
        Some((dx * dx + dy * dy).sqrt())
    });

    log::debug!(
        "proper-motion graph: {} vertices, {} weights",
        graph.len(),
        graph.len() * graph.len().saturating_sub(1) / 2
    );

    graph
}
