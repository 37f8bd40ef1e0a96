//! Prim's minimum spanning tree growth from a seed vertex.
//!
//! The tree is grown one cheapest-reachable vertex at a time. Every absorbed
//! vertex is recorded together with the edge that pulled it in and the running
//! average edge length, which is the curve the inclination analysis works on.
//!
//! Implementation: min-heap of `(weight, from, to)` candidate edges with lazy
//! deletion. A vertex may be queued several times from different sources;
//! stale entries are discarded when popped. The `from` end of each accepted
//! edge is kept as the vertex's parent, so the tree itself can be rebuilt
//! from the trace.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use thiserror::Error;

use super::graph::WeightedGraph;

/// Errors that can occur while growing the tree.
#[derive(Debug, Error)]
pub enum MstError {
    #[error("seed vertex {0} is not in the graph")]
    UnknownSeed(u64),
}

/// One absorbed vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsorptionStep {
    /// Source id of the absorbed vertex
    pub vertex: u64,
    /// Tree vertex the absorbing edge came from (`None` for the seed)
    pub parent: Option<u64>,
    /// Weight of the edge that absorbed it (0 for the seed)
    pub edge_cost: f64,
    /// Total tree weight divided by the number of tree edges so far
    pub average_cost: f64,
}

/// Result of growing the tree from one seed.
#[derive(Debug, Clone, Default)]
pub struct MstGrowth {
    /// Absorption order, starting with the seed
    pub trace: Vec<AbsorptionStep>,
    /// Number of vertices in the whole graph
    pub total_vertices: usize,
    /// First `k` absorbed ids, once a cutoff has been applied
    pub members: Option<Vec<u64>>,
}

impl MstGrowth {
    /// Number of vertices reached from the seed.
    #[inline]
    pub fn coverage(&self) -> usize {
        self.trace.len()
    }

    /// True if the seed's component spans the whole graph.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.coverage() == self.total_vertices
    }

    /// Sum of all absorbed edge weights.
    pub fn total_cost(&self) -> f64 {
        self.trace.iter().map(|s| s.edge_cost).sum()
    }

    /// Running average edge length per step.
    pub fn averages(&self) -> Vec<f64> {
        self.trace.iter().map(|s| s.average_cost).collect()
    }

    /// Ids in absorption order.
    pub fn order(&self) -> Vec<u64> {
        self.trace.iter().map(|s| s.vertex).collect()
    }

    /// First `k` absorbed ids.
    pub fn first_absorbed(&self, k: usize) -> Vec<u64> {
        self.trace.iter().take(k).map(|s| s.vertex).collect()
    }

    /// Record the first `k` absorbed ids as members and return them.
    ///
    /// Growth is unaffected; a later call replaces the earlier cutoff.
    pub fn apply_cutoff(&mut self, k: usize) -> &[u64] {
        let members = self.first_absorbed(k);
        self.members.insert(members)
    }

    /// Tree edges as `(parent, child, weight)` in absorption order.
    pub fn tree_edges(&self) -> impl Iterator<Item = (u64, u64, f64)> + '_ {
        self.trace
            .iter()
            .filter_map(|s| s.parent.map(|p| (p, s.vertex, s.edge_cost)))
    }
}

/// Candidate edge on the heap. Ordered by weight, then by push order.
#[derive(Debug, Clone, Copy)]
struct CandidateEdge {
    weight: f64,
    seq: u64,
    from: usize,
    to: usize,
}

impl PartialEq for CandidateEdge {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CandidateEdge {}

impl PartialOrd for CandidateEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CandidateEdge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Heap of candidate edges keyed by (weight, insertion order).
struct CandidateQueue {
    heap: BinaryHeap<Reverse<CandidateEdge>>,
    next_seq: u64,
}

impl CandidateQueue {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    fn push(&mut self, weight: f64, from: usize, to: usize) {
        self.heap.push(Reverse(CandidateEdge {
            weight,
            seq: self.next_seq,
            from,
            to,
        }));
        self.next_seq += 1;
    }

    fn pop(&mut self) -> Option<CandidateEdge> {
        self.heap.pop().map(|Reverse(edge)| edge)
    }
}

/// Grow a minimum spanning tree from `seed` with Prim's algorithm.
///
/// The trace covers only the seed's connected component; compare
/// [`MstGrowth::is_complete`] when full coverage matters. With
/// `member_cutoff = Some(k)` the first `k` absorbed ids (seed included) are
/// also returned, as [`MstGrowth::apply_cutoff`] would. The cutoff does not
/// affect growth.
///
/// Equal weights are resolved by insertion order, so runs are reproducible.
///
/// # Errors
///
/// Returns [`MstError::UnknownSeed`] if `seed` is not a vertex of `graph`.
pub fn grow_mst(
    graph: &WeightedGraph,
    seed: u64,
    member_cutoff: Option<usize>,
) -> Result<MstGrowth, MstError> {
    let start = graph.index_of(seed).ok_or(MstError::UnknownSeed(seed))?;
    let n = graph.len();

    let mut visited = vec![false; n];
    visited[start] = true;

    let mut queue = CandidateQueue::new();
    for (to, w) in graph.neighbors(start) {
        queue.push(w, start, to);
    }

    let mut trace = Vec::with_capacity(n);
    trace.push(AbsorptionStep {
        vertex: seed,
        parent: None,
        edge_cost: 0.0,
        average_cost: 0.0,
    });

    let mut total_cost = 0.0;
    let mut edge_count = 0usize;

    while let Some(edge) = queue.pop() {
        if visited[edge.to] {
            continue;
        }
        visited[edge.to] = true;
        total_cost += edge.weight;
        edge_count += 1;

        trace.push(AbsorptionStep {
            vertex: graph.id_at(edge.to),
            parent: Some(graph.id_at(edge.from)),
            edge_cost: edge.weight,
            average_cost: total_cost / edge_count as f64,
        });

        for (next, w) in graph.neighbors(edge.to) {
            if !visited[next] {
                queue.push(w, edge.to, next);
            }
        }
    }

    if trace.len() < n {
        log::warn!(
            "MST from {} reached {} of {} vertices (disconnected graph)",
            seed,
            trace.len(),
            n
        );
    }

    let mut growth = MstGrowth {
        trace,
        total_vertices: n,
        members: None,
    };
    if let Some(k) = member_cutoff {
        growth.apply_cutoff(k);
    }
    Ok(growth)
}
