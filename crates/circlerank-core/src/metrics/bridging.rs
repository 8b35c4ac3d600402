//! Neighbour-overlap bridging indicator.
//!
//! # Overview
//!
//! A node bridges two of its neighbours when those neighbours share no edge
//! in either direction. Two neighbours are in the same *cluster* when they
//! are connected through edges among the node's neighbours only.
//!
//! ```text
//!     a ─ b          v's neighbours: a, b, c, d
//!      \ /           unlinked pairs: (a,c) (a,d) (b,c) (b,d) (c,d) = 5
//!       v            clusters:       {a,b} {c} {d}               = 3
//!      / \
//!     c   d
//! ```
//!
//! The score is the unlinked-pair count: a node joining many mutually
//! unconnected neighbours scores higher. Edge direction and weight are
//! ignored; a zero-weight edge still links its endpoints.

use petgraph::{graph::NodeIndex, unionfind::UnionFind};

use crate::graph::build::ScoredGraph;

/// Bridging result for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bridging {
    /// Unordered pairs of distinct neighbours with no edge between them.
    pub unlinked_pairs: usize,
    /// Connected groups among the neighbours (0 for an isolated node).
    pub neighbor_clusters: usize,
}

impl Bridging {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn unlinked_pairs_f64(&self) -> f64 {
        self.unlinked_pairs as f64
    }
}

/// Compute [`Bridging`] for every node, in canonical order.
#[must_use]
pub fn bridging(sg: &ScoredGraph) -> Vec<Bridging> {
    let g = &sg.graph;
    sg.node_indices()
        .map(|idx| {
            let neighbors: Vec<NodeIndex> = sg.undirected_neighbors(idx).into_iter().collect();
            let k = neighbors.len();
            let mut clusters = UnionFind::<usize>::new(k);
            let mut unlinked_pairs = 0;

            for i in 0..k {
                for j in (i + 1)..k {
                    let (a, b) = (neighbors[i], neighbors[j]);
                    if g.contains_edge(a, b) || g.contains_edge(b, a) {
                        clusters.union(i, j);
                    } else {
                        unlinked_pairs += 1;
                    }
                }
            }

            let mut roots: Vec<usize> = (0..k).map(|i| clusters.find(i)).collect();
            roots.sort_unstable();
            roots.dedup();

            Bridging {
                unlinked_pairs,
                neighbor_clusters: roots.len(),
            }
        })
        .collect()
}
