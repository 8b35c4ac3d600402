//! Weight-based degree metrics and reciprocity.
//!
//! Every function returns one value per node in canonical order.

use petgraph::Direction;

use crate::graph::build::{ScoredGraph, saturating_sum};

// ---------------------------------------------------------------------------
// Weighted degree
// ---------------------------------------------------------------------------

/// Sum of aggregated edge weights incident to each node, both directions.
#[must_use]
pub fn weighted_degree(sg: &ScoredGraph) -> Vec<f64> {
    sg.node_indices()
        .map(|idx| {
            let out = saturating_sum(sg.out_links(idx).iter().map(|(_, l)| l.weight));
            let inc = saturating_sum(sg.in_links(idx).iter().map(|(_, l)| l.weight));
            saturating_sum([out, inc])
        })
        .collect()
}

/// `weighted_degree / (N - 1)`, or 0 for every node when `N <= 1`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn degree_centrality(weighted_degree: &[f64]) -> Vec<f64> {
    let n = weighted_degree.len();
    if n <= 1 {
        return vec![0.0; n];
    }
    let denom = (n - 1) as f64;
    weighted_degree.iter().map(|wd| wd / denom).collect()
}

// ---------------------------------------------------------------------------
// Reciprocity
// ---------------------------------------------------------------------------

/// Weighted share of each node's outgoing relation strength that is
/// returned: `Σ_t min(w(v→t), w(t→v)) / Σ_t w(v→t)`.
///
/// Zero when the node has no outgoing weight. With uniform weights this is
/// the fraction of out-neighbours that link back.
#[must_use]
pub fn reciprocity(sg: &ScoredGraph) -> Vec<f64> {
    sg.node_indices()
        .map(|idx| {
            let links = sg.out_links(idx);
            let out_total = saturating_sum(links.iter().map(|(_, l)| l.weight));
            let returned = saturating_sum(links.iter().map(|&(target, l)| {
                sg.link_weight(target, idx).map_or(0.0, |back| l.weight.min(back))
            }));
            if out_total > 0.0 {
                (returned / out_total).clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Cross-follow
// ---------------------------------------------------------------------------

/// Mutual-relation counts for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CrossFollow {
    /// Out-neighbours that link back.
    pub count: usize,
    /// Incident edges belonging to a reciprocal pair over all incident edges.
    pub ratio: f64,
}

/// Derived cross-follow counts and ratios (ignores any supplied ratio).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cross_follow(sg: &ScoredGraph) -> Vec<CrossFollow> {
    let g = &sg.graph;
    sg.node_indices()
        .map(|idx| {
            let count = g
                .neighbors_directed(idx, Direction::Outgoing)
                .filter(|&t| g.contains_edge(t, idx))
                .count();
            let incident = g.neighbors_directed(idx, Direction::Outgoing).count()
                + g.neighbors_directed(idx, Direction::Incoming).count();
            // Each mutual neighbour contributes two reciprocal incident edges.
            let ratio = if incident == 0 {
                0.0
            } else {
                (2 * count) as f64 / incident as f64
            };
            CrossFollow { count, ratio }
        })
        .collect()
}
