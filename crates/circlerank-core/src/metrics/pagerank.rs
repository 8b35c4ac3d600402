//! Weighted PageRank over the relation graph.
//!
//! # Algorithm
//!
//! Power iteration with weight-proportional redistribution:
//!
//! ```text
//! PR'(v) = (1 - d) / N
//!        + d · Σ_{u → v} PR(u) · w(u→v) / W_out(u)     for u with W_out(u) > 0
//!        + d · Σ_{u : W_out(u) = 0} PR(u) / N          (dangling mass)
//! ```
//!
//! where `d` is the damping factor (default 0.85). Nodes whose outgoing
//! weight is zero (no out-edges, or only zero-weight ones) spread their mass
//! uniformly, so total mass stays 1.
//!
//! Iteration stops when the L1 change between iterates drops below
//! `tolerance`, or after `max_iter` iterations. Every step reads only the
//! previous iterate (two buffers, swapped).
//!
//! # Output
//!
//! A [`PageRankResult`] with one score per node in canonical order and
//! metadata about the run (iterations, convergence, final residual).

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::graph::build::ScoredGraph;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for PageRank computation (`[pagerank]` in config).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRankConfig {
    /// Damping factor (probability of following a link vs teleporting).
    /// Default: 0.85.
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Convergence threshold on the L1 norm of the rank delta.
    /// Default: 1e-9.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Maximum number of iterations.
    /// Default: 200.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
}

const fn default_damping() -> f64 {
    0.85
}

const fn default_tolerance() -> f64 {
    1e-9
}

const fn default_max_iter() -> usize {
    200
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            tolerance: default_tolerance(),
            max_iter: default_max_iter(),
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Result of a PageRank computation.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRankResult {
    /// One score per node, canonical order. Sums to 1 for non-empty graphs.
    pub scores: Vec<f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the L1 delta fell below tolerance within `max_iter`.
    pub converged: bool,
    /// L1 delta of the last iteration (0 when no iteration ran).
    pub residual: f64,
}

impl PageRankResult {
    /// Total mass across all nodes.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.scores.iter().sum()
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute weighted PageRank.
///
/// An edgeless (or all-zero-weight) graph converges immediately to the
/// uniform value `1/N` for every node.
#[must_use]
#[allow(clippy::cast_precision_loss)]
#[instrument(skip(sg, config), fields(nodes = sg.node_count()))]
pub fn pagerank(sg: &ScoredGraph, config: &PageRankConfig) -> PageRankResult {
    let n = sg.node_count();
    if n == 0 {
        return PageRankResult {
            scores: Vec::new(),
            iterations: 0,
            converged: true,
            residual: 0.0,
        };
    }

    let n_f64 = n as f64;
    let base = (1.0 - config.damping) / n_f64;

    // Out-links with their share of the source's out-weight, canonical order.
    let shares: Vec<Vec<(usize, f64)>> = sg
        .node_indices()
        .map(|idx| {
            let links = sg.out_links(idx);
            // Scale by the heaviest link first so huge weights cannot overflow the total.
            let heaviest = links.iter().map(|(_, l)| l.weight).fold(0.0, f64::max);
            if heaviest <= 0.0 {
                return Vec::new();
            }
            let total: f64 = links.iter().map(|(_, l)| l.weight / heaviest).sum();
            links
                .iter()
                .map(|(t, l)| (t.index(), l.weight / heaviest / total))
                .collect()
        })
        .collect();

    let mut ranks = vec![1.0 / n_f64; n];
    let mut new_ranks = vec![0.0_f64; n];
    let mut iterations = 0;
    let mut converged = false;
    let mut residual = 0.0;

    for _ in 0..config.max_iter {
        iterations += 1;

        let dangling: f64 = shares
            .iter()
            .zip(&ranks)
            .filter(|(out, _)| out.is_empty())
            .map(|(_, r)| r)
            .sum();
        let floor = base + config.damping * dangling / n_f64;
        new_ranks.fill(floor);

        for (src, out) in shares.iter().enumerate() {
            let mass = config.damping * ranks[src];
            for &(dst, share) in out {
                new_ranks[dst] += mass * share;
            }
        }

        residual = ranks
            .iter()
            .zip(&new_ranks)
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut ranks, &mut new_ranks);

        if residual < config.tolerance {
            converged = true;
            break;
        }
    }

    if converged {
        debug!(iterations, residual, "pagerank converged");
    } else {
        warn!(
            iterations,
            residual,
            tolerance = config.tolerance,
            "pagerank hit the iteration cap before converging"
        );
    }

    PageRankResult {
        scores: ranks,
        iterations,
        converged,
        residual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build::LoaderConfig;
    use crate::graph::load::GraphDocument;
    use serde_json::json;

    fn build(value: &serde_json::Value) -> ScoredGraph {
        let doc = GraphDocument::from_value(value).expect("valid");
        ScoredGraph::from_document(doc, &LoaderConfig::default()).expect("valid")
    }

    fn assert_approx_eq(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "actual ({actual}) != expected ({expected})"
        );
    }

    #[test]
    fn empty_graph() {
        let result = pagerank(&build(&json!({ "nodes": [] })), &PageRankConfig::default());
        assert!(result.scores.is_empty());
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn single_node_gets_all_mass() {
        let result = pagerank(
            &build(&json!({ "nodes": [{ "id": "solo" }] })),
            &PageRankConfig::default(),
        );
        assert_approx_eq(result.scores[0], 1.0, 1e-12);
        assert!(result.converged);
    }

    #[test]
    fn edgeless_graph_is_uniform() {
        let result = pagerank(
            &build(&json!({ "nodes": [{ "id": "a" }, { "id": "b" }, { "id": "c" }, { "id": "d" }] })),
            &PageRankConfig::default(),
        );
        for score in &result.scores {
            assert_approx_eq(*score, 0.25, 1e-12);
        }
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn heavier_edge_carries_more_rank() {
        let result = pagerank(
            &build(&json!({
                "nodes": [{ "id": "hub" }, { "id": "heavy" }, { "id": "light" }],
                "links": [
                    { "source": "hub", "target": "heavy", "weight": 9 },
                    { "source": "hub", "target": "light", "weight": 1 }
                ]
            })),
            &PageRankConfig::default(),
        );
        // canonical order: heavy, hub, light
        assert!(result.scores[0] > result.scores[2]);
        assert_approx_eq(result.mass(), 1.0, 1e-9);
    }

    #[test]
    fn iteration_cap_reports_non_convergence() {
        let config = PageRankConfig {
            damping: 0.85,
            tolerance: 0.0,
            max_iter: 3,
        };
        let result = pagerank(
            &build(&json!({
                "nodes": [{ "id": "a" }, { "id": "b" }],
                "links": [{ "source": "a", "target": "b" }]
            })),
            &config,
        );
        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
        assert!(result.residual > 0.0);
        assert_approx_eq(result.mass(), 1.0, 1e-12);
    }
}
