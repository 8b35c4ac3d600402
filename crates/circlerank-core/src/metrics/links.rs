//! Per-link features.
//!
//! ```text
//! structural          = 0.5·reciprocal + 0.25·J(out(s), out(t)) + 0.25·J(in(s), in(t))
//! semantic_similarity = supplied value, else J(tokens(s), tokens(t))
//! ```
//!
//! `J` is the Jaccard index. Both features lie in `[0, 1]`.

use std::collections::BTreeSet;

use petgraph::{Direction, graph::NodeIndex, visit::EdgeRef};
use serde::Serialize;

use crate::graph::build::ScoredGraph;
use crate::metrics::semantic::jaccard;

const RECIPROCAL_SHARE: f64 = 0.5;
const OUT_OVERLAP_SHARE: f64 = 0.25;
const IN_OVERLAP_SHARE: f64 = 0.25;

/// Features of one aggregated link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkFeatures {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub multiplicity: usize,
    pub reciprocal: bool,
    pub structural: f64,
    pub semantic_similarity: f64,
}

/// Compute [`LinkFeatures`] for every link in canonical order.
///
/// `tokens` holds one token set per node, in canonical order.
#[must_use]
pub fn link_features(sg: &ScoredGraph, tokens: &[BTreeSet<String>]) -> Vec<LinkFeatures> {
    let g = &sg.graph;
    let neighbors = |idx: NodeIndex, dir| -> BTreeSet<NodeIndex> {
        g.neighbors_directed(idx, dir).collect()
    };

    g.edge_references()
        .map(|edge| {
            let (s, t) = (edge.source(), edge.target());
            let link = edge.weight();
            let reciprocal = g.contains_edge(t, s);

            let out_overlap = jaccard(
                &neighbors(s, Direction::Outgoing),
                &neighbors(t, Direction::Outgoing),
            );
            let in_overlap = jaccard(
                &neighbors(s, Direction::Incoming),
                &neighbors(t, Direction::Incoming),
            );
            let structural = RECIPROCAL_SHARE * f64::from(u8::from(reciprocal))
                + OUT_OVERLAP_SHARE * out_overlap
                + IN_OVERLAP_SHARE * in_overlap;

            let semantic_similarity = link
                .semantic_similarity
                .unwrap_or_else(|| jaccard(&tokens[s.index()], &tokens[t.index()]));

            LinkFeatures {
                source: g[s].id.clone(),
                target: g[t].id.clone(),
                weight: link.weight,
                multiplicity: link.multiplicity,
                reciprocal,
                structural: structural.clamp(0.0, 1.0),
                semantic_similarity: semantic_similarity.clamp(0.0, 1.0),
            }
        })
        .collect()
}
