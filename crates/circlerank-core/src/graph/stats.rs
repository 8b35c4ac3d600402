//! Basic statistics for a loaded relation graph.
//!
//! # Statistics Provided
//!
//! - **node_count** / **edge_count**: nodes and aggregated edges.
//! - **density**: `edge_count / (node_count * (node_count - 1))`; zero for
//!   graphs with 0 or 1 node.
//! - **reciprocal_pair_count**: unordered pairs linked in both directions.
//! - **weakly_connected_component_count**: disjoint subgraphs when edge
//!   direction is ignored.
//! - **isolated_node_count**: nodes with no incident edge.
//! - **max_in_degree** / **max_out_degree**: unweighted degree extremes.
//! - **total_weight**: sum of aggregated edge weights. A graph whose edges
//!   all weigh zero is structurally present but carries no mass.

use petgraph::{Direction, algo::connected_components};
use serde::Serialize;

use crate::graph::build::ScoredGraph;

/// Summary statistics for a [`ScoredGraph`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Ranges from 0.0 (no edges) to 1.0 (all ordered pairs linked).
    pub density: f64,
    pub reciprocal_pair_count: usize,
    pub weakly_connected_component_count: usize,
    pub isolated_node_count: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
    pub total_weight: f64,
}

impl GraphStats {
    /// Compute statistics from a [`ScoredGraph`].
    #[must_use]
    pub fn from_graph(sg: &ScoredGraph) -> Self {
        let g = &sg.graph;
        let node_count = g.node_count();
        let edge_count = g.edge_count();

        let degree = |idx, dir| g.neighbors_directed(idx, dir).count();

        let isolated_node_count = g
            .node_indices()
            .filter(|&idx| {
                degree(idx, Direction::Incoming) == 0 && degree(idx, Direction::Outgoing) == 0
            })
            .count();
        let max_in_degree = g
            .node_indices()
            .map(|idx| degree(idx, Direction::Incoming))
            .max()
            .unwrap_or(0);
        let max_out_degree = g
            .node_indices()
            .map(|idx| degree(idx, Direction::Outgoing))
            .max()
            .unwrap_or(0);

        // Each reciprocal pair is seen once from its lower-index endpoint.
        let reciprocal_pair_count = g
            .node_indices()
            .flat_map(|s| g.neighbors_directed(s, Direction::Outgoing).map(move |t| (s, t)))
            .filter(|&(s, t)| s < t && g.find_edge(t, s).is_some())
            .count();

        Self {
            node_count,
            edge_count,
            density: compute_density(node_count, edge_count),
            reciprocal_pair_count,
            weakly_connected_component_count: connected_components(g),
            isolated_node_count,
            max_in_degree,
            max_out_degree,
            total_weight: sg.total_weight(),
        }
    }

    /// `true` when no edge carries positive weight, including a graph with
    /// no edges at all.
    #[must_use]
    pub fn is_weightless(&self) -> bool {
        self.total_weight <= 0.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0;
    }
    let max_edges = node_count * (node_count - 1);
    edge_count as f64 / max_edges as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build::LoaderConfig;
    use crate::graph::load::GraphDocument;
    use serde_json::json;

    fn stats(value: &serde_json::Value) -> GraphStats {
        let doc = GraphDocument::from_value(value).expect("valid document");
        let sg = ScoredGraph::from_document(doc, &LoaderConfig::default()).expect("valid graph");
        GraphStats::from_graph(&sg)
    }

    #[test]
    fn empty_graph_has_zero_density() {
        let s = stats(&json!({ "nodes": [] }));
        assert_eq!(s.node_count, 0);
        assert!(s.density.abs() < f64::EPSILON);
        assert_eq!(s.weakly_connected_component_count, 0);
    }

    #[test]
    fn abc_scenario_counts() {
        let s = stats(&json!({
            "nodes": [{ "id": "A" }, { "id": "B" }, { "id": "C" }, { "id": "D" }],
            "links": [
                { "source": "A", "target": "B", "weight": 2 },
                { "source": "B", "target": "A", "weight": 1 },
                { "source": "B", "target": "C", "weight": 1 }
            ]
        }));
        assert_eq!(s.edge_count, 3);
        assert_eq!(s.reciprocal_pair_count, 1);
        assert_eq!(s.isolated_node_count, 1);
        assert_eq!(s.weakly_connected_component_count, 2);
        assert_eq!(s.max_out_degree, 2);
        assert_eq!(s.max_in_degree, 1);
        assert!((s.total_weight - 4.0).abs() < 1e-12);
        assert!((s.density - 3.0 / 12.0).abs() < 1e-12);
        assert!(!s.is_weightless());
    }

    #[test]
    fn zero_weight_edges_are_weightless() {
        let s = stats(&json!({
            "nodes": [{ "id": "a" }, { "id": "b" }],
            "links": [{ "source": "a", "target": "b", "weight": 0 }]
        }));
        assert!(s.is_weightless());
    }

    #[test]
    fn edgeless_graph_is_weightless() {
        let s = stats(&json!({ "nodes": [{ "id": "a" }, { "id": "b" }] }));
        assert_eq!(s.edge_count, 0);
        assert!(s.is_weightless());
    }
}
