//! Construction of the validated scoring graph.
//!
//! # Overview
//!
//! [`ScoredGraph::from_document`] turns a [`GraphDocument`] into a
//! [`petgraph`] directed graph suitable for metric extraction:
//!
//! - Nodes are inserted in canonical (lexicographic id) order, so
//!   `NodeIndex::index()` is a stable row number and every later
//!   reduction iterates in the same order regardless of input order.
//! - Links whose endpoints are unknown are dropped (default) or fail the
//!   run (strict policy). Self-loops are dropped.
//! - Invalid weights are clamped to 0.0 (default) or fail the run
//!   (strict policy).
//! - Parallel links between the same ordered pair are merged into one
//!   [`LinkRecord`] with summed weight. Sums saturate at `f64::MAX`.
//!
//! Every recoverable decision is recorded as a [`LoadIssue`].
//!
//! ## Cache Invalidation
//!
//! [`ScoredGraph::content_hash`] is a BLAKE3 hash of the canonical node and
//! edge set. Two inputs that differ only in ordering share the same hash.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::graph::load::{GraphDocument, NodeRecord, RawWeight};

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// What to do with a link whose endpoint is not a known node id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferencePolicy {
    /// Drop the link and record a [`LoadIssue::DanglingReference`].
    #[default]
    Drop,
    /// Fail the run with [`Error::Referential`].
    Strict,
}

/// What to do with a negative, non-finite, or non-numeric edge weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightPolicy {
    /// Clamp to 0.0 and record a [`LoadIssue::InvalidWeight`].
    #[default]
    Clamp,
    /// Fail the run with [`Error::Schema`].
    Strict,
}

/// Loader configuration (`[loader]` in `circlerank.toml`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default)]
    pub references: ReferencePolicy,
    #[serde(default)]
    pub weights: WeightPolicy,
}

impl LoaderConfig {
    /// Strict on both references and weights.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            references: ReferencePolicy::Strict,
            weights: WeightPolicy::Strict,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An aggregated directed relation between two distinct nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkRecord {
    /// Sum of the weights of every merged input link.
    pub weight: f64,
    /// Number of input links merged into this record.
    pub multiplicity: usize,
    /// Largest supplied semantic similarity among merged links.
    pub semantic_similarity: Option<f64>,
}

/// A recoverable problem found while building the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadIssue {
    /// Weight was negative, non-finite, or not a number and was clamped to 0.
    InvalidWeight {
        link_index: usize,
        source: String,
        target: String,
        raw: String,
    },
    /// An endpoint is not a known node id; the link was dropped.
    DanglingReference {
        link_index: usize,
        source: String,
        target: String,
        missing: String,
    },
    /// Source and target are the same node; the link was dropped.
    SelfLoop { link_index: usize, id: String },
}

// ---------------------------------------------------------------------------
// ScoredGraph
// ---------------------------------------------------------------------------

/// A validated, aggregated relation graph.
///
/// Nodes carry their resolved [`NodeRecord`]; edges carry aggregated
/// [`LinkRecord`]s. An edge `A → B` means "A relates to B" (A follows,
/// mentions, or reports to B, depending on the domain).
#[derive(Debug, Clone)]
pub struct ScoredGraph {
    /// Directed graph in canonical node order.
    pub graph: DiGraph<NodeRecord, LinkRecord>,
    /// Mapping from node id to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
    /// Recoverable problems found while loading, in input link order.
    pub issues: Vec<LoadIssue>,
    /// BLAKE3 content hash of the canonical node and edge set.
    pub content_hash: String,
    /// Number of input links before dropping and merging.
    pub input_link_count: usize,
}

impl ScoredGraph {
    /// Build a [`ScoredGraph`] from a parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Referential`] for an unknown endpoint under
    /// [`ReferencePolicy::Strict`], and [`Error::Schema`] for an invalid
    /// weight under [`WeightPolicy::Strict`].
    #[instrument(skip(doc), fields(nodes = doc.nodes.len(), links = doc.links.len()))]
    pub fn from_document(doc: GraphDocument, config: &LoaderConfig) -> Result<Self> {
        let GraphDocument { mut nodes, links } = doc;
        let input_link_count = links.len();

        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut graph = DiGraph::<NodeRecord, LinkRecord>::with_capacity(nodes.len(), links.len());
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let id = node.id.clone();
            let idx = graph.add_node(node);
            node_map.insert(id, idx);
        }

        let mut issues = Vec::new();
        // (source, target) -> (weights, best semantic similarity)
        let mut merged: BTreeMap<(NodeIndex, NodeIndex), (Vec<f64>, Option<f64>)> = BTreeMap::new();

        for link in links {
            let (Some(&s), Some(&t)) = (node_map.get(&link.source), node_map.get(&link.target))
            else {
                let missing = if node_map.contains_key(&link.source) {
                    link.target.clone()
                } else {
                    link.source.clone()
                };
                match config.references {
                    ReferencePolicy::Strict => {
                        return Err(Error::Referential {
                            source_id: link.source,
                            target_id: link.target,
                            missing,
                        });
                    }
                    ReferencePolicy::Drop => {
                        issues.push(LoadIssue::DanglingReference {
                            link_index: link.input_index,
                            source: link.source,
                            target: link.target,
                            missing,
                        });
                        continue;
                    }
                }
            };

            if s == t {
                issues.push(LoadIssue::SelfLoop {
                    link_index: link.input_index,
                    id: link.source,
                });
                continue;
            }

            if link.weight == RawWeight::Invalid {
                let raw = link.weight_text.clone().unwrap_or_default();
                if config.weights == WeightPolicy::Strict {
                    return Err(Error::schema(
                        format!("links[{}].weight", link.input_index),
                        format!("must be a finite non-negative number, got {raw}"),
                    ));
                }
                issues.push(LoadIssue::InvalidWeight {
                    link_index: link.input_index,
                    source: link.source.clone(),
                    target: link.target.clone(),
                    raw,
                });
            }

            let entry = merged.entry((s, t)).or_default();
            entry.0.push(link.weight.resolved());
            entry.1 = match (entry.1, link.semantic_similarity) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
        }

        for ((s, t), (mut weights, semantic_similarity)) in merged {
            // Sum in sorted order so the aggregate does not depend on input order.
            weights.sort_by(f64::total_cmp);
            graph.add_edge(
                s,
                t,
                LinkRecord {
                    weight: saturating_sum(weights.iter().copied()),
                    multiplicity: weights.len(),
                    semantic_similarity,
                },
            );
        }

        if !issues.is_empty() {
            warn!(issues = issues.len(), "recoverable problems while loading graph");
        }

        let content_hash = compute_content_hash(&graph);
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph built"
        );

        Ok(Self {
            graph,
            node_map,
            issues,
            content_hash,
            input_link_count,
        })
    }

    /// Return the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of aggregated edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for a node id.
    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Return the record for a node.
    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> Option<&NodeRecord> {
        self.graph.node_weight(idx)
    }

    /// Node indices in canonical order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Aggregated weight of the edge `from → to`, if present.
    #[must_use]
    pub fn link_weight(&self, from: NodeIndex, to: NodeIndex) -> Option<f64> {
        self.graph
            .find_edge(from, to)
            .and_then(|e| self.graph.edge_weight(e))
            .map(|link| link.weight)
    }

    /// Outgoing neighbours with their aggregated edge, in ascending index order.
    #[must_use]
    pub fn out_links(&self, idx: NodeIndex) -> Vec<(NodeIndex, LinkRecord)> {
        self.links_directed(idx, Direction::Outgoing)
    }

    /// Incoming neighbours with their aggregated edge, in ascending index order.
    #[must_use]
    pub fn in_links(&self, idx: NodeIndex) -> Vec<(NodeIndex, LinkRecord)> {
        self.links_directed(idx, Direction::Incoming)
    }

    /// Distinct neighbours in either direction (the undirected view).
    #[must_use]
    pub fn undirected_neighbors(&self, idx: NodeIndex) -> BTreeSet<NodeIndex> {
        self.graph
            .neighbors_undirected(idx)
            .filter(|&n| n != idx)
            .collect()
    }

    /// Sum of the weights of every edge in the graph.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        saturating_sum(self.graph.edge_weights().map(|link| link.weight))
    }

    fn links_directed(&self, idx: NodeIndex, dir: Direction) -> Vec<(NodeIndex, LinkRecord)> {
        let mut links: Vec<(NodeIndex, LinkRecord)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (other, *e.weight())
            })
            .collect();
        links.sort_by_key(|(other, _)| *other);
        links
    }
}

/// Compute a BLAKE3 hash of the canonical node and edge set.
fn compute_content_hash(graph: &DiGraph<NodeRecord, LinkRecord>) -> String {
    let mut hasher = blake3::Hasher::new();
    for node in graph.node_weights() {
        hasher.update(node.id.as_bytes());
        hasher.update(b"\x00");
        for count in [
            node.counters.followers,
            node.counters.posts,
            node.counters.comments,
            node.counters.likes,
            node.counters.reposts,
        ] {
            hasher.update(&count.to_le_bytes());
        }
        hasher.update(b"\x01");
    }
    let mut edges: Vec<(&str, &str, f64)> = graph
        .edge_references()
        .map(|e| (graph[e.source()].id.as_str(), graph[e.target()].id.as_str(), e.weight().weight))
        .collect();
    edges.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));
    for (source, target, weight) in edges {
        hasher.update(source.as_bytes());
        hasher.update(b"\x00");
        hasher.update(target.as_bytes());
        hasher.update(b"\x00");
        hasher.update(&weight.to_bits().to_le_bytes());
        hasher.update(b"\x01");
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}

/// Sum of non-negative weights that saturates at `f64::MAX` instead of
/// overflowing to infinity.
#[must_use]
pub fn saturating_sum(weights: impl IntoIterator<Item = f64>) -> f64 {
    weights
        .into_iter()
        .fold(0.0, |acc, w| (acc + w).min(f64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(value: &serde_json::Value, config: &LoaderConfig) -> Result<ScoredGraph> {
        let doc = GraphDocument::from_value(value)?;
        ScoredGraph::from_document(doc, config)
    }

    #[test]
    fn nodes_are_stored_in_canonical_order() {
        let g = build(
            &json!({ "nodes": [{ "id": "c" }, { "id": "a" }, { "id": "b" }] }),
            &LoaderConfig::default(),
        )
        .expect("valid");
        let ids: Vec<&str> = g.graph.node_weights().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(g.node(g.node_index("c").expect("c")).expect("c").input_index, 0);
    }

    #[test]
    fn parallel_links_are_summed_not_overwritten() {
        let g = build(
            &json!({
                "nodes": [{ "id": "a" }, { "id": "b" }],
                "links": [
                    { "source": "a", "target": "b", "weight": 1.5 },
                    { "source": "a", "target": "b", "weight": 2.0, "semantic_similarity": 0.3 },
                    { "source": "a", "target": "b", "semantic_similarity": 0.6 }
                ]
            }),
            &LoaderConfig::default(),
        )
        .expect("valid");
        assert_eq!(g.edge_count(), 1);
        let a = g.node_index("a").expect("a");
        let b = g.node_index("b").expect("b");
        let link = g.out_links(a)[0].1;
        assert!((link.weight - 4.5).abs() < 1e-12);
        assert_eq!(link.multiplicity, 3);
        assert_eq!(link.semantic_similarity, Some(0.6));
        assert_eq!(g.link_weight(b, a), None);
    }

    #[test]
    fn huge_parallel_weights_saturate_instead_of_overflowing() {
        let g = build(
            &json!({
                "nodes": [{ "id": "a" }, { "id": "b" }],
                "links": [
                    { "source": "a", "target": "b", "weight": 1e308 },
                    { "source": "a", "target": "b", "weight": 1e308 }
                ]
            }),
            &LoaderConfig::default(),
        )
        .expect("valid");
        let a = g.node_index("a").expect("a");
        let b = g.node_index("b").expect("b");
        assert_eq!(g.link_weight(a, b), Some(f64::MAX));
        assert_eq!(g.total_weight(), f64::MAX);
        assert_eq!(saturating_sum([f64::MAX, 1.0, 2.5]), f64::MAX);
    }

    #[test]
    fn dangling_links_are_dropped_by_default() {
        let g = build(
            &json!({
                "nodes": [{ "id": "a" }],
                "links": [{ "source": "a", "target": "ghost" }]
            }),
            &LoaderConfig::default(),
        )
        .expect("valid");
        assert_eq!(g.edge_count(), 0);
        assert_eq!(
            g.issues,
            vec![LoadIssue::DanglingReference {
                link_index: 0,
                source: "a".to_string(),
                target: "ghost".to_string(),
                missing: "ghost".to_string(),
            }]
        );
    }

    #[test]
    fn dangling_links_fail_under_strict_policy() {
        let err = build(
            &json!({
                "nodes": [{ "id": "a" }],
                "links": [{ "source": "ghost", "target": "a" }]
            }),
            &LoaderConfig::strict(),
        )
        .expect_err("must fail");
        assert_eq!(
            err,
            Error::Referential {
                source_id: "ghost".to_string(),
                target_id: "a".to_string(),
                missing: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn invalid_weights_are_clamped_and_flagged() {
        let g = build(
            &json!({
                "nodes": [{ "id": "a" }, { "id": "b" }],
                "links": [{ "source": "a", "target": "b", "weight": -3 }]
            }),
            &LoaderConfig::default(),
        )
        .expect("valid");
        let a = g.node_index("a").expect("a");
        let b = g.node_index("b").expect("b");
        assert_eq!(g.link_weight(a, b), Some(0.0));
        assert!(matches!(g.issues[0], LoadIssue::InvalidWeight { link_index: 0, .. }));
    }

    #[test]
    fn invalid_weights_fail_under_strict_policy() {
        let err = build(
            &json!({
                "nodes": [{ "id": "a" }, { "id": "b" }],
                "links": [{ "source": "a", "target": "b", "weight": "lots" }]
            }),
            &LoaderConfig::strict(),
        )
        .expect_err("must fail");
        assert!(matches!(err, Error::Schema { ref field, .. } if field == "links[0].weight"));
    }

    #[test]
    fn self_loops_are_dropped() {
        let g = build(
            &json!({
                "nodes": [{ "id": "a" }],
                "links": [{ "source": "a", "target": "a" }]
            }),
            &LoaderConfig::strict(),
        )
        .expect("self-loops are never fatal");
        assert_eq!(g.edge_count(), 0);
        assert_eq!(
            g.issues,
            vec![LoadIssue::SelfLoop {
                link_index: 0,
                id: "a".to_string()
            }]
        );
    }

    #[test]
    fn content_hash_ignores_input_order() {
        let forward = build(
            &json!({
                "nodes": [{ "id": "a" }, { "id": "b" }, { "id": "c" }],
                "links": [
                    { "source": "a", "target": "b", "weight": 0.1 },
                    { "source": "a", "target": "b", "weight": 0.2 },
                    { "source": "b", "target": "c" }
                ]
            }),
            &LoaderConfig::default(),
        )
        .expect("valid");
        let shuffled = build(
            &json!({
                "nodes": [{ "id": "c" }, { "id": "b" }, { "id": "a" }],
                "links": [
                    { "source": "b", "target": "c" },
                    { "source": "a", "target": "b", "weight": 0.2 },
                    { "source": "a", "target": "b", "weight": 0.1 }
                ]
            }),
            &LoaderConfig::default(),
        )
        .expect("valid");
        assert_eq!(forward.content_hash, shuffled.content_hash);
        assert!(forward.content_hash.starts_with("blake3:"));
    }

    #[test]
    fn undirected_neighbors_merge_both_directions() {
        let g = build(
            &json!({
                "nodes": [{ "id": "a" }, { "id": "b" }, { "id": "c" }],
                "links": [
                    { "source": "a", "target": "b" },
                    { "source": "b", "target": "a" },
                    { "source": "c", "target": "a" }
                ]
            }),
            &LoaderConfig::default(),
        )
        .expect("valid");
        let a = g.node_index("a").expect("a");
        assert_eq!(g.undirected_neighbors(a).len(), 2);
        assert!((g.total_weight() - 3.0).abs() < 1e-12);
    }
}
