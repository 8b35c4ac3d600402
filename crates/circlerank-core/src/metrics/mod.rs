//! Primitive per-node and per-link metrics.
//!
//! # Overview
//!
//! Each submodule answers one question about a node:
//!
//! - **basic**: how much relation weight touches it (`weighted_degree`,
//!   `degree_centrality`) and how much of it is returned (`reciprocity`,
//!   `cross_follow_ratio`).
//! - **engagement**: how active is its audience (`interaction_strength`,
//!   `engagement_composite`).
//! - **bridging**: how many otherwise-unconnected neighbours does it join.
//! - **semantic**: how closely its text profile matches the configured
//!   topic keywords (`semantic_affinity`).
//! - **pagerank**: how much link importance flows into it.
//! - **links**: per-edge structural and semantic similarity.
//!
//! # Usage
//!
//! [`extract_metrics`] runs all of them over a [`ScoredGraph`] and returns
//! a [`MetricTable`] whose rows follow the graph's canonical node order
//! (`NodeIndex::index()`).

pub mod basic;
pub mod bridging;
pub mod engagement;
pub mod links;
pub mod pagerank;
pub mod semantic;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::graph::build::ScoredGraph;

pub use engagement::EngagementWeights;
pub use links::LinkFeatures;
pub use pagerank::{PageRankConfig, PageRankResult};
pub use semantic::SemanticConfig;

// ---------------------------------------------------------------------------
// Metric keys
// ---------------------------------------------------------------------------

/// Whether a larger raw value is better or worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Higher raw value is better; scaled as-is.
    Benefit,
    /// Higher raw value is worse; scaled then inverted.
    Cost,
}

/// The fixed set of per-node metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    WeightedDegree,
    Reciprocity,
    InteractionStrength,
    DegreeCentrality,
    Bridging,
    CrossFollowRatio,
    EngagementComposite,
    SemanticAffinity,
    #[serde(rename = "pagerank")]
    PageRank,
}

impl Metric {
    /// Every metric, in column order.
    pub const ALL: [Self; 9] = [
        Self::WeightedDegree,
        Self::Reciprocity,
        Self::InteractionStrength,
        Self::DegreeCentrality,
        Self::Bridging,
        Self::CrossFollowRatio,
        Self::EngagementComposite,
        Self::SemanticAffinity,
        Self::PageRank,
    ];

    /// Stable snake_case name, as used in config files and output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::WeightedDegree => "weighted_degree",
            Self::Reciprocity => "reciprocity",
            Self::InteractionStrength => "interaction_strength",
            Self::DegreeCentrality => "degree_centrality",
            Self::Bridging => "bridging",
            Self::CrossFollowRatio => "cross_follow_ratio",
            Self::EngagementComposite => "engagement_composite",
            Self::SemanticAffinity => "semantic_affinity",
            Self::PageRank => "pagerank",
        }
    }

    /// Declared polarity. Every built-in metric rewards larger values.
    #[must_use]
    pub const fn polarity(self) -> Polarity {
        match self {
            Self::WeightedDegree
            | Self::Reciprocity
            | Self::InteractionStrength
            | Self::DegreeCentrality
            | Self::Bridging
            | Self::CrossFollowRatio
            | Self::EngagementComposite
            | Self::SemanticAffinity
            | Self::PageRank => Polarity::Benefit,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Per-node values
// ---------------------------------------------------------------------------

/// One value per [`Metric`]. Lookup never fails; absent data is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricVector {
    pub weighted_degree: f64,
    pub reciprocity: f64,
    pub interaction_strength: f64,
    pub degree_centrality: f64,
    pub bridging: f64,
    pub cross_follow_ratio: f64,
    pub engagement_composite: f64,
    pub semantic_affinity: f64,
    pub pagerank: f64,
}

impl MetricVector {
    #[must_use]
    pub const fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::WeightedDegree => self.weighted_degree,
            Metric::Reciprocity => self.reciprocity,
            Metric::InteractionStrength => self.interaction_strength,
            Metric::DegreeCentrality => self.degree_centrality,
            Metric::Bridging => self.bridging,
            Metric::CrossFollowRatio => self.cross_follow_ratio,
            Metric::EngagementComposite => self.engagement_composite,
            Metric::SemanticAffinity => self.semantic_affinity,
            Metric::PageRank => self.pagerank,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        let slot = match metric {
            Metric::WeightedDegree => &mut self.weighted_degree,
            Metric::Reciprocity => &mut self.reciprocity,
            Metric::InteractionStrength => &mut self.interaction_strength,
            Metric::DegreeCentrality => &mut self.degree_centrality,
            Metric::Bridging => &mut self.bridging,
            Metric::CrossFollowRatio => &mut self.cross_follow_ratio,
            Metric::EngagementComposite => &mut self.engagement_composite,
            Metric::SemanticAffinity => &mut self.semantic_affinity,
            Metric::PageRank => &mut self.pagerank,
        };
        *slot = value;
    }
}

/// Raw metrics for one node plus the integer side counts reported in output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeMetrics {
    pub values: MetricVector,
    /// Out-neighbours that link back.
    pub cross_follow_count: usize,
    /// Connected groups among the node's neighbours.
    pub neighbor_clusters: usize,
}

/// Output of [`extract_metrics`].
#[derive(Debug, Clone)]
pub struct MetricTable {
    /// One row per node, in canonical order.
    pub nodes: Vec<NodeMetrics>,
    /// One entry per aggregated link, in canonical `(source, target)` order.
    pub links: Vec<LinkFeatures>,
    /// Centrality run metadata (scores are also in `nodes[..].values.pagerank`).
    pub pagerank: PageRankResult,
}

impl MetricTable {
    /// All raw values of one metric, in canonical node order.
    #[must_use]
    pub fn column(&self, metric: Metric) -> Vec<f64> {
        self.nodes.iter().map(|row| row.values.get(metric)).collect()
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Compute every primitive metric for every node and link.
///
/// Deterministic and independent of input order: the graph is already in
/// canonical order and every reduction iterates over it in that order.
#[must_use]
#[instrument(skip_all, fields(nodes = sg.node_count(), edges = sg.edge_count()))]
pub fn extract_metrics(
    sg: &ScoredGraph,
    engagement: &EngagementWeights,
    semantic: &SemanticConfig,
    pagerank: &PageRankConfig,
) -> MetricTable {
    let weighted = basic::weighted_degree(sg);
    let degree = basic::degree_centrality(&weighted);
    let reciprocity = basic::reciprocity(sg);
    let cross = basic::cross_follow(sg);
    let bridges = bridging::bridging(sg);
    let tokens = semantic::node_tokens(sg);
    let pr = pagerank::pagerank(sg, pagerank);

    let nodes: Vec<NodeMetrics> = sg
        .graph
        .node_weights()
        .enumerate()
        .map(|(i, node)| {
            let interaction = engagement.interaction_strength(&node.counters);
            NodeMetrics {
                values: MetricVector {
                    weighted_degree: weighted[i],
                    reciprocity: reciprocity[i],
                    interaction_strength: interaction,
                    degree_centrality: degree[i],
                    bridging: bridges[i].unlinked_pairs_f64(),
                    cross_follow_ratio: node.cross_follow_ratio.unwrap_or(cross[i].ratio),
                    engagement_composite: engagement.engagement_composite(&node.counters),
                    semantic_affinity: semantic.affinity(&tokens[i]),
                    pagerank: pr.scores[i],
                },
                cross_follow_count: cross[i].count,
                neighbor_clusters: bridges[i].neighbor_clusters,
            }
        })
        .collect();

    let links = links::link_features(sg, &tokens);
    debug!(links = links.len(), "metrics extracted");

    MetricTable {
        nodes,
        links,
        pagerank: pr,
    }
}
