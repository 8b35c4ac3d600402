//! Output document and ranking view.
//!
//! The document is the boundary to downstream consumers (reports,
//! visualizations, exports). It is fully deterministic: nodes keep the
//! input order, links follow canonical `(source, target)` order, numbers
//! are finite and rounded (6 decimals, PageRank 8), and nothing
//! time-dependent is included. Two runs over the same input and config
//! serialize to identical bytes.

use serde::Serialize;

use crate::config::ScoringConfig;
use crate::diagnostics::Diagnostic;
use crate::metrics::Metric;
use crate::pipeline::ScoreReport;
use crate::score::Layer;
use crate::score::layers::layer_counts;

/// Model identifier written into every document.
pub const MODEL_NAME: &str = "circlerank-grey-pagerank-v1";

const SCORE_DECIMALS: i32 = 6;
const PAGERANK_DECIMALS: i32 = 8;

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// Complete serialized result of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDocument {
    pub model: ModelInfo,
    pub summary: Summary,
    pub diagnostics: Vec<Diagnostic>,
    pub links: Vec<LinkOutput>,
    pub nodes: Vec<NodeOutput>,
}

/// Parameters and formulas that produced the scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub name: &'static str,
    pub alpha: f64,
    pub beta: f64,
    pub rho: f64,
    pub grey_weighting: crate::score::GreyWeighting,
    pub grey_dimensions: Vec<Metric>,
    pub formulas: Formulas,
    pub config: ScoringConfig,
}

/// Human-readable formulas, for consumers that display the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Formulas {
    pub association: String,
    pub centrality: String,
    pub influence: &'static str,
    pub interaction_strength: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerCounts {
    pub core: usize,
    pub strong: usize,
    pub medium: usize,
    pub edge: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub node_count: usize,
    pub edge_count: usize,
    pub input_link_count: usize,
    pub content_hash: String,
    pub pagerank_iterations: usize,
    pub pagerank_converged: bool,
    pub layer_counts: LayerCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkOutput {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub multiplicity: usize,
    pub reciprocal: bool,
    pub structural: f64,
    pub semantic_similarity: f64,
}

/// One scored node. Absent input counters are reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutput {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub grey_relation: f64,
    /// Raw weighted degree.
    pub association_weight: f64,
    pub association_weight_norm: f64,
    pub cross_follow_count: usize,
    pub cross_follow_ratio: f64,
    pub followers_count: u64,
    pub posts_count: u64,
    pub comments_count: u64,
    pub likes_count: u64,
    pub reposts_count: u64,
    pub semantic_ai: f64,
    pub pagerank: f64,
    pub reciprocity: f64,
    pub bridging: f64,
    pub neighbor_clusters: usize,
    pub degree_centrality: f64,
    pub interaction_strength: f64,
    pub engagement_composite: f64,
    pub association_score: f64,
    pub centrality_score: f64,
    pub influence_score: f64,
    pub layer: Layer,
    pub rank: usize,
}

/// One row of the ranking view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedNode {
    pub rank: usize,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub influence_score: f64,
    pub association_score: f64,
    pub centrality_score: f64,
    pub grey_relation: f64,
    pub layer: Layer,
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Round to `decimals` places; non-finite becomes 0 and `-0.0` becomes `0.0`.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10f64.powi(decimals);
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}

fn round6(value: f64) -> f64 {
    round_to(value, SCORE_DECIMALS)
}

/// Canonical node positions in ranking order: influence desc, grey
/// relation desc, weighted degree desc, lowercase handle (or id) asc, id asc.
#[must_use]
pub fn ranking_order(report: &ScoreReport) -> Vec<usize> {
    let g = &report.graph.graph;
    let sort_key: Vec<String> = g
        .node_weights()
        .map(|node| node.handle.as_deref().unwrap_or(&node.id).to_lowercase())
        .collect();
    let ids: Vec<&str> = g.node_weights().map(|node| node.id.as_str()).collect();

    let mut order: Vec<usize> = (0..report.len()).collect();
    order.sort_by(|&a, &b| {
        let (sa, sb) = (&report.scores[a], &report.scores[b]);
        sb.influence_score
            .total_cmp(&sa.influence_score)
            .then_with(|| report.grey.records[b].degree.total_cmp(&report.grey.records[a].degree))
            .then_with(|| {
                let wa = report.metrics.nodes[a].values.weighted_degree;
                let wb = report.metrics.nodes[b].values.weighted_degree;
                wb.total_cmp(&wa)
            })
            .then_with(|| sort_key[a].cmp(&sort_key[b]))
            .then_with(|| ids[a].cmp(ids[b]))
    });
    order
}

/// Ranking view, optionally truncated to the top `limit` entries.
#[must_use]
pub fn ranking(report: &ScoreReport, limit: Option<usize>) -> Vec<RankedNode> {
    let g = &report.graph.graph;
    let nodes: Vec<_> = g.node_weights().collect();
    ranking_order(report)
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(position, i)| {
            let node = nodes[i];
            let score = &report.scores[i];
            RankedNode {
                rank: position + 1,
                id: node.id.clone(),
                name: node.name.clone(),
                handle: node.handle.clone(),
                influence_score: round6(score.influence_score),
                association_score: round6(score.association_score),
                centrality_score: round6(score.centrality_score),
                grey_relation: round6(report.grey.records[i].degree),
                layer: report.layers[i],
            }
        })
        .collect()
}

impl ScoreDocument {
    /// Build the output document for a finished run.
    #[must_use]
    pub fn from_report(report: &ScoreReport) -> Self {
        let config = &report.config;
        let g = &report.graph.graph;

        let mut rank_of = vec![0; report.len()];
        for (position, i) in ranking_order(report).into_iter().enumerate() {
            rank_of[i] = position + 1;
        }

        let mut nodes: Vec<(usize, NodeOutput)> = g
            .node_weights()
            .enumerate()
            .map(|(i, node)| {
                let raw = &report.metrics.nodes[i];
                let norm = &report.normalized.rows[i];
                let score = &report.scores[i];
                let output = NodeOutput {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    handle: node.handle.clone(),
                    group: node.group.clone(),
                    role: node.role.clone(),
                    grey_relation: round6(report.grey.records[i].degree),
                    association_weight: round6(raw.values.weighted_degree),
                    association_weight_norm: round6(norm.weighted_degree),
                    cross_follow_count: raw.cross_follow_count,
                    cross_follow_ratio: round6(raw.values.cross_follow_ratio),
                    followers_count: node.counters.followers,
                    posts_count: node.counters.posts,
                    comments_count: node.counters.comments,
                    likes_count: node.counters.likes,
                    reposts_count: node.counters.reposts,
                    semantic_ai: round6(raw.values.semantic_affinity),
                    pagerank: round_to(raw.values.pagerank, PAGERANK_DECIMALS),
                    reciprocity: round6(raw.values.reciprocity),
                    bridging: round6(raw.values.bridging),
                    neighbor_clusters: raw.neighbor_clusters,
                    degree_centrality: round6(raw.values.degree_centrality),
                    interaction_strength: round6(raw.values.interaction_strength),
                    engagement_composite: round6(raw.values.engagement_composite),
                    association_score: round6(score.association_score),
                    centrality_score: round6(score.centrality_score),
                    influence_score: round6(score.influence_score),
                    layer: report.layers[i],
                    rank: rank_of[i],
                };
                (node.input_index, output)
            })
            .collect();
        nodes.sort_by_key(|(input_index, _)| *input_index);
        let nodes = nodes.into_iter().map(|(_, output)| output).collect();

        let links = report
            .metrics
            .links
            .iter()
            .map(|link| LinkOutput {
                source: link.source.clone(),
                target: link.target.clone(),
                weight: round6(link.weight),
                multiplicity: link.multiplicity,
                reciprocal: link.reciprocal,
                structural: round6(link.structural),
                semantic_similarity: round6(link.semantic_similarity),
            })
            .collect();

        let counts = layer_counts(&report.layers);
        let summary = Summary {
            node_count: report.graph.node_count(),
            edge_count: report.graph.edge_count(),
            input_link_count: report.graph.input_link_count,
            content_hash: report.graph.content_hash.clone(),
            pagerank_iterations: report.metrics.pagerank.iterations,
            pagerank_converged: report.metrics.pagerank.converged,
            layer_counts: LayerCounts {
                core: counts[0].1,
                strong: counts[1].1,
                medium: counts[2].1,
                edge: counts[3].1,
            },
        };

        let diagnostics = report
            .diagnostics
            .iter()
            .cloned()
            .map(|d| match d {
                Diagnostic::Convergence {
                    message,
                    iterations,
                    residual,
                } => Diagnostic::Convergence {
                    message,
                    iterations,
                    residual: round_to(residual, 12),
                },
                other => other,
            })
            .collect();

        Self {
            model: ModelInfo {
                name: MODEL_NAME,
                alpha: config.composite.alpha,
                beta: config.composite.beta,
                rho: config.grey.rho,
                grey_weighting: config.grey.weighting,
                grey_dimensions: config.grey.dimensions.clone(),
                formulas: formulas(config),
                config: config.clone(),
            },
            summary,
            diagnostics,
            links,
            nodes,
        }
    }

    /// Pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization fails, which cannot happen
    /// for finite values.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

fn formulas(config: &ScoringConfig) -> Formulas {
    let a = &config.association;
    let c = &config.centrality;
    let e = &config.engagement;
    Formulas {
        association: format!(
            "{}*grey + {}*weighted_degree_norm + {}*reciprocity_norm + {}*interaction_norm",
            a.grey, a.weighted_degree, a.reciprocity, a.interaction
        ),
        centrality: format!(
            "{}*pagerank_norm + {}*degree_centrality_norm + {}*bridging_norm",
            c.pagerank, c.degree, c.bridging
        ),
        influence: "alpha*association + beta*centrality",
        interaction_strength: format!(
            "{}*ln(1+posts) + {}*ln(1+comments) + {}*ln(1+likes) + {}*ln(1+reposts)",
            e.posts, e.comments, e.likes, e.reposts
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::float_cmp)]
    fn rounding_is_finite_and_signless() {
        assert_eq!(round_to(0.123_456_789, 6), 0.123_457);
        assert_eq!(round_to(f64::NAN, 6), 0.0);
        assert_eq!(round_to(f64::INFINITY, 6), 0.0);
        assert!(round_to(-0.000_000_1, 6).is_sign_positive());
    }
}
