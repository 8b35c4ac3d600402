//! End-to-end scoring run.
//!
//! [`score_graph`] executes the stages strictly in order over one owned
//! graph snapshot:
//!
//! 1. load and validate ([`ScoredGraph::from_document`])
//! 2. extract raw metrics ([`extract_metrics`])
//! 3. normalize ([`normalize_table`])
//! 4. grey relational analysis ([`grey_relational`])
//! 5. centrality (PageRank is part of stage 2; blended in stage 6)
//! 6. compose association, centrality and influence ([`compose`])
//! 7. classify layers ([`classify`])
//!
//! Nothing survives between calls: every intermediate value is owned by the
//! returned [`ScoreReport`].

use tracing::{info, instrument};

use crate::config::ScoringConfig;
use crate::diagnostics::{self, Diagnostic};
use crate::error::Result;
use crate::graph::{EngagementTable, GraphDocument, GraphStats, ScoredGraph};
use crate::metrics::{Metric, MetricTable, extract_metrics};
use crate::score::composite::compose;
use crate::score::grey::{GreyAnalysis, ReferenceSequence, grey_relational};
use crate::score::layers::{Layer, LayerInput, classify};
use crate::score::normalize::{NormalizedTable, normalize_table};
use crate::score::ScoreRecord;

/// Everything computed by one run, indexed by canonical node position.
#[derive(Debug, Clone)]
pub struct ScoreReport {
    pub config: ScoringConfig,
    pub graph: ScoredGraph,
    pub stats: GraphStats,
    pub metrics: MetricTable,
    pub normalized: NormalizedTable,
    pub grey: GreyAnalysis,
    pub scores: Vec<ScoreRecord>,
    pub layers: Vec<Layer>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScoreReport {
    /// Number of scored nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Scores for a node id.
    #[must_use]
    pub fn score_of(&self, id: &str) -> Option<&ScoreRecord> {
        self.graph
            .node_index(id)
            .and_then(|idx| self.scores.get(idx.index()))
    }

    /// Layer for a node id.
    #[must_use]
    pub fn layer_of(&self, id: &str) -> Option<Layer> {
        self.graph
            .node_index(id)
            .and_then(|idx| self.layers.get(idx.index()).copied())
    }

    /// Raw metrics for a node id.
    #[must_use]
    pub fn metrics_of(&self, id: &str) -> Option<&crate::metrics::NodeMetrics> {
        self.graph
            .node_index(id)
            .and_then(|idx| self.metrics.nodes.get(idx.index()))
    }
}

/// Parse the graph (and optional engagement) documents, then score.
///
/// # Errors
///
/// Propagates parse, schema, referential and configuration errors; see
/// [`score_graph`].
pub fn score_json(
    graph_json: &str,
    engagement_json: Option<&str>,
    config: &ScoringConfig,
) -> Result<ScoreReport> {
    let document = GraphDocument::parse(graph_json)?;
    let engagement = engagement_json.map(EngagementTable::parse).transpose()?;
    score_graph(document, engagement.as_ref(), config)
}

/// Run the full pipeline on a parsed document.
///
/// # Errors
///
/// Returns [`crate::Error::Config`] for an out-of-range configuration,
/// [`crate::Error::Referential`] or [`crate::Error::Schema`] under strict
/// loader policies. No partial result is returned on error.
#[instrument(skip_all, fields(nodes = document.nodes.len(), links = document.links.len()))]
pub fn score_graph(
    mut document: GraphDocument,
    engagement: Option<&EngagementTable>,
    config: &ScoringConfig,
) -> Result<ScoreReport> {
    config.validate()?;
    let mut diagnostics = Vec::new();

    // Stage 1: load.
    if let Some(table) = engagement {
        let merge = table.apply(&mut document.nodes);
        info!(matched = merge.matched, rows = table.len(), "engagement merged");
        if !merge.unmatched.is_empty() {
            diagnostics.push(Diagnostic::unmatched_engagement(merge.unmatched));
        }
    }
    let graph = ScoredGraph::from_document(document, &config.loader)?;
    diagnostics.extend(diagnostics::from_load_issues(&graph.issues));
    let stats = GraphStats::from_graph(&graph);

    if graph.node_count() < 2 {
        diagnostics.push(Diagnostic::degenerate(
            format!(
                "graph has {} node(s); relative scores are not informative",
                graph.node_count()
            ),
            Vec::new(),
        ));
    } else if stats.is_weightless() {
        diagnostics.push(Diagnostic::degenerate(
            "graph carries no relation weight; structural metrics are constant",
            Vec::new(),
        ));
    }

    // Stage 2: raw metrics (PageRank included).
    let metrics = extract_metrics(
        &graph,
        &config.engagement,
        &config.semantic,
        &config.pagerank,
    );
    if !metrics.pagerank.converged {
        diagnostics.push(Diagnostic::convergence(
            metrics.pagerank.iterations,
            metrics.pagerank.residual,
            config.pagerank.tolerance,
        ));
    }

    // Stage 3: normalize.
    let normalized = normalize_table(&metrics);
    if graph.node_count() >= 2 && !normalized.degenerate.is_empty() {
        let names: Vec<&str> = normalized.degenerate.iter().map(|m| m.name()).collect();
        diagnostics.push(Diagnostic::degenerate(
            format!("constant metric(s) normalized to 1.0: {}", names.join(", ")),
            normalized.degenerate.clone(),
        ));
    }

    // Stage 4: grey relational analysis.
    let dimensions: &[Metric] = &config.grey.dimensions;
    let reference = ReferenceSequence::ideal(dimensions.len());
    let grey = grey_relational(
        &normalized.rows,
        dimensions,
        &reference,
        config.grey.rho,
        config.grey.weighting,
    )?;

    // Stages 5 and 6: centrality and composition.
    let scores: Vec<ScoreRecord> = normalized
        .rows
        .iter()
        .zip(&grey.records)
        .map(|(row, record)| {
            compose(
                record.degree,
                row,
                &config.association,
                &config.centrality,
                &config.composite,
            )
        })
        .collect();

    // Stage 7: layers.
    let inputs: Vec<LayerInput<'_>> = graph
        .graph
        .node_weights()
        .zip(&scores)
        .map(|(node, score)| LayerInput {
            id: &node.id,
            influence: score.influence_score,
            association: score.association_score,
        })
        .collect();
    let layers = classify(&inputs, &config.layers);

    for diagnostic in &diagnostics {
        diagnostic.log();
    }
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        diagnostics = diagnostics.len(),
        "scoring complete"
    );

    Ok(ScoreReport {
        config: config.clone(),
        graph,
        stats,
        metrics,
        normalized,
        grey,
        scores,
        layers,
        diagnostics,
    })
}
