//! Non-fatal conditions reported alongside scores.
//!
//! Fatal problems are [`crate::Error`]s and abort the run. Everything here
//! lets the computation proceed with a documented fallback, but is surfaced
//! in the output document and logged at `warn` level.

use serde::Serialize;
use tracing::warn;

use crate::graph::build::LoadIssue;
use crate::metrics::Metric;

/// A recoverable condition detected during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Too few nodes, no relation weight, or constant metrics. Degenerate
    /// fallbacks (normalized value 1.0, unit grey coefficients) apply.
    DegenerateInput {
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        metrics: Vec<Metric>,
    },
    /// PageRank hit its iteration cap; the last iterate was used.
    Convergence {
        message: String,
        iterations: usize,
        residual: f64,
    },
    /// Links with an unknown endpoint were dropped.
    DroppedEdges {
        message: String,
        links: Vec<usize>,
    },
    /// Invalid link weights were clamped to 0.
    ClampedWeights {
        message: String,
        links: Vec<usize>,
    },
    /// Self-referencing links were dropped.
    SelfLoops {
        message: String,
        links: Vec<usize>,
    },
    /// Engagement rows that matched no node.
    UnmatchedEngagement {
        message: String,
        keys: Vec<String>,
    },
}

impl Diagnostic {
    /// Stable snake_case kind, matching the serialized `kind` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DegenerateInput { .. } => "degenerate_input",
            Self::Convergence { .. } => "convergence",
            Self::DroppedEdges { .. } => "dropped_edges",
            Self::ClampedWeights { .. } => "clamped_weights",
            Self::SelfLoops { .. } => "self_loops",
            Self::UnmatchedEngagement { .. } => "unmatched_engagement",
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::DegenerateInput { message, .. }
            | Self::Convergence { message, .. }
            | Self::DroppedEdges { message, .. }
            | Self::ClampedWeights { message, .. }
            | Self::SelfLoops { message, .. }
            | Self::UnmatchedEngagement { message, .. } => message,
        }
    }

    pub(crate) fn degenerate(message: impl Into<String>, metrics: Vec<Metric>) -> Self {
        Self::DegenerateInput {
            message: message.into(),
            metrics,
        }
    }

    pub(crate) fn convergence(iterations: usize, residual: f64, tolerance: f64) -> Self {
        Self::Convergence {
            message: format!(
                "pagerank stopped after {iterations} iterations with residual {residual:.3e} (tolerance {tolerance:.1e})"
            ),
            iterations,
            residual,
        }
    }

    pub(crate) fn unmatched_engagement(keys: Vec<String>) -> Self {
        Self::UnmatchedEngagement {
            message: format!("{} engagement row(s) matched no node", keys.len()),
            keys,
        }
    }

    /// Emit this diagnostic as a `warn` event.
    pub fn log(&self) {
        warn!(kind = self.kind(), "{}", self.message());
    }
}

/// Summarize loader issues as one diagnostic per issue kind.
#[must_use]
pub fn from_load_issues(issues: &[LoadIssue]) -> Vec<Diagnostic> {
    let mut dangling = Vec::new();
    let mut clamped = Vec::new();
    let mut loops = Vec::new();
    for issue in issues {
        match issue {
            LoadIssue::DanglingReference { link_index, .. } => dangling.push(*link_index),
            LoadIssue::InvalidWeight { link_index, .. } => clamped.push(*link_index),
            LoadIssue::SelfLoop { link_index, .. } => loops.push(*link_index),
        }
    }

    let mut out = Vec::new();
    if !dangling.is_empty() {
        out.push(Diagnostic::DroppedEdges {
            message: format!("dropped {} link(s) referencing unknown nodes", dangling.len()),
            links: dangling,
        });
    }
    if !clamped.is_empty() {
        out.push(Diagnostic::ClampedWeights {
            message: format!("clamped {} invalid link weight(s) to 0", clamped.len()),
            links: clamped,
        });
    }
    if !loops.is_empty() {
        out.push(Diagnostic::SelfLoops {
            message: format!("dropped {} self-referencing link(s)", loops.len()),
            links: loops,
        });
    }
    out
}
