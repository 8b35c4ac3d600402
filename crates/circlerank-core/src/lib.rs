#![forbid(unsafe_code)]
//! circlerank-core library.
//!
//! Scores the nodes of an attributed relation graph: an association score
//! (grey relational analysis against an ideal profile), a centrality score
//! (weighted PageRank blended with degree and bridging), a composite
//! influence score, and a layer label.
//!
//! ```rust,ignore
//! use circlerank_core::{ScoringConfig, ScoreDocument, score_json};
//!
//! let report = score_json(&graph_json, None, &ScoringConfig::default())?;
//! println!("{}", ScoreDocument::from_report(&report).to_json_pretty()?);
//! ```
//!
//! # Conventions
//!
//! - **Errors**: Use [`Error`] and the crate [`Result`] alias for fallible
//!   operations. Recoverable conditions are [`Diagnostic`]s, not errors.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`); every
//!   pipeline stage runs inside an `#[instrument]` span.
//! - **Ordering**: Per-node vectors are indexed by canonical node position
//!   (`NodeIndex::index()`, nodes sorted by id).

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod score;

pub use config::{ScoringConfig, load_config};
pub use diagnostics::Diagnostic;
pub use error::{Error, ErrorCode, Result};
pub use graph::{EngagementTable, GraphDocument, GraphStats, LoaderConfig, ScoredGraph};
pub use metrics::Metric;
pub use pipeline::{ScoreReport, score_graph, score_json};
pub use report::{NodeOutput, RankedNode, ScoreDocument, ranking};
pub use score::{Layer, LayerPolicy};
