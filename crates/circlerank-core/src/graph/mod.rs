//! Relation graph ingestion.
//!
//! # Overview
//!
//! This module turns a raw JSON node/link document into the petgraph-backed
//! [`ScoredGraph`] that every metric in [`crate::metrics`] reads.
//!
//! ## Pipeline
//!
//! ```text
//! graph.json (+ optional engagement.json)
//!        ↓  load::GraphDocument::parse()
//! GraphDocument (typed nodes, raw links)
//!        ↓  engagement::EngagementTable::apply()
//! GraphDocument with overridden counters
//!        ↓  build::ScoredGraph::from_document()
//! ScoredGraph (canonical DiGraph, aggregated links, load issues)
//!        ↓  stats::GraphStats::from_graph()
//! GraphStats (density, components, reciprocal pairs, …)
//! ```
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! use circlerank_core::graph::{GraphDocument, LoaderConfig, ScoredGraph, GraphStats};
//!
//! let doc = GraphDocument::parse(&std::fs::read_to_string("graph.json")?)?;
//! let sg = ScoredGraph::from_document(doc, &LoaderConfig::default())?;
//! let stats = GraphStats::from_graph(&sg);
//! println!("nodes={} edges={} density={:.3}", stats.node_count, stats.edge_count, stats.density);
//! ```

pub mod build;
pub mod engagement;
pub mod load;
pub mod stats;

pub use build::{
    LinkRecord, LoadIssue, LoaderConfig, ReferencePolicy, ScoredGraph, WeightPolicy,
    saturating_sum,
};
pub use engagement::{EngagementCounts, EngagementMerge, EngagementTable};
pub use load::{Counters, GraphDocument, NodeRecord, RawLink, RawWeight};
pub use stats::GraphStats;
