use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use circlerank_core::graph::LoadIssue;
use circlerank_core::{GraphStats, ScoredGraph};

use crate::cmd::{InputArgs, load_documents, resolve_config};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `crk validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    input: String,
    input_link_count: usize,
    content_hash: String,
    stats: GraphStats,
    issues: Vec<LoadIssue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unmatched_engagement: Vec<String>,
}

/// Execute `crk validate`: load and build the graph, then stop.
pub fn run_validate(args: &ValidateArgs, output: OutputMode, cwd: &Path) -> anyhow::Result<()> {
    let config = resolve_config(&args.input, cwd)?;
    let (mut document, engagement) = load_documents(&args.input)?;

    let unmatched_engagement = engagement
        .map(|table| table.apply(&mut document.nodes).unmatched)
        .unwrap_or_default();

    let graph = ScoredGraph::from_document(document, &config.loader)
        .with_context(|| format!("validating {}", args.input.input.display()))?;

    let report = ValidationReport {
        input: args.input.input.display().to_string(),
        input_link_count: graph.input_link_count,
        content_hash: graph.content_hash.clone(),
        stats: GraphStats::from_graph(&graph),
        issues: graph.issues.clone(),
        unmatched_engagement,
    };

    render_mode(output, &report, render_validate_text, render_validate_pretty)
}

fn issue_line(issue: &LoadIssue) -> String {
    match issue {
        LoadIssue::InvalidWeight {
            link_index,
            source,
            target,
            raw,
        } => format!("links[{link_index}] {source} -> {target}: weight {raw} clamped to 0"),
        LoadIssue::DanglingReference {
            link_index,
            source,
            target,
            missing,
        } => format!("links[{link_index}] {source} -> {target}: unknown node `{missing}`, dropped"),
        LoadIssue::SelfLoop { link_index, id } => {
            format!("links[{link_index}] {id} -> {id}: self-link dropped")
        }
    }
}

fn render_validate_text(report: &ValidationReport, w: &mut dyn Write) -> io::Result<()> {
    let stats = &report.stats;
    writeln!(w, "nodes\t{}", stats.node_count)?;
    writeln!(w, "edges\t{}", stats.edge_count)?;
    writeln!(w, "input_links\t{}", report.input_link_count)?;
    writeln!(w, "components\t{}", stats.weakly_connected_component_count)?;
    writeln!(w, "isolated\t{}", stats.isolated_node_count)?;
    writeln!(w, "content_hash\t{}", report.content_hash)?;
    for issue in &report.issues {
        writeln!(w, "issue\t{}", issue_line(issue))?;
    }
    for key in &report.unmatched_engagement {
        writeln!(w, "unmatched_engagement\t{key}")?;
    }
    Ok(())
}

fn render_validate_pretty(report: &ValidationReport, w: &mut dyn Write) -> io::Result<()> {
    let stats = &report.stats;
    pretty_section(w, &format!("Graph {}", report.input))?;
    pretty_kv(w, "Nodes", stats.node_count.to_string())?;
    pretty_kv(
        w,
        "Edges",
        format!("{} (from {} links)", stats.edge_count, report.input_link_count),
    )?;
    pretty_kv(w, "Density", format!("{:.4}", stats.density))?;
    pretty_kv(w, "Reciprocal pairs", stats.reciprocal_pair_count.to_string())?;
    pretty_kv(w, "Components", stats.weakly_connected_component_count.to_string())?;
    pretty_kv(w, "Isolated nodes", stats.isolated_node_count.to_string())?;
    pretty_kv(w, "Total weight", format!("{:.4}", stats.total_weight))?;
    pretty_kv(w, "Content hash", &report.content_hash)?;

    if report.issues.is_empty() && report.unmatched_engagement.is_empty() {
        writeln!(w)?;
        return writeln!(w, "✓ no issues");
    }
    writeln!(w)?;
    pretty_section(w, &format!("Issues ({})", report.issues.len()))?;
    for issue in &report.issues {
        writeln!(w, "  {}", issue_line(issue))?;
    }
    if !report.unmatched_engagement.is_empty() {
        writeln!(
            w,
            "  engagement rows without a node: {}",
            report.unmatched_engagement.join(", ")
        )?;
    }
    Ok(())
}
