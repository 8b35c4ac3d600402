use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::info;

use circlerank_core::ScoreDocument;

use crate::cmd::{InputArgs, ScoringArgs, run_pipeline, write_output};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `crk score`.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    /// Write the score document here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// What `crk score --output` reports after writing the document.
#[derive(Debug, Serialize)]
struct WriteSummary {
    output: String,
    node_count: usize,
    edge_count: usize,
    content_hash: String,
    diagnostics: Vec<String>,
}

/// Execute `crk score`.
///
/// Without `--output` the score document itself is the command output and
/// is always JSON. With `--output` the document goes to the file and a
/// short summary is rendered in the selected mode.
pub fn run_score(args: &ScoreArgs, output: OutputMode, cwd: &Path) -> anyhow::Result<()> {
    let report = run_pipeline(&args.input, &args.scoring, cwd)?;
    let document = ScoreDocument::from_report(&report);
    let json = document
        .to_json_pretty()
        .context("serializing score document")?;

    let Some(ref path) = args.output else {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        out.write_all(json.as_bytes())?;
        return Ok(());
    };

    write_output(path, &json)?;
    info!(path = %path.display(), nodes = report.len(), "score document written");

    let summary = WriteSummary {
        output: path.display().to_string(),
        node_count: document.summary.node_count,
        edge_count: document.summary.edge_count,
        content_hash: document.summary.content_hash.clone(),
        diagnostics: document
            .diagnostics
            .iter()
            .map(|d| d.message().to_string())
            .collect(),
    };

    render_mode(
        output,
        &summary,
        |s, w| {
            writeln!(w, "{}\t{}\t{}\t{}", s.output, s.node_count, s.edge_count, s.content_hash)
        },
        |s, w| {
            pretty_section(w, "Score document written")?;
            pretty_kv(w, "Output", &s.output)?;
            pretty_kv(w, "Nodes", s.node_count.to_string())?;
            pretty_kv(w, "Edges", s.edge_count.to_string())?;
            pretty_kv(w, "Content hash", &s.content_hash)?;
            for message in &s.diagnostics {
                writeln!(w, "warning: {message}")?;
            }
            Ok(())
        },
    )
}
