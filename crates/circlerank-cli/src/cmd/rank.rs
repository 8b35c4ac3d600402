use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use circlerank_core::{NodeOutput, RankedNode, ScoreDocument, ranking};

use crate::cmd::{InputArgs, ScoringArgs, run_pipeline, write_output};
use crate::output::{OutputMode, pretty_rule, render_mode};

/// Arguments for `crk rank`.
#[derive(Args, Debug)]
pub struct RankArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    /// Show only the top N nodes.
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Also write the ranked rows, with counters and metric columns, as CSV.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

/// Execute `crk rank`.
pub fn run_rank(args: &RankArgs, output: OutputMode, cwd: &Path) -> anyhow::Result<()> {
    let report = run_pipeline(&args.input, &args.scoring, cwd)?;
    let rows = ranking(&report, args.limit);

    if let Some(ref path) = args.csv {
        let document = ScoreDocument::from_report(&report);
        write_output(path, &ranking_csv(&document, args.limit))?;
        info!(path = %path.display(), rows = rows.len(), "ranking csv written");
    }

    render_mode(output, &rows, |rows, w| render_rank_text(w, rows), |rows, w| {
        render_rank_pretty(w, rows)
    })
}

const CSV_COLUMNS: [&str; 21] = [
    "rank",
    "id",
    "name",
    "handle",
    "group",
    "role",
    "followers",
    "influence_score",
    "association_score",
    "centrality_score",
    "grey_relation",
    "association_weight",
    "cross_follow_count",
    "cross_follow_ratio",
    "posts_count",
    "comments_count",
    "likes_count",
    "reposts_count",
    "semantic_ai",
    "pagerank",
    "layer",
];

/// Ranked nodes as CSV, best first. A missing name or handle falls back to the id.
fn ranking_csv(document: &ScoreDocument, limit: Option<usize>) -> String {
    let mut nodes: Vec<&NodeOutput> = document.nodes.iter().collect();
    nodes.sort_by_key(|n| n.rank);

    let mut out = CSV_COLUMNS.join(",");
    out.push('\n');
    for node in nodes.into_iter().take(limit.unwrap_or(usize::MAX)) {
        let fields = [
            node.rank.to_string(),
            csv_field(&node.id),
            csv_field(node.name.as_deref().unwrap_or(&node.id)),
            csv_field(node.handle.as_deref().unwrap_or(&node.id)),
            csv_field(node.group.as_deref().unwrap_or_default()),
            csv_field(node.role.as_deref().unwrap_or_default()),
            node.followers_count.to_string(),
            node.influence_score.to_string(),
            node.association_score.to_string(),
            node.centrality_score.to_string(),
            node.grey_relation.to_string(),
            node.association_weight.to_string(),
            node.cross_follow_count.to_string(),
            node.cross_follow_ratio.to_string(),
            node.posts_count.to_string(),
            node.comments_count.to_string(),
            node.likes_count.to_string(),
            node.reposts_count.to_string(),
            node.semantic_ai.to_string(),
            node.pagerank.to_string(),
            node.layer.to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Quote a field that holds a comma, quote or line break; inner quotes double.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn display_name(row: &RankedNode) -> &str {
    row.name
        .as_deref()
        .or(row.handle.as_deref())
        .unwrap_or(&row.id)
}

fn render_rank_text(w: &mut dyn Write, rows: &[RankedNode]) -> io::Result<()> {
    writeln!(w, "rank\tid\tinfluence\tassociation\tcentrality\tgrey\tlayer")?;
    for row in rows {
        writeln!(
            w,
            "{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{}",
            row.rank,
            row.id,
            row.influence_score,
            row.association_score,
            row.centrality_score,
            row.grey_relation,
            row.layer
        )?;
    }
    Ok(())
}

fn render_rank_pretty(w: &mut dyn Write, rows: &[RankedNode]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(w, "No nodes to rank.");
    }
    writeln!(
        w,
        "{:>4}  {:<24} {:>9} {:>11} {:>10}  {}",
        "#", "NODE", "INFLUENCE", "ASSOCIATION", "CENTRALITY", "LAYER"
    )?;
    pretty_rule(w)?;
    for row in rows {
        writeln!(
            w,
            "{:>4}  {:<24} {:>9.4} {:>11.4} {:>10.4}  {}",
            row.rank,
            truncate(display_name(row), 24),
            row.influence_score,
            row.association_score,
            row.centrality_score,
            row.layer
        )?;
    }
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
