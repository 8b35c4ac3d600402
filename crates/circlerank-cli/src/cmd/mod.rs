//! Command handlers and the argument groups they share.

pub mod rank;
pub mod score;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, ValueEnum};
use tracing::info;

use circlerank_core::graph::{EngagementTable, GraphDocument, LoaderConfig};
use circlerank_core::{Error, LayerPolicy, ScoreReport, ScoringConfig, load_config, score_graph};

/// Input documents and loader strictness.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Graph document (JSON with `nodes` and `links`).
    #[arg(long, short)]
    pub input: PathBuf,

    /// Engagement document whose counters override those on the nodes.
    #[arg(long)]
    pub engagement: Option<PathBuf>,

    /// Fail on dangling references and invalid weights instead of dropping or clamping.
    #[arg(long)]
    pub strict: bool,

    /// Scoring config file (default: ./circlerank.toml, then the user config dir).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Layer policy selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayerPolicyArg {
    Quantile,
    CutPoints,
}

/// Overrides applied on top of the loaded config.
#[derive(Args, Debug, Clone, Default)]
pub struct ScoringArgs {
    /// Weight of the association score in the influence blend.
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Weight of the centrality score in the influence blend.
    #[arg(long)]
    pub beta: Option<f64>,

    /// How influence scores are split into layers.
    #[arg(long, value_enum)]
    pub layer_policy: Option<LayerPolicyArg>,

    /// Influence thresholds for core, strong and medium (implies `--layer-policy cut-points`).
    #[arg(long, value_delimiter = ',', value_name = "CORE,STRONG,MEDIUM")]
    pub cut_points: Option<Vec<f64>>,
}

impl ScoringArgs {
    /// Apply command-line overrides to `config`.
    ///
    /// # Errors
    ///
    /// Fails when the layer flags conflict or `--cut-points` does not
    /// carry exactly three values.
    pub fn apply(&self, config: &mut ScoringConfig) -> anyhow::Result<()> {
        if let Some(alpha) = self.alpha {
            config.composite.alpha = alpha;
        }
        if let Some(beta) = self.beta {
            config.composite.beta = beta;
        }

        let cut_points = match self.cut_points.as_deref() {
            None => None,
            Some(&[core, strong, medium]) => Some(LayerPolicy::CutPoints {
                core,
                strong,
                medium,
            }),
            Some(other) => bail!(
                "--cut-points takes exactly three values (core,strong,medium), got {}",
                other.len()
            ),
        };

        match (self.layer_policy, cut_points) {
            (None, None) => {}
            (None | Some(LayerPolicyArg::CutPoints), Some(policy)) => config.layers = policy,
            (Some(LayerPolicyArg::Quantile), Some(_)) => {
                bail!("--cut-points cannot be combined with --layer-policy quantile")
            }
            (Some(LayerPolicyArg::Quantile), None) => {
                if !matches!(config.layers, LayerPolicy::Quantile { .. }) {
                    config.layers = LayerPolicy::default();
                }
            }
            (Some(LayerPolicyArg::CutPoints), None) => {
                if !matches!(config.layers, LayerPolicy::CutPoints { .. }) {
                    bail!("--layer-policy cut-points needs --cut-points or a [layers] cut-points section in the config");
                }
            }
        }
        Ok(())
    }
}

/// Read a file, reporting failures as [`Error::Io`].
pub fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .map_err(|err| Error::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })
        .with_context(|| format!("reading {}", path.display()))
}

/// Write `contents` to `path`, creating missing parent directories.
pub fn write_output(path: &Path, contents: &str) -> anyhow::Result<()> {
    let io_error = |err: std::io::Error| Error::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(io_error)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    std::fs::write(path, contents)
        .map_err(io_error)
        .with_context(|| format!("writing {}", path.display()))
}

/// Parse the graph and optional engagement documents.
pub fn load_documents(
    input: &InputArgs,
) -> anyhow::Result<(GraphDocument, Option<EngagementTable>)> {
    let graph_text = read_text(&input.input)?;
    let document = GraphDocument::parse(&graph_text)
        .with_context(|| format!("loading graph {}", input.input.display()))?;

    let engagement = match input.engagement {
        Some(ref path) => {
            let text = read_text(path)?;
            let table = EngagementTable::parse(&text)
                .with_context(|| format!("loading engagement {}", path.display()))?;
            Some(table)
        }
        None => None,
    };
    Ok((document, engagement))
}

/// Load the config for this invocation; `--strict` overrides the loader section.
pub fn resolve_config(input: &InputArgs, cwd: &Path) -> anyhow::Result<ScoringConfig> {
    let (mut config, origin) = load_config(input.config.as_deref(), cwd)?;
    if let Some(path) = origin {
        info!(path = %path.display(), "using config file");
    }
    if input.strict {
        config.loader = LoaderConfig::strict();
    }
    Ok(config)
}

/// Load inputs, resolve config with overrides, and run the full pipeline.
pub fn run_pipeline(
    input: &InputArgs,
    scoring: &ScoringArgs,
    cwd: &Path,
) -> anyhow::Result<ScoreReport> {
    let mut config = resolve_config(input, cwd)?;
    scoring.apply(&mut config)?;
    let (document, engagement) = load_documents(input)?;
    let report = score_graph(document, engagement.as_ref(), &config)
        .with_context(|| format!("scoring {}", input.input.display()))?;
    Ok(report)
}
