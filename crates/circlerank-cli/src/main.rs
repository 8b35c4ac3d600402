#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "crk",
    author,
    version,
    about = "crk: association, centrality and influence scores for relationship graphs",
    long_about = None
)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format for reports and errors.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Scoring",
        about = "Score a graph and write the score document",
        long_about = "Load a graph document, run every scoring stage, and write the full score document as JSON.",
        after_help = "EXAMPLES:\n    # Score to stdout\n    crk score --input graph.json\n\n    # Merge engagement counters and write to a file\n    crk score --input graph.json --engagement metrics.json --output scores.json\n\n    # Weigh centrality more heavily\n    crk score --input graph.json --alpha 0.3 --beta 0.7"
    )]
    Score(cmd::score::ScoreArgs),

    #[command(
        next_help_heading = "Scoring",
        about = "Show nodes ranked by influence",
        long_about = "Score a graph and print the ranking: influence, association, centrality, grey relation and layer.",
        after_help = "EXAMPLES:\n    # Top 20 nodes\n    crk rank --input graph.json --limit 20\n\n    # Also export the top 300 as CSV\n    crk rank --input graph.json --limit 300 --csv out/ranking.csv\n\n    # Emit machine-readable output\n    crk rank --input graph.json --format json"
    )]
    Rank(cmd::rank::RankArgs),

    #[command(
        next_help_heading = "Inspection",
        about = "Validate a graph without scoring it",
        long_about = "Load a graph document, report load issues and graph statistics, and stop before metric extraction.",
        after_help = "EXAMPLES:\n    # Check a graph\n    crk validate --input graph.json\n\n    # Fail on dangling references and invalid weights\n    crk validate --input graph.json --strict"
    )]
    Validate(cmd::validate::ValidateArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    crk completions bash\n\n    # Generate zsh completions\n    crk completions zsh"
    )]
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CIRCLERANK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "circlerank=debug,crk=debug,info"
        } else {
            "circlerank=info,crk=info,warn"
        })
    });

    let format = env::var("CIRCLERANK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Completion script for `crk` in the given shell.
fn write_completions(shell: Shell, out: &mut dyn std::io::Write) -> anyhow::Result<()> {
    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, bin_name, out);
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = cli.output_mode();
    debug!(?output, "resolved output mode");

    let cwd = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("error: cannot determine working directory: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Score(ref args) => cmd::score::run_score(args, output, &cwd),
        Commands::Rank(ref args) => cmd::rank::run_rank(args, output, &cwd),
        Commands::Validate(ref args) => cmd::validate::run_validate(args, output, &cwd),
        Commands::Completions { shell } => write_completions(shell, &mut std::io::stdout()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(output, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
