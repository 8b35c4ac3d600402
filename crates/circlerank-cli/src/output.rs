//! Output modes shared by every `crk` command.
//!
//! A command renders one serializable value: `json` prints it as-is, `text`
//! prints tab-separated lines for `cut` and `awk`, and `pretty` prints
//! aligned tables for a terminal. Errors follow the same mode on stderr.
//!
//! The mode comes from `--format` (or the hidden `--json`), then the
//! `FORMAT` environment variable, then whether stdout is a terminal.

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Width of the rule under pretty headings.
pub const PRETTY_RULE_WIDTH: usize = 72;

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// `key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<18} {}", format!("{key}:"), value.as_ref())
}

/// How a command renders its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Aligned tables and sections.
    Pretty,
    /// Tab-separated lines.
    Text,
    /// The serialized value.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Parse a `FORMAT` value, ignoring case; unknown values are `None`.
    fn from_env_value(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value.trim(), true).ok()
    }
}

fn pick_mode(
    flag: Option<OutputMode>,
    json: bool,
    format_env: Option<&str>,
    stdout_is_tty: bool,
) -> OutputMode {
    flag.or_else(|| json.then_some(OutputMode::Json))
        .or_else(|| format_env.and_then(OutputMode::from_env_value))
        .unwrap_or(if stdout_is_tty {
            OutputMode::Pretty
        } else {
            OutputMode::Text
        })
}

/// Resolve the mode for this process from flags, `FORMAT` and the terminal.
pub fn resolve_output_mode(flag: Option<OutputMode>, json: bool) -> OutputMode {
    let format_env = std::env::var("FORMAT").ok();
    pick_mode(flag, json, format_env.as_deref(), io::stdout().is_terminal())
}

/// Render a serializable value to `w` with explicit pretty/text renderers.
pub fn render_mode_to<T: Serialize>(
    w: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, value)?;
            writeln!(w)?;
        }
        OutputMode::Text => text_fn(value, w)?,
        OutputMode::Pretty => pretty_fn(value, w)?,
    }
    Ok(())
}

/// [`render_mode_to`] on stdout.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_mode_to(&mut out, mode, value, text_fn, pretty_fn)
}

/// A failed command, ready to render.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    /// What to try next, when the failure has a known remedy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Stable `E####` code for scoring-engine failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }
}

impl From<&anyhow::Error> for CliError {
    /// Keeps the full context chain as the message, and the code and hint
    /// of a [`circlerank_core::Error`] anywhere in the chain.
    fn from(err: &anyhow::Error) -> Self {
        let mut cli = Self::new(format!("{err:#}"));
        if let Some(core) = err.downcast_ref::<circlerank_core::Error>() {
            let code = core.code();
            cli.error_code = Some(code.code().to_string());
            cli.suggestion = code.hint().map(str::to_string);
        }
        cli
    }
}

fn render_error_to(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *w, &wrapper)?;
            writeln!(w)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match error.error_code {
                Some(ref code) => writeln!(w, "error[{code}]: {}", error.message)?,
                None => writeln!(w, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(w, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    render_error_to(&mut out, mode, error)
}
