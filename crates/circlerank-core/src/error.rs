use std::fmt;

/// Fatal errors raised by the scoring pipeline.
///
/// Any of these aborts the run before output is produced. Recoverable
/// conditions (clamped weights, dropped edges, degenerate metrics,
/// non-convergence) are reported as [`crate::diagnostics::Diagnostic`]
/// values instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Malformed or missing required fields in the input document.
    #[error("schema error at `{field}`: {reason}")]
    Schema { field: String, reason: String },

    /// An edge references a node id that is not in the node set
    /// (raised only under the strict reference policy).
    #[error("edge {source_id} -> {target_id} references unknown node `{missing}`")]
    Referential {
        source_id: String,
        target_id: String,
        missing: String,
    },

    /// A configuration value is outside its documented range.
    #[error("invalid configuration `{key}`: {reason}")]
    Config { key: String, reason: String },

    /// The input could not be parsed as JSON at all.
    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    /// A config file exists but is not valid TOML for [`crate::config::ScoringConfig`].
    #[error("failed to parse config {path}: {message}")]
    ConfigFile { path: String, message: String },

    /// Reading an input or config file failed.
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}

impl Error {
    pub(crate) fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Schema { .. } => ErrorCode::SchemaInvalid,
            Self::Referential { .. } => ErrorCode::DanglingReference,
            Self::Config { .. } => ErrorCode::InvalidConfig,
            Self::Parse { .. } => ErrorCode::ParseFailed,
            Self::ConfigFile { .. } => ErrorCode::ConfigParseError,
            Self::Io { .. } => ErrorCode::IoFailure,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SchemaInvalid,
    DanglingReference,
    ParseFailed,
    InvalidConfig,
    ConfigParseError,
    IoFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SchemaInvalid => "E1001",
            Self::DanglingReference => "E1002",
            Self::ParseFailed => "E1003",
            Self::InvalidConfig => "E2001",
            Self::ConfigParseError => "E2002",
            Self::IoFailure => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::SchemaInvalid => "Input graph schema error",
            Self::DanglingReference => "Edge references unknown node",
            Self::ParseFailed => "Input is not valid JSON",
            Self::InvalidConfig => "Invalid scoring configuration",
            Self::ConfigParseError => "Config file parse error",
            Self::IoFailure => "File read/write failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::SchemaInvalid => {
                Some("Every node needs a unique non-empty `id`; every link needs `source` and `target`.")
            }
            Self::DanglingReference => {
                Some("Add the missing node, or drop --strict to skip edges with unknown endpoints.")
            }
            Self::ParseFailed => Some("Check that the file is a JSON document with `nodes` and `links`."),
            Self::InvalidConfig => Some("Weights must be finite and non-negative; see circlerank.toml."),
            Self::ConfigParseError => Some("Fix syntax in circlerank.toml and retry."),
            Self::IoFailure => Some("Check that the path exists and is writable."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorCode};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::SchemaInvalid,
            ErrorCode::DanglingReference,
            ErrorCode::ParseFailed,
            ErrorCode::InvalidConfig,
            ErrorCode::ConfigParseError,
            ErrorCode::IoFailure,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::DanglingReference.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn schema_error_names_the_field() {
        let err = Error::schema("nodes[2].id", "missing or empty");
        assert_eq!(err.to_string(), "schema error at `nodes[2].id`: missing or empty");
        assert_eq!(err.code(), ErrorCode::SchemaInvalid);
    }
}
