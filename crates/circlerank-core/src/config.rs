//! Scoring configuration.
//!
//! Every tunable of the pipeline lives in [`ScoringConfig`], loaded from
//! TOML. Each section and each key is optional; absent values take their
//! documented defaults.
//!
//! ```toml
//! [composite]
//! alpha = 0.6
//! beta = 0.4
//!
//! [grey]
//! rho = 0.5
//! weighting = "variation"
//!
//! [layers]
//! policy = "cut-points"
//! core = 0.75
//! strong = 0.5
//! medium = 0.25
//! ```
//!
//! Lookup order for [`load_config`]: an explicit path, `./circlerank.toml`,
//! `<config dir>/circlerank/config.toml`, then built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::build::LoaderConfig;
use crate::metrics::{EngagementWeights, PageRankConfig, SemanticConfig};
use crate::score::{AssociationWeights, CentralityWeights, CompositeWeights, GreyConfig, LayerPolicy};

/// File name searched for in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "circlerank.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub engagement: EngagementWeights,
    #[serde(default)]
    pub semantic: SemanticConfig,
    #[serde(default)]
    pub grey: GreyConfig,
    #[serde(default)]
    pub association: AssociationWeights,
    #[serde(default)]
    pub pagerank: PageRankConfig,
    #[serde(default)]
    pub centrality: CentralityWeights,
    #[serde(default)]
    pub composite: CompositeWeights,
    #[serde(default)]
    pub layers: LayerPolicy,
}

impl ScoringConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigFile`] when the text is not valid TOML for
    /// this structure. Values are not range-checked; see [`Self::validate`].
    pub fn from_toml(text: &str, origin: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| Error::ConfigFile {
            path: origin.to_string(),
            message: err.to_string(),
        })
    }

    /// Reject values outside their documented ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        non_negative("composite.alpha", self.composite.alpha)?;
        non_negative("composite.beta", self.composite.beta)?;

        for (key, value) in self.engagement.entries() {
            non_negative(&format!("engagement.{key}"), value)?;
        }
        for (key, value) in self.association.entries() {
            non_negative(&format!("association.{key}"), value)?;
        }
        for (key, value) in self.centrality.entries() {
            non_negative(&format!("centrality.{key}"), value)?;
        }

        if !(self.grey.rho > 0.0 && self.grey.rho <= 1.0) {
            return Err(Error::config(
                "grey.rho",
                format!("must be in (0, 1], got {}", self.grey.rho),
            ));
        }
        if self.grey.dimensions.is_empty() {
            return Err(Error::config("grey.dimensions", "at least one dimension is required"));
        }

        let damping = self.pagerank.damping;
        if !(0.0..1.0).contains(&damping) {
            return Err(Error::config(
                "pagerank.damping",
                format!("must be in [0, 1), got {damping}"),
            ));
        }
        if !self.pagerank.tolerance.is_finite() || self.pagerank.tolerance <= 0.0 {
            return Err(Error::config(
                "pagerank.tolerance",
                format!("must be a positive number, got {}", self.pagerank.tolerance),
            ));
        }
        if self.pagerank.max_iter == 0 {
            return Err(Error::config("pagerank.max_iter", "must be at least 1"));
        }

        if !self.semantic.saturation.is_finite() || self.semantic.saturation <= 0.0 {
            return Err(Error::config(
                "semantic.saturation",
                format!("must be a positive number, got {}", self.semantic.saturation),
            ));
        }

        self.layers.validate()
    }
}

fn non_negative(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::config(
            key,
            format!("must be a finite non-negative number, got {value}"),
        ))
    }
}

/// Candidate config files in lookup order (explicit path excluded).
#[must_use]
pub fn config_search_paths(cwd: &Path) -> Vec<PathBuf> {
    let mut paths = vec![cwd.join(PROJECT_CONFIG_FILE)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("circlerank").join("config.toml"));
    }
    paths
}

/// Load and validate configuration.
///
/// An explicit path must exist. Otherwise the first existing file from
/// [`config_search_paths`] is used, or the defaults when none exists.
/// Returns the config and the file it came from.
///
/// # Errors
///
/// Returns [`Error::Io`] if a config file cannot be read,
/// [`Error::ConfigFile`] if it is not valid TOML, and [`Error::Config`] if
/// a value is out of range.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<(ScoringConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => config_search_paths(cwd).into_iter().find(|p| p.is_file()),
    };

    let Some(path) = path else {
        debug!("no config file found, using defaults");
        return Ok((ScoringConfig::default(), None));
    };

    let content = std::fs::read_to_string(&path).map_err(|err| Error::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    let config = ScoringConfig::from_toml(&content, &path.display().to_string())?;
    config.validate()?;
    debug!(path = %path.display(), "loaded config");
    Ok((config, Some(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build::ReferencePolicy;
    use crate::metrics::Metric;
    use crate::score::GreyWeighting;

    #[test]
    fn defaults_are_valid() {
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        let config = ScoringConfig::from_toml("", "inline").expect("valid");
        assert_eq!(config, ScoringConfig::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = ScoringConfig::from_toml(
            r#"
[composite]
alpha = 0.7

[grey]
weighting = "variation"
dimensions = ["weighted_degree", "pagerank"]

[loader]
references = "strict"
"#,
            "inline",
        )
        .expect("valid");
        assert!((config.composite.alpha - 0.7).abs() < f64::EPSILON);
        assert!((config.composite.beta - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.grey.weighting, GreyWeighting::Variation);
        assert_eq!(config.grey.dimensions, vec![Metric::WeightedDegree, Metric::PageRank]);
        assert!((config.grey.rho - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.loader.references, ReferencePolicy::Strict);
        assert_eq!(config.layers, LayerPolicy::default());
    }

    #[test]
    fn negative_alpha_is_rejected() {
        let mut config = ScoringConfig::default();
        config.composite.alpha = -0.1;
        let err = config.validate().expect_err("must fail");
        assert!(matches!(err, Error::Config { ref key, .. } if key == "composite.alpha"));
    }

    #[test]
    fn nan_engagement_weight_is_rejected() {
        let mut config = ScoringConfig::default();
        config.engagement.likes = f64::NAN;
        let err = config.validate().expect_err("must fail");
        assert!(matches!(err, Error::Config { ref key, .. } if key == "engagement.likes"));
    }

    #[test]
    fn damping_of_one_is_rejected() {
        let mut config = ScoringConfig::default();
        config.pagerank.damping = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_names_the_file() {
        let err = ScoringConfig::from_toml("[composite\nalpha = 1", "my.toml").expect_err("must fail");
        assert!(matches!(err, Error::ConfigFile { ref path, .. } if path == "my.toml"));
    }

    #[test]
    fn project_file_is_found_in_cwd() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[composite]\nalpha = 1.0\nbeta = 0.0\n",
        )
        .expect("write config");

        let (config, origin) = load_config(None, dir.path()).expect("valid");
        assert!((config.composite.alpha - 1.0).abs() < f64::EPSILON);
        assert_eq!(origin, Some(dir.path().join(PROJECT_CONFIG_FILE)));
    }

    #[test]
    fn missing_explicit_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_config(Some(&dir.path().join("nope.toml")), dir.path()).expect_err("must fail");
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn invalid_values_in_file_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[layers]\npolicy = \"cut-points\"\ncore = 0.1\nstrong = 0.5\nmedium = 0.0\n")
            .expect("write config");
        let err = load_config(Some(&path), dir.path()).expect_err("must fail");
        assert!(matches!(err, Error::Config { .. }));
    }
}
