//! Grey relational analysis against an ideal reference sequence.
//!
//! # Algorithm
//!
//! Each node's normalized metric vector `x_i` is compared with the
//! reference sequence `x_0` (all ones, "maximally associated"):
//!
//! ```text
//! Δ_i(k) = |x_0(k) - x_i(k)|
//! ξ_i(k) = (Δmin + ρ·Δmax) / (Δ_i(k) + ρ·Δmax)
//! γ_i    = Σ_k w_k · ξ_i(k)
//! ```
//!
//! `Δmin` and `Δmax` are taken over every node and dimension. `ρ` is the
//! distinguishing coefficient in `(0, 1]`. When `Δmax == Δmin` every
//! coefficient is 1.0.
//!
//! The dimension weights `w_k` are uniform for [`GreyWeighting::Mean`], or
//! proportional to the coefficient of variation of each dimension for
//! [`GreyWeighting::Variation`]. Both sum to 1, so `γ_i ∈ (0, 1]`.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::metrics::{Metric, MetricVector};

/// Dimension weights below this are treated as zero.
const VARIATION_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How per-dimension coefficients are aggregated into a grey degree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GreyWeighting {
    /// Arithmetic mean.
    #[default]
    Mean,
    /// Weights proportional to each dimension's coefficient of variation,
    /// so dimensions that discriminate between nodes count more. Uniform
    /// when no dimension varies.
    Variation,
}

/// Grey relational analysis settings (`[grey]` in config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreyConfig {
    /// Distinguishing coefficient ρ ∈ (0, 1]. Default: 0.5.
    #[serde(default = "default_rho")]
    pub rho: f64,
    #[serde(default)]
    pub weighting: GreyWeighting,
    /// Metric dimensions compared against the reference sequence.
    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<Metric>,
}

const fn default_rho() -> f64 {
    0.5
}

fn default_dimensions() -> Vec<Metric> {
    vec![
        Metric::WeightedDegree,
        Metric::Reciprocity,
        Metric::InteractionStrength,
        Metric::DegreeCentrality,
        Metric::Bridging,
        Metric::CrossFollowRatio,
        Metric::EngagementComposite,
        Metric::SemanticAffinity,
    ]
}

impl Default for GreyConfig {
    fn default() -> Self {
        Self {
            rho: default_rho(),
            weighting: GreyWeighting::default(),
            dimensions: default_dimensions(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference sequence
// ---------------------------------------------------------------------------

/// The ideal profile every node is compared against.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSequence {
    values: Vec<f64>,
}

impl ReferenceSequence {
    /// All-ones reference with `dimensions` entries.
    #[must_use]
    pub fn ideal(dimensions: usize) -> Self {
        Self {
            values: vec![1.0; dimensions],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Grey relational result for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct GreyRecord {
    /// `ξ(k)` per dimension, in configured dimension order.
    pub coefficients: Vec<f64>,
    /// Aggregated grey relational degree `γ`.
    pub degree: f64,
}

/// Grey relational result for a whole graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GreyAnalysis {
    /// One record per node in canonical order.
    pub records: Vec<GreyRecord>,
    /// Dimension weights used for aggregation (sum to 1).
    pub weights: Vec<f64>,
    pub delta_min: f64,
    pub delta_max: f64,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Run grey relational analysis over normalized rows.
///
/// # Errors
///
/// Returns [`Error::Config`] if `dimensions` is empty or does not match the
/// reference length, or if `rho` is outside `(0, 1]`.
#[instrument(skip_all, fields(nodes = rows.len(), dimensions = dimensions.len()))]
pub fn grey_relational(
    rows: &[MetricVector],
    dimensions: &[Metric],
    reference: &ReferenceSequence,
    rho: f64,
    weighting: GreyWeighting,
) -> Result<GreyAnalysis> {
    if dimensions.is_empty() {
        return Err(Error::config("grey.dimensions", "at least one dimension is required"));
    }
    if reference.len() != dimensions.len() {
        return Err(Error::config(
            "grey.dimensions",
            format!(
                "reference has {} entries but {} dimensions were given",
                reference.len(),
                dimensions.len()
            ),
        ));
    }
    if !(rho > 0.0 && rho <= 1.0) {
        return Err(Error::config("grey.rho", format!("must be in (0, 1], got {rho}")));
    }

    let matrix: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| dimensions.iter().map(|&m| row.get(m)).collect())
        .collect();

    let deltas: Vec<Vec<f64>> = matrix
        .iter()
        .map(|x| {
            reference
                .values()
                .iter()
                .zip(x)
                .map(|(x0, xi)| (x0 - xi).abs())
                .collect()
        })
        .collect();

    let flat = || deltas.iter().flatten().copied();
    let delta_min = flat().fold(f64::INFINITY, f64::min);
    let delta_max = flat().fold(f64::NEG_INFINITY, f64::max);
    let flat_range = rows.is_empty() || (delta_max - delta_min).abs() <= f64::EPSILON;

    let weights = dimension_weights(&matrix, dimensions.len(), weighting);

    let records = deltas
        .iter()
        .map(|row| {
            let coefficients: Vec<f64> = row
                .iter()
                .map(|&delta| {
                    if flat_range {
                        1.0
                    } else {
                        (delta_min + rho * delta_max) / (delta + rho * delta_max)
                    }
                })
                .collect();
            let degree = coefficients
                .iter()
                .zip(&weights)
                .map(|(xi, w)| xi * w)
                .sum::<f64>()
                .clamp(0.0, 1.0);
            GreyRecord {
                coefficients,
                degree,
            }
        })
        .collect();

    let (delta_min, delta_max) = if rows.is_empty() {
        (0.0, 0.0)
    } else {
        (delta_min, delta_max)
    };
    debug!(delta_min, delta_max, ?weighting, "grey relational analysis done");

    Ok(GreyAnalysis {
        records,
        weights,
        delta_min,
        delta_max,
    })
}

#[allow(clippy::cast_precision_loss)]
fn dimension_weights(matrix: &[Vec<f64>], dims: usize, weighting: GreyWeighting) -> Vec<f64> {
    let uniform = vec![1.0 / dims as f64; dims];
    if weighting == GreyWeighting::Mean || matrix.len() < 2 {
        return uniform;
    }

    let n = matrix.len() as f64;
    let cvs: Vec<f64> = (0..dims)
        .map(|k| {
            let mean = matrix.iter().map(|row| row[k]).sum::<f64>() / n;
            if mean <= VARIATION_EPSILON {
                return 0.0;
            }
            let var = matrix.iter().map(|row| (row[k] - mean).powi(2)).sum::<f64>() / n;
            var.sqrt() / mean
        })
        .collect();

    let total: f64 = cvs.iter().sum();
    if total <= VARIATION_EPSILON {
        return uniform;
    }
    cvs.iter().map(|cv| cv / total).collect()
}
