//! Association, centrality and influence composition.
//!
//! ```text
//! association = w_g·grey + w_wd·weighted_degree' + w_r·reciprocity' + w_i·interaction'
//! centrality  = w_p·pagerank' + w_d·degree_centrality' + w_b·bridging'
//! influence   = alpha·association + beta·centrality
//! ```
//!
//! Primed values are normalized to `[0, 1]`. All weights are non-negative,
//! so every score is non-decreasing in each of its inputs and bounded by the
//! sum of its weights (1.0 for the defaults).

use serde::{Deserialize, Serialize};

use crate::metrics::MetricVector;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Association blend (`[association]` in config).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssociationWeights {
    #[serde(default = "default_grey")]
    pub grey: f64,
    #[serde(default = "default_weighted_degree")]
    pub weighted_degree: f64,
    #[serde(default = "default_reciprocity")]
    pub reciprocity: f64,
    #[serde(default = "default_interaction")]
    pub interaction: f64,
}

const fn default_grey() -> f64 {
    0.55
}

const fn default_weighted_degree() -> f64 {
    0.25
}

const fn default_reciprocity() -> f64 {
    0.10
}

const fn default_interaction() -> f64 {
    0.10
}

impl Default for AssociationWeights {
    fn default() -> Self {
        Self {
            grey: default_grey(),
            weighted_degree: default_weighted_degree(),
            reciprocity: default_reciprocity(),
            interaction: default_interaction(),
        }
    }
}

impl AssociationWeights {
    #[must_use]
    pub const fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("grey", self.grey),
            ("weighted_degree", self.weighted_degree),
            ("reciprocity", self.reciprocity),
            ("interaction", self.interaction),
        ]
    }
}

/// Centrality blend (`[centrality]` in config).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentralityWeights {
    #[serde(default = "default_pagerank")]
    pub pagerank: f64,
    #[serde(default = "default_degree")]
    pub degree: f64,
    #[serde(default = "default_bridging")]
    pub bridging: f64,
}

const fn default_pagerank() -> f64 {
    0.50
}

const fn default_degree() -> f64 {
    0.35
}

const fn default_bridging() -> f64 {
    0.15
}

impl Default for CentralityWeights {
    fn default() -> Self {
        Self {
            pagerank: default_pagerank(),
            degree: default_degree(),
            bridging: default_bridging(),
        }
    }
}

impl CentralityWeights {
    #[must_use]
    pub const fn entries(&self) -> [(&'static str, f64); 3] {
        [
            ("pagerank", self.pagerank),
            ("degree", self.degree),
            ("bridging", self.bridging),
        ]
    }
}

/// Influence blend: `influence = alpha*association + beta*centrality`.
///
/// No sum-to-one constraint is enforced, but keeping `alpha + beta = 1`
/// keeps influence scores comparable across runs with different blends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeights {
    #[serde(default = "default_half")]
    pub alpha: f64,
    #[serde(default = "default_half")]
    pub beta: f64,
}

const fn default_half() -> f64 {
    0.5
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            alpha: default_half(),
            beta: default_half(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Final scores for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub association_score: f64,
    pub centrality_score: f64,
    pub influence_score: f64,
}

/// Association score from the grey degree and normalized metrics.
#[must_use]
pub fn association_score(grey: f64, normalized: &MetricVector, weights: &AssociationWeights) -> f64 {
    weights.grey * unit(grey)
        + weights.weighted_degree * unit(normalized.weighted_degree)
        + weights.reciprocity * unit(normalized.reciprocity)
        + weights.interaction * unit(normalized.interaction_strength)
}

/// Centrality score from normalized PageRank, degree centrality and bridging.
#[must_use]
pub fn centrality_score(normalized: &MetricVector, weights: &CentralityWeights) -> f64 {
    weights.pagerank * unit(normalized.pagerank)
        + weights.degree * unit(normalized.degree_centrality)
        + weights.bridging * unit(normalized.bridging)
}

/// `alpha*association + beta*centrality`.
#[must_use]
pub fn influence_score(association: f64, centrality: f64, weights: &CompositeWeights) -> f64 {
    weights.alpha * association + weights.beta * centrality
}

/// Compose all three scores for one node.
#[must_use]
pub fn compose(
    grey: f64,
    normalized: &MetricVector,
    association: &AssociationWeights,
    centrality: &CentralityWeights,
    composite: &CompositeWeights,
) -> ScoreRecord {
    let association_score = association_score(grey, normalized, association);
    let centrality_score = centrality_score(normalized, centrality);
    ScoreRecord {
        association_score,
        centrality_score,
        influence_score: influence_score(association_score, centrality_score, composite),
    }
}

fn unit(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_eq(actual: f64, expected: f64) {
        let tolerance = 1e-10;
        assert!(
            (actual - expected).abs() <= tolerance,
            "actual ({actual}) != expected ({expected})"
        );
    }

    fn ones() -> MetricVector {
        MetricVector {
            weighted_degree: 1.0,
            reciprocity: 1.0,
            interaction_strength: 1.0,
            degree_centrality: 1.0,
            bridging: 1.0,
            cross_follow_ratio: 1.0,
            engagement_composite: 1.0,
            semantic_affinity: 1.0,
            pagerank: 1.0,
        }
    }

    #[test]
    fn default_weights_sum_to_one() {
        let a: f64 = AssociationWeights::default().entries().iter().map(|(_, w)| w).sum();
        let c: f64 = CentralityWeights::default().entries().iter().map(|(_, w)| w).sum();
        assert_approx_eq(a, 1.0);
        assert_approx_eq(c, 1.0);
    }

    #[test]
    fn ideal_node_scores_one() {
        let record = compose(
            1.0,
            &ones(),
            &AssociationWeights::default(),
            &CentralityWeights::default(),
            &CompositeWeights::default(),
        );
        assert_approx_eq(record.association_score, 1.0);
        assert_approx_eq(record.centrality_score, 1.0);
        assert_approx_eq(record.influence_score, 1.0);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn alpha_one_beta_zero_is_association() {
        let weights = CompositeWeights {
            alpha: 1.0,
            beta: 0.0,
        };
        let normalized = MetricVector {
            pagerank: 0.9,
            weighted_degree: 0.3,
            ..MetricVector::default()
        };
        let record = compose(
            0.4,
            &normalized,
            &AssociationWeights::default(),
            &CentralityWeights::default(),
            &weights,
        );
        assert_eq!(record.influence_score, record.association_score);
    }

    #[test]
    fn influence_is_monotone_in_both_inputs() {
        let w = CompositeWeights::default();
        assert!(influence_score(0.6, 0.2, &w) >= influence_score(0.5, 0.2, &w));
        assert!(influence_score(0.5, 0.3, &w) >= influence_score(0.5, 0.2, &w));
    }

    #[test]
    fn non_finite_inputs_are_zeroed() {
        let normalized = MetricVector {
            pagerank: f64::NAN,
            ..MetricVector::default()
        };
        assert_approx_eq(centrality_score(&normalized, &CentralityWeights::default()), 0.0);
    }
}
