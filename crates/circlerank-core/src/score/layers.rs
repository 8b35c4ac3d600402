//! Layer classification.
//!
//! Nodes are ordered by influence (desc), then association (desc), then id
//! (asc). That order is total, so ties at a boundary always resolve the same
//! way. Two policies map the order to layers:
//!
//! - [`LayerPolicy::Quantile`]: the first `ceil(core·N)` positions are core,
//!   up to `ceil((core+strong)·N)` strong, up to
//!   `ceil((core+strong+medium)·N)` medium, the rest edge.
//! - [`LayerPolicy::CutPoints`]: absolute influence thresholds.
//!
//! Either way every node gets exactly one layer and layers never increase
//! along the order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Guards `ceil` against fractions like `0.3 * 10 = 3.0000000000000004`.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Ordered importance tier, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Core,
    Strong,
    Medium,
    Edge,
}

impl Layer {
    pub const ALL: [Self; 4] = [Self::Core, Self::Strong, Self::Medium, Self::Edge];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Strong => "strong",
            Self::Medium => "medium",
            Self::Edge => "edge",
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundary policy (`[layers]` in config).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum LayerPolicy {
    /// Fractions of the node count, taken from the top of the order.
    Quantile { core: f64, strong: f64, medium: f64 },
    /// Minimum influence score for each layer; must be non-increasing.
    CutPoints { core: f64, strong: f64, medium: f64 },
}

impl Default for LayerPolicy {
    fn default() -> Self {
        Self::Quantile {
            core: 0.2,
            strong: 0.3,
            medium: 0.3,
        }
    }
}

impl LayerPolicy {
    /// Check fractions or thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a negative or non-finite value,
    /// quantile fractions summing past 1, or increasing cut points.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Quantile {
                core,
                strong,
                medium,
            } => {
                for (key, value) in [("core", core), ("strong", strong), ("medium", medium)] {
                    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                        return Err(Error::config(
                            format!("layers.{key}"),
                            format!("quantile fraction must be in [0, 1], got {value}"),
                        ));
                    }
                }
                if core + strong + medium > 1.0 + BOUNDARY_EPSILON {
                    return Err(Error::config(
                        "layers",
                        "quantile fractions must sum to at most 1",
                    ));
                }
            }
            Self::CutPoints {
                core,
                strong,
                medium,
            } => {
                for (key, value) in [("core", core), ("strong", strong), ("medium", medium)] {
                    if !value.is_finite() {
                        return Err(Error::config(
                            format!("layers.{key}"),
                            format!("cut point must be finite, got {value}"),
                        ));
                    }
                }
                if core < strong || strong < medium {
                    return Err(Error::config(
                        "layers",
                        format!("cut points must be non-increasing, got {core}, {strong}, {medium}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// What the classifier needs to know about one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerInput<'a> {
    pub id: &'a str,
    pub influence: f64,
    pub association: f64,
}

/// Total order used for layering: influence desc, association desc, id asc.
#[must_use]
pub fn layer_order(a: &LayerInput<'_>, b: &LayerInput<'_>) -> Ordering {
    b.influence
        .total_cmp(&a.influence)
        .then_with(|| b.association.total_cmp(&a.association))
        .then_with(|| a.id.cmp(b.id))
}

/// Assign a layer to every input, returned in input order.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn classify(inputs: &[LayerInput<'_>], policy: &LayerPolicy) -> Vec<Layer> {
    let n = inputs.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| layer_order(&inputs[i], &inputs[j]));

    let mut layers = vec![Layer::Edge; n];
    match *policy {
        LayerPolicy::Quantile {
            core,
            strong,
            medium,
        } => {
            let n_f64 = n as f64;
            let boundary = |fraction: f64| -> usize {
                let raw = (fraction * n_f64 - BOUNDARY_EPSILON).ceil();
                if raw <= 0.0 { 0 } else { (raw as usize).min(n) }
            };
            let core_end = boundary(core);
            let strong_end = boundary(core + strong).max(core_end);
            let medium_end = boundary(core + strong + medium).max(strong_end);

            for (position, &i) in order.iter().enumerate() {
                layers[i] = if position < core_end {
                    Layer::Core
                } else if position < strong_end {
                    Layer::Strong
                } else if position < medium_end {
                    Layer::Medium
                } else {
                    Layer::Edge
                };
            }
        }
        LayerPolicy::CutPoints {
            core,
            strong,
            medium,
        } => {
            for (layer, input) in layers.iter_mut().zip(inputs) {
                let score = input.influence;
                *layer = if score >= core {
                    Layer::Core
                } else if score >= strong {
                    Layer::Strong
                } else if score >= medium {
                    Layer::Medium
                } else {
                    Layer::Edge
                };
            }
        }
    }
    layers
}

/// Node count per layer, in [`Layer::ALL`] order.
#[must_use]
pub fn layer_counts(layers: &[Layer]) -> [(Layer, usize); 4] {
    Layer::ALL.map(|layer| (layer, layers.iter().filter(|&&l| l == layer).count()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(scores: &[(&'static str, f64, f64)]) -> Vec<LayerInput<'static>> {
        scores
            .iter()
            .map(|&(id, influence, association)| LayerInput {
                id,
                influence,
                association,
            })
            .collect()
    }

    #[test]
    fn default_quantiles_on_ten_nodes() {
        let ids = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
        let scores: Vec<(&str, f64, f64)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, 1.0 - 0.1 * f64::from(u8::try_from(i).expect("small")), 0.0))
            .collect();
        let layers = classify(&inputs(&scores), &LayerPolicy::default());
        assert_eq!(
            layers,
            vec![
                Layer::Core,
                Layer::Core,
                Layer::Strong,
                Layer::Strong,
                Layer::Strong,
                Layer::Medium,
                Layer::Medium,
                Layer::Medium,
                Layer::Edge,
                Layer::Edge,
            ]
        );
    }

    #[test]
    fn single_node_is_core() {
        let layers = classify(&inputs(&[("solo", 1.0, 1.0)]), &LayerPolicy::default());
        assert_eq!(layers, vec![Layer::Core]);
    }

    #[test]
    fn ties_break_on_association_then_id() {
        let layers = classify(
            &inputs(&[("b", 0.5, 0.1), ("a", 0.5, 0.1), ("c", 0.5, 0.9)]),
            &LayerPolicy::Quantile {
                core: 0.3,
                strong: 0.3,
                medium: 0.3,
            },
        );
        // order: c (higher association), a, b (id)
        assert_eq!(layers, vec![Layer::Medium, Layer::Strong, Layer::Core]);
    }

    #[test]
    fn cut_points_use_absolute_scores() {
        let policy = LayerPolicy::CutPoints {
            core: 0.8,
            strong: 0.5,
            medium: 0.2,
        };
        let layers = classify(
            &inputs(&[("a", 0.9, 0.0), ("b", 0.5, 0.0), ("c", 0.3, 0.0), ("d", 0.1, 0.0)]),
            &policy,
        );
        assert_eq!(layers, vec![Layer::Core, Layer::Strong, Layer::Medium, Layer::Edge]);
    }

    #[test]
    fn validation_rejects_bad_policies() {
        assert!(LayerPolicy::default().validate().is_ok());
        assert!(
            LayerPolicy::Quantile {
                core: 0.6,
                strong: 0.3,
                medium: 0.3
            }
            .validate()
            .is_err()
        );
        assert!(
            LayerPolicy::CutPoints {
                core: 0.2,
                strong: 0.5,
                medium: 0.1
            }
            .validate()
            .is_err()
        );
        assert!(
            LayerPolicy::CutPoints {
                core: f64::NAN,
                strong: 0.5,
                medium: 0.1
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn policy_round_trips_through_toml() {
        let policy: LayerPolicy =
            toml::from_str("policy = \"cut-points\"\ncore = 0.7\nstrong = 0.4\nmedium = 0.1")
                .expect("valid toml");
        assert_eq!(
            policy,
            LayerPolicy::CutPoints {
                core: 0.7,
                strong: 0.4,
                medium: 0.1
            }
        );
    }

    #[test]
    fn counts_cover_every_layer() {
        let counts = layer_counts(&[Layer::Core, Layer::Edge, Layer::Edge]);
        assert_eq!(counts[0], (Layer::Core, 1));
        assert_eq!(counts[1], (Layer::Strong, 0));
        assert_eq!(counts[3], (Layer::Edge, 2));
    }
}
