//! From raw metrics to final scores and layers.
//!
//! ```text
//! MetricTable
//!        ↓  normalize::normalize_table()
//! NormalizedTable (every metric in [0, 1])
//!        ↓  grey::grey_relational()          against ReferenceSequence::ideal()
//! GreyAnalysis (ξ per dimension, γ per node)
//!        ↓  composite::compose()
//! ScoreRecord (association, centrality, influence)
//!        ↓  layers::classify()
//! Layer (core / strong / medium / edge)
//! ```

pub mod composite;
pub mod grey;
pub mod layers;
pub mod normalize;

pub use composite::{AssociationWeights, CentralityWeights, CompositeWeights, ScoreRecord};
pub use grey::{GreyAnalysis, GreyConfig, GreyRecord, GreyWeighting, ReferenceSequence};
pub use layers::{Layer, LayerInput, LayerPolicy};
pub use normalize::NormalizedTable;
