//! Engagement-derived metrics.
//!
//! ```text
//! interaction_strength = Σ c_k · ln(1 + count_k)      k ∈ {posts, comments, likes, reposts}
//! engagement_composite = interaction_strength + c_f · log10(1 + followers)
//! ```
//!
//! The logarithm damps heavy-tailed counters so one viral account does not
//! flatten everyone else after min-max scaling. With non-negative
//! coefficients both metrics are non-decreasing in every counter.

use serde::{Deserialize, Serialize};

use crate::graph::load::Counters;

/// Coefficients for the engagement formulas (`[engagement]` in config).
///
/// Likes and reposts weigh more than posts and comments: they are
/// reactions from others rather than the account's own output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementWeights {
    #[serde(default = "default_posts")]
    pub posts: f64,
    #[serde(default = "default_comments")]
    pub comments: f64,
    #[serde(default = "default_likes")]
    pub likes: f64,
    #[serde(default = "default_reposts")]
    pub reposts: f64,
    /// Audience term in `engagement_composite`.
    #[serde(default = "default_followers")]
    pub followers: f64,
}

const fn default_posts() -> f64 {
    1.0
}

const fn default_comments() -> f64 {
    1.5
}

const fn default_likes() -> f64 {
    2.0
}

const fn default_reposts() -> f64 {
    2.5
}

const fn default_followers() -> f64 {
    1.0
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            posts: default_posts(),
            comments: default_comments(),
            likes: default_likes(),
            reposts: default_reposts(),
            followers: default_followers(),
        }
    }
}

impl EngagementWeights {
    /// Named coefficients, for validation and the model summary.
    #[must_use]
    pub const fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("posts", self.posts),
            ("comments", self.comments),
            ("likes", self.likes),
            ("reposts", self.reposts),
            ("followers", self.followers),
        ]
    }

    /// `Σ c_k · ln(1 + count_k)` over the activity counters.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn interaction_strength(&self, counters: &Counters) -> f64 {
        let term = |coef: f64, count: u64| coef * (count as f64).ln_1p();
        term(self.posts, counters.posts)
            + term(self.comments, counters.comments)
            + term(self.likes, counters.likes)
            + term(self.reposts, counters.reposts)
    }

    /// Interaction strength plus the damped audience size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn engagement_composite(&self, counters: &Counters) -> f64 {
        let audience = (1.0 + counters.followers as f64).log10();
        self.interaction_strength(counters) + self.followers * audience
    }
}
