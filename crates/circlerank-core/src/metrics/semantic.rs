//! Token-based semantic signals.
//!
//! Text attributes of a node (name, handle, group, role, bio, tags) are
//! reduced to a token set: lowercase runs of ASCII alphanumerics or `_`,
//! and runs of CJK ideographs, keeping tokens of at least two characters.
//!
//! - `semantic_affinity = min(1, keyword_hits / saturation)`, where
//!   `keyword_hits` counts configured keywords present in the token set.
//! - Link similarity is the Jaccard index of the endpoint token sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::graph::build::ScoredGraph;
use crate::graph::load::NodeRecord;

/// Topic vocabulary for `semantic_affinity` (`[semantic]` in config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Keywords matched against whole tokens (case-insensitive).
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Hit count at which affinity saturates at 1.0.
    #[serde(default = "default_saturation")]
    pub saturation: f64,
}

fn default_keywords() -> Vec<String> {
    [
        "ai",
        "artificial",
        "intelligence",
        "llm",
        "agent",
        "agents",
        "model",
        "models",
        "openai",
        "anthropic",
        "deepmind",
        "gemini",
        "gpt",
        "transformer",
        "research",
        "researcher",
        "scientist",
        "machine",
        "learning",
        "ml",
        "pytorch",
        "langchain",
        "inference",
        "token",
        "alignment",
        "reasoning",
        "robot",
        "robotics",
        "创业",
        "大模型",
        "智能",
        "算法",
        "机器学习",
        "人工智能",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

const fn default_saturation() -> f64 {
    8.0
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            saturation: default_saturation(),
        }
    }
}

impl SemanticConfig {
    /// Affinity of a token set to the configured vocabulary, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn affinity(&self, tokens: &BTreeSet<String>) -> f64 {
        if self.saturation <= 0.0 {
            return 0.0;
        }
        let vocabulary: BTreeSet<String> =
            self.keywords.iter().map(|k| k.trim().to_lowercase()).collect();
        let hits = vocabulary.iter().filter(|k| tokens.contains(*k)).count();
        (hits as f64 / self.saturation).min(1.0)
    }
}

const fn is_word_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
}

const fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fff}')
}

/// Split text into the token set described in the module docs.
#[must_use]
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    let mut tokens = BTreeSet::new();
    let mut current = String::new();
    let mut current_is_cjk = false;

    let mut flush = |current: &mut String| {
        if current.chars().count() >= 2 {
            tokens.insert(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for c in lowered.chars() {
        let class = if is_word_char(c) {
            Some(false)
        } else if is_cjk(c) {
            Some(true)
        } else {
            None
        };
        match class {
            Some(cjk) if current.is_empty() || cjk == current_is_cjk => {
                current_is_cjk = cjk;
                current.push(c);
            }
            Some(cjk) => {
                flush(&mut current);
                current_is_cjk = cjk;
                current.push(c);
            }
            None => flush(&mut current),
        }
    }
    flush(&mut current);
    tokens
}

/// Token set of a node's text attributes.
#[must_use]
pub fn record_tokens(node: &NodeRecord) -> BTreeSet<String> {
    let mut blob = String::new();
    for part in [&node.name, &node.handle, &node.group, &node.role, &node.bio]
        .into_iter()
        .flatten()
    {
        blob.push_str(part);
        blob.push(' ');
    }
    blob.push_str(&node.tags.join(" "));
    tokenize(&blob)
}

/// Token sets for every node, in canonical order.
#[must_use]
pub fn node_tokens(sg: &ScoredGraph) -> Vec<BTreeSet<String>> {
    sg.graph.node_weights().map(record_tokens).collect()
}

/// Jaccard index `|a ∩ b| / |a ∪ b|`; 0 when both sets are empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}
