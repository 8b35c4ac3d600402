//! Input document parsing and field-level validation.
//!
//! # Overview
//!
//! The input is a JSON document with two ordered collections:
//!
//! ```json
//! {
//!   "nodes": [{ "id": "alice", "name": "Alice", "followers": "1.2K" }],
//!   "links": [{ "source": "alice", "target": "bob", "weight": 2.0 }]
//! }
//! ```
//!
//! Node attributes are optional and resolved once here into a typed
//! [`NodeRecord`] with zero defaults, so no downstream stage has to deal
//! with absent fields. Structural problems that make the document unusable
//! (no id, duplicate id, link without endpoints) fail with
//! [`Error::Schema`] naming the offending field. Referential checks and
//! edge aggregation happen later in [`crate::graph::build`], once the full
//! node set is known.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Raw engagement and audience counters attached to a node.
///
/// Absent counters are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub followers: u64,
    pub posts: u64,
    pub comments: u64,
    pub likes: u64,
    pub reposts: u64,
}

/// A validated node with every optional attribute resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeRecord {
    /// Unique, non-empty identifier (`id`, falling back to `handle`).
    pub id: String,
    pub name: Option<String>,
    pub handle: Option<String>,
    pub group: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
    /// Free-form tags (`bioTags` or `tags` in the input).
    pub tags: Vec<String>,
    pub counters: Counters,
    /// Precomputed cross-relation ratio, clamped to `[0, 1]` when present.
    pub cross_follow_ratio: Option<f64>,
    /// Position of this node in the input `nodes` array.
    pub input_index: usize,
}

impl NodeRecord {
    /// Create a record with only an id; every other attribute defaults.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Key used to match engagement rows: handle (or id), lowercased,
    /// without a leading `@`.
    #[must_use]
    pub fn engagement_key(&self) -> String {
        normalize_key(self.handle.as_deref().unwrap_or(&self.id))
    }
}

/// Edge weight as found in the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawWeight {
    /// No `weight` key: the documented default of 1.0 applies.
    Absent,
    /// A finite, non-negative number.
    Valid(f64),
    /// Present but negative, non-finite, or not a number.
    Invalid,
}

impl RawWeight {
    /// Resolve to a usable weight; invalid values clamp to 0.0.
    #[must_use]
    pub const fn resolved(self) -> f64 {
        match self {
            Self::Absent => 1.0,
            Self::Valid(w) => w,
            Self::Invalid => 0.0,
        }
    }
}

/// A link as parsed from the input, before referential checks.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLink {
    pub source: String,
    pub target: String,
    pub weight: RawWeight,
    /// Raw weight text for diagnostics when `weight` is invalid.
    pub weight_text: Option<String>,
    /// Optional precomputed semantic similarity, clamped to `[0, 1]`.
    pub semantic_similarity: Option<f64>,
    /// Position of this link in the input `links` array.
    pub input_index: usize,
}

/// A parsed and field-validated input document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDocument {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<RawLink>,
}

impl GraphDocument {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if `json` is not JSON, or [`Error::Schema`]
    /// naming the first offending field.
    #[instrument(skip(json), fields(bytes = json.len()))]
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|err| Error::Parse {
            what: "graph document".to_string(),
            message: err.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] naming the first offending field.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| Error::schema("$", "document must be a JSON object"))?;

        let raw_nodes = root
            .get("nodes")
            .ok_or_else(|| Error::schema("nodes", "missing required collection"))?
            .as_array()
            .ok_or_else(|| Error::schema("nodes", "must be an array"))?;

        let raw_links = match root.get("links").or_else(|| root.get("edges")) {
            None | Some(Value::Null) => &[][..],
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => return Err(Error::schema("links", "must be an array")),
        };

        let mut seen: HashSet<String> = HashSet::with_capacity(raw_nodes.len());
        let mut nodes = Vec::with_capacity(raw_nodes.len());
        for (index, raw) in raw_nodes.iter().enumerate() {
            let node = parse_node(index, raw)?;
            if !seen.insert(node.id.clone()) {
                return Err(Error::schema(
                    format!("nodes[{index}].id"),
                    format!("duplicate node id `{}`", node.id),
                ));
            }
            nodes.push(node);
        }

        let links = raw_links
            .iter()
            .enumerate()
            .map(|(index, raw)| parse_link(index, raw))
            .collect::<Result<Vec<_>>>()?;

        debug!(nodes = nodes.len(), links = links.len(), "parsed graph document");
        Ok(Self { nodes, links })
    }
}

fn parse_node(index: usize, raw: &Value) -> Result<NodeRecord> {
    let obj = raw
        .as_object()
        .ok_or_else(|| Error::schema(format!("nodes[{index}]"), "node must be an object"))?;

    let handle = text_field(obj, "handle")
        .map(|h| h.trim_start_matches('@').to_string())
        .filter(|h| !h.is_empty());
    let id = text_field(obj, "id")
        .or_else(|| handle.clone())
        .ok_or_else(|| Error::schema(format!("nodes[{index}].id"), "missing or empty"))?;

    let tags = match obj.get("bioTags").or_else(|| obj.get("tags")) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    };

    let counters = Counters {
        followers: counter_field(obj, &["followers", "followers_count"]),
        posts: counter_field(obj, &["posts", "posts_count"]),
        comments: counter_field(obj, &["comments", "comments_count"]),
        likes: counter_field(obj, &["likes", "likes_count"]),
        reposts: counter_field(obj, &["reposts", "reposts_count"]),
    };

    let cross_follow_ratio = obj
        .get("cross_follow_ratio")
        .and_then(number_value)
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(0.0, 1.0));

    Ok(NodeRecord {
        id,
        name: text_field(obj, "name"),
        handle,
        group: text_field(obj, "group"),
        role: text_field(obj, "role"),
        bio: text_field(obj, "bio"),
        tags,
        counters,
        cross_follow_ratio,
        input_index: index,
    })
}

fn parse_link(index: usize, raw: &Value) -> Result<RawLink> {
    let obj = raw
        .as_object()
        .ok_or_else(|| Error::schema(format!("links[{index}]"), "link must be an object"))?;

    let source = obj
        .get("source")
        .and_then(endpoint_id)
        .ok_or_else(|| Error::schema(format!("links[{index}].source"), "missing or empty"))?;
    let target = obj
        .get("target")
        .and_then(endpoint_id)
        .ok_or_else(|| Error::schema(format!("links[{index}].target"), "missing or empty"))?;

    let (weight, weight_text) = match obj.get("weight") {
        None | Some(Value::Null) => (RawWeight::Absent, None),
        Some(value) => match number_value(value) {
            Some(w) if w.is_finite() && w >= 0.0 => (RawWeight::Valid(w), None),
            _ => (RawWeight::Invalid, Some(value.to_string())),
        },
    };

    let semantic_similarity = obj
        .get("semantic_similarity")
        .and_then(number_value)
        .filter(|s| s.is_finite())
        .map(|s| s.clamp(0.0, 1.0));

    Ok(RawLink {
        source,
        target,
        weight,
        weight_text,
        semantic_similarity,
        input_index: index,
    })
}

/// Resolve a link endpoint: a string id, a number, or an object carrying
/// `id`, `handle` or `name` (first non-empty wins).
fn endpoint_id(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => ["id", "handle", "name"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(scalar_text)),
        other => scalar_text(other),
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(scalar_text)
}

/// Trimmed, non-empty text form of a string or number.
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn counter_field(obj: &Map<String, Value>, keys: &[&str]) -> u64 {
    keys.iter()
        .find_map(|key| obj.get(*key))
        .map_or(0, parse_counter)
}

/// Parse a counter from a JSON number or display string.
///
/// Strings may carry thousands separators and a `K`/`M`/`B` suffix
/// (`"1.2K"` is 1200). Anything unparseable, negative, or non-finite is 0.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn parse_counter(value: &Value) -> u64 {
    let as_count = |x: f64| if x.is_finite() && x > 0.0 { x as u64 } else { 0 };
    match value {
        Value::Number(n) => n.as_u64().unwrap_or_else(|| n.as_f64().map_or(0, as_count)),
        Value::String(s) => {
            let text = s.trim().replace(',', "").to_ascii_uppercase();
            let (digits, scale) = match text.chars().last() {
                Some('K') => (&text[..text.len() - 1], 1_000.0),
                Some('M') => (&text[..text.len() - 1], 1_000_000.0),
                Some('B') => (&text[..text.len() - 1], 1_000_000_000.0),
                _ => (text.as_str(), 1.0),
            };
            match digits.trim().parse::<f64>() {
                Ok(number) => as_count(number * scale),
                Err(_) => {
                    let only_digits: String =
                        text.chars().filter(char::is_ascii_digit).collect();
                    only_digits.parse::<u64>().unwrap_or(0)
                }
            }
        }
        _ => 0,
    }
}

/// Normalize an identifier for case-insensitive matching.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}
