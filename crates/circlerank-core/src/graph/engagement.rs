//! Engagement side document: per-node activity counters supplied
//! separately from the graph.
//!
//! Three shapes are accepted:
//!
//! ```json
//! { "metrics": [{ "handle": "@alice", "posts_count": 12, "likes_count": "1.1K" }] }
//! [{ "id": "alice", "posts_count": 12 }]
//! { "alice": { "posts_count": 12 } }
//! ```
//!
//! Rows are keyed by handle (or id) lowercased with the leading `@`
//! stripped. When merged, matched counters replace the node's inline
//! counters; followers are never touched.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::graph::load::{NodeRecord, normalize_key, parse_counter};

/// Activity counters for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementCounts {
    pub posts: u64,
    pub comments: u64,
    pub likes: u64,
    pub reposts: u64,
}

/// Lookup table from normalized key to counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngagementTable {
    rows: BTreeMap<String, EngagementCounts>,
}

/// Outcome of merging a table into a node set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngagementMerge {
    /// Nodes whose counters were overridden.
    pub matched: usize,
    /// Table keys that matched no node (sorted).
    pub unmatched: Vec<String>,
}

impl EngagementTable {
    /// Parse an engagement document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for invalid JSON and [`Error::Schema`] when
    /// the document has none of the accepted shapes.
    #[instrument(skip(json), fields(bytes = json.len()))]
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|err| Error::Parse {
            what: "engagement document".to_string(),
            message: err.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Build the table from a parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] when the document has none of the accepted
    /// shapes.
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut rows = BTreeMap::new();
        match value {
            Value::Array(items) => collect_rows(items, &mut rows),
            Value::Object(obj) => match obj.get("metrics") {
                Some(Value::Array(items)) => collect_rows(items, &mut rows),
                Some(_) => return Err(Error::schema("metrics", "must be an array")),
                None => {
                    for (key, row) in obj {
                        if let Some(fields) = row.as_object() {
                            let norm = normalize_key(key);
                            if !norm.is_empty() {
                                rows.insert(norm, counts_from(fields));
                            }
                        }
                    }
                }
            },
            _ => {
                return Err(Error::schema(
                    "$",
                    "engagement document must be an object or an array",
                ));
            }
        }
        debug!(rows = rows.len(), "parsed engagement table");
        Ok(Self { rows })
    }

    /// Number of rows in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up counters by an already-normalized key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&EngagementCounts> {
        self.rows.get(key)
    }

    /// Insert or replace a row.
    pub fn insert(&mut self, key: &str, counts: EngagementCounts) {
        self.rows.insert(normalize_key(key), counts);
    }

    /// Override node counters with matching rows.
    ///
    /// A node matches by its engagement key (handle or id), then by its
    /// lowercased id.
    pub fn apply(&self, nodes: &mut [NodeRecord]) -> EngagementMerge {
        let mut used: BTreeSet<&str> = BTreeSet::new();
        let mut matched = 0;

        for node in nodes.iter_mut() {
            let primary = node.engagement_key();
            let fallback = normalize_key(&node.id);
            let hit = self
                .rows
                .get_key_value(primary.as_str())
                .or_else(|| self.rows.get_key_value(fallback.as_str()));

            if let Some((key, counts)) = hit {
                node.counters.posts = counts.posts;
                node.counters.comments = counts.comments;
                node.counters.likes = counts.likes;
                node.counters.reposts = counts.reposts;
                used.insert(key.as_str());
                matched += 1;
            }
        }

        let unmatched: Vec<String> = self
            .rows
            .keys()
            .filter(|key| !used.contains(key.as_str()))
            .cloned()
            .collect();

        if !unmatched.is_empty() {
            warn!(
                unmatched = unmatched.len(),
                "engagement rows did not match any node"
            );
        }

        EngagementMerge { matched, unmatched }
    }
}

fn collect_rows(items: &[Value], rows: &mut BTreeMap<String, EngagementCounts>) {
    for item in items {
        let Some(fields) = item.as_object() else {
            continue;
        };
        let key = ["handle", "id"]
            .iter()
            .filter_map(|k| fields.get(*k))
            .find_map(|v| match v {
                Value::String(s) => Some(normalize_key(s)),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|k| !k.is_empty());
        if let Some(key) = key {
            rows.insert(key, counts_from(fields));
        }
    }
}

fn counts_from(fields: &Map<String, Value>) -> EngagementCounts {
    let get = |primary: &str, alias: &str| {
        fields
            .get(primary)
            .or_else(|| fields.get(alias))
            .map_or(0, parse_counter)
    };
    EngagementCounts {
        posts: get("posts_count", "posts"),
        comments: get("comments_count", "comments"),
        likes: get("likes_count", "likes"),
        reposts: get("reposts_count", "reposts"),
    }
}
