//! Random graph documents for property tests.

#![allow(dead_code)]

use proptest::prelude::*;
use serde_json::{Value, json};

/// Generated node attributes: id suffix plus engagement counters.
#[derive(Debug, Clone)]
pub struct GenNode {
    pub followers: u32,
    pub posts: u16,
    pub likes: u16,
    pub bio: &'static str,
}

/// Generated link by node position; weight `None` means "absent".
#[derive(Debug, Clone)]
pub struct GenLink {
    pub source: usize,
    pub target: usize,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct GenGraph {
    pub nodes: Vec<GenNode>,
    pub links: Vec<GenLink>,
}

const BIOS: [&str; 4] = [
    "",
    "AI researcher working on LLM agents",
    "machine learning and robotics",
    "coffee, cycling, photography",
];

pub fn arb_node() -> impl Strategy<Value = GenNode> {
    (any::<u32>(), any::<u16>(), any::<u16>(), 0..BIOS.len()).prop_map(
        |(followers, posts, likes, bio)| GenNode {
            followers,
            posts,
            likes,
            bio: BIOS[bio],
        },
    )
}

pub fn arb_graph() -> impl Strategy<Value = GenGraph> {
    (1usize..10).prop_flat_map(|n| {
        let link = (
            0..n,
            0..n,
            prop_oneof![Just(None), (0.0f64..5.0).prop_map(Some)],
        )
            .prop_map(|(source, target, weight)| GenLink {
                source,
                target,
                weight,
            });
        (
            proptest::collection::vec(arb_node(), n),
            proptest::collection::vec(link, 0..(n * 3)),
        )
            .prop_map(|(nodes, links)| GenGraph { nodes, links })
    })
}

pub fn node_id(position: usize) -> String {
    format!("n{position:02}")
}

impl GenGraph {
    /// Render as an input document. Self-links are kept; the loader drops them.
    pub fn to_value(&self) -> Value {
        let nodes: Vec<Value> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                json!({
                    "id": node_id(i),
                    "followers": node.followers,
                    "posts": node.posts,
                    "likes": node.likes,
                    "bio": node.bio,
                })
            })
            .collect();
        let links: Vec<Value> = self
            .links
            .iter()
            .map(|link| {
                let mut value = json!({
                    "source": node_id(link.source),
                    "target": node_id(link.target),
                });
                if let Some(weight) = link.weight {
                    value["weight"] = json!(weight);
                }
                value
            })
            .collect();
        json!({ "nodes": nodes, "links": links })
    }
}
