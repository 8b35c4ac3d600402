//! E2E CLI tests for `crk score`, `crk rank`, `crk validate` and
//! `crk completions`.
//!
//! Each test runs the `crk` binary as a subprocess in an isolated temp
//! directory holding its input documents.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the `crk` binary, rooted in `dir`.
fn crk_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("crk").expect("crk binary must exist");
    cmd.current_dir(dir);
    // Keep stderr free of log lines so error assertions are stable.
    cmd.env("CIRCLERANK_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).expect("json")).expect("write");
    path
}

fn sample_graph() -> Value {
    json!({
        "nodes": [
            { "id": "ada", "name": "Ada", "bio": "LLM alignment research", "followers": "12K" },
            { "id": "bob", "handle": "@bob", "followers": 300, "likes": 40 },
            { "id": "cy", "bio": "deep learning infra" },
            { "id": "dee" }
        ],
        "links": [
            { "source": "ada", "target": "bob", "weight": 2 },
            { "source": "bob", "target": "ada" },
            { "source": "bob", "target": "cy" },
            { "source": "cy", "target": "ada", "weight": 1.5 },
            { "source": "dee", "target": "ada", "weight": 0.5 }
        ]
    })
}

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let input = write_json(dir.path(), "graph.json", &sample_graph());
    (dir, input)
}

fn stdout_json(output: &std::process::Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ---------------------------------------------------------------------------
// crk score
// ---------------------------------------------------------------------------

#[test]
fn score_prints_document_to_stdout() {
    let (dir, input) = setup();
    let output = crk_cmd(dir.path())
        .args(["score", "--input"])
        .arg(&input)
        .output()
        .expect("run");
    let doc = stdout_json(&output);

    assert_eq!(doc["model"]["name"], "circlerank-grey-pagerank-v1");
    assert_eq!(doc["summary"]["node_count"], 4);
    let ids: Vec<&str> = doc["nodes"]
        .as_array()
        .expect("nodes")
        .iter()
        .filter_map(|n| n["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["ada", "bob", "cy", "dee"]);
    assert!(doc["summary"]["content_hash"]
        .as_str()
        .is_some_and(|h| h.starts_with("blake3:")));
}

#[test]
fn score_output_is_byte_identical_across_runs() {
    let (dir, input) = setup();
    let run = || {
        crk_cmd(dir.path())
            .args(["score", "--input"])
            .arg(&input)
            .output()
            .expect("run")
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn score_writes_output_file_and_summary() {
    let (dir, input) = setup();
    let out_path = dir.path().join("scores.json");
    let output = crk_cmd(dir.path())
        .args(["score", "--format", "json", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&out_path)
        .output()
        .expect("run");
    let summary = stdout_json(&output);
    assert_eq!(summary["node_count"], 4);

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).expect("output file"))
            .expect("written document is JSON");
    assert_eq!(written["summary"]["node_count"], 4);
}

#[test]
fn score_output_creates_missing_directories() {
    let (dir, input) = setup();
    let out_path = dir.path().join("reports").join("2026").join("scores.json");
    crk_cmd(dir.path())
        .args(["score", "--format", "text", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&out_path)
        .assert()
        .success();
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).expect("output file"))
            .expect("written document is JSON");
    assert_eq!(written["summary"]["node_count"], 4);
}

#[test]
fn alpha_beta_flags_reach_the_model() {
    let (dir, input) = setup();
    let output = crk_cmd(dir.path())
        .args(["score", "--alpha", "1", "--beta", "0", "--input"])
        .arg(&input)
        .output()
        .expect("run");
    let doc = stdout_json(&output);
    assert_eq!(doc["model"]["alpha"], 1.0);
    assert_eq!(doc["model"]["beta"], 0.0);
    for node in doc["nodes"].as_array().expect("nodes") {
        assert_eq!(node["influence_score"], node["association_score"]);
    }
}

#[test]
fn project_config_file_is_picked_up() {
    let (dir, input) = setup();
    std::fs::write(
        dir.path().join("circlerank.toml"),
        "[composite]\nalpha = 0.25\nbeta = 0.75\n",
    )
    .expect("write config");
    let output = crk_cmd(dir.path())
        .args(["score", "--input"])
        .arg(&input)
        .output()
        .expect("run");
    let doc = stdout_json(&output);
    assert_eq!(doc["model"]["alpha"], 0.25);
    assert_eq!(doc["model"]["beta"], 0.75);
}

#[test]
fn engagement_document_overrides_counters() {
    let (dir, input) = setup();
    let engagement = write_json(
        dir.path(),
        "engagement.json",
        &json!({ "metrics": [{ "handle": "@bob", "likes_count": 999, "posts_count": "1.5K" }] }),
    );
    let output = crk_cmd(dir.path())
        .args(["score", "--input"])
        .arg(&input)
        .arg("--engagement")
        .arg(&engagement)
        .output()
        .expect("run");
    let doc = stdout_json(&output);
    let bob = doc["nodes"]
        .as_array()
        .expect("nodes")
        .iter()
        .find(|n| n["id"] == "bob")
        .expect("bob");
    assert_eq!(bob["likes_count"], 999);
    assert_eq!(bob["posts_count"], 1500);
}

#[test]
fn cut_points_assign_absolute_layers() {
    let (dir, input) = setup();
    let output = crk_cmd(dir.path())
        .args(["score", "--cut-points", "5,4,3", "--input"])
        .arg(&input)
        .output()
        .expect("run");
    let doc = stdout_json(&output);
    assert_eq!(doc["summary"]["layer_counts"]["edge"], 4);
}

#[test]
fn dangling_reference_is_dropped_by_default() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_json(
        dir.path(),
        "graph.json",
        &json!({
            "nodes": [{ "id": "a" }, { "id": "b" }],
            "links": [{ "source": "a", "target": "b" }, { "source": "a", "target": "ghost" }]
        }),
    );
    let output = crk_cmd(dir.path())
        .args(["score", "--input"])
        .arg(&input)
        .output()
        .expect("run");
    let doc = stdout_json(&output);
    assert_eq!(doc["summary"]["edge_count"], 1);
    let kinds: Vec<&str> = doc["diagnostics"]
        .as_array()
        .expect("diagnostics")
        .iter()
        .filter_map(|d| d["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"dropped_edges"));
}

#[test]
fn strict_dangling_reference_fails_without_writing() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_json(
        dir.path(),
        "graph.json",
        &json!({
            "nodes": [{ "id": "a" }],
            "links": [{ "source": "a", "target": "ghost" }]
        }),
    );
    let out_path = dir.path().join("scores.json");
    crk_cmd(dir.path())
        .args(["score", "--strict", "--format", "text", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"))
        .stderr(predicate::str::contains("ghost"));
    assert!(!out_path.exists());
}

#[test]
fn schema_error_is_reported_as_json() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_json(dir.path(), "graph.json", &json!({ "nodes": [{ "name": "x" }] }));
    let output = crk_cmd(dir.path())
        .args(["score", "--json", "--input"])
        .arg(&input)
        .output()
        .expect("run");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("stderr should be JSON");
    assert_eq!(err["error"]["error_code"], "E1001");
    assert!(err["error"]["message"]
        .as_str()
        .is_some_and(|m| m.contains("nodes[0].id")));
}

#[test]
fn missing_input_file_fails() {
    let dir = TempDir::new().expect("tempdir");
    crk_cmd(dir.path())
        .args(["score", "--format", "text", "--input", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E5001"));
}

#[test]
fn invalid_alpha_is_a_config_error() {
    let (dir, input) = setup();
    crk_cmd(dir.path())
        .args(["score", "--format", "text", "--alpha=-1", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

// ---------------------------------------------------------------------------
// crk rank
// ---------------------------------------------------------------------------

#[test]
fn rank_json_is_dense_and_limited() {
    let (dir, input) = setup();
    let output = crk_cmd(dir.path())
        .args(["rank", "--format", "json", "--limit", "3", "--input"])
        .arg(&input)
        .output()
        .expect("run");
    let rows = stdout_json(&output);
    let rows = rows.as_array().expect("array");
    assert_eq!(rows.len(), 3);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row["rank"], i + 1);
    }
    let influence: Vec<f64> = rows
        .iter()
        .filter_map(|r| r["influence_score"].as_f64())
        .collect();
    assert!(influence.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn rank_text_has_header_and_rows() {
    let (dir, input) = setup();
    crk_cmd(dir.path())
        .args(["rank", "--format", "text", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("rank\tid\tinfluence"))
        .stdout(predicate::str::contains("\tada\t"));
}

#[test]
fn rank_csv_writes_header_and_limited_rows() {
    let (dir, input) = setup();
    let csv_path = dir.path().join("exports").join("ranking.csv");
    let output = crk_cmd(dir.path())
        .args(["rank", "--format", "json", "--limit", "2", "--input"])
        .arg(&input)
        .arg("--csv")
        .arg(&csv_path)
        .output()
        .expect("run");
    let rows = stdout_json(&output);
    assert_eq!(rows.as_array().expect("array").len(), 2);

    let csv = std::fs::read_to_string(&csv_path).expect("csv file");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("rank,id,name,handle,group,role,followers,influence_score,"));
    assert!(lines[0].ends_with(",semantic_ai,pagerank,layer"));
    assert!(lines[1].starts_with("1,"));
    assert!(lines[2].starts_with("2,"));
    assert_eq!(lines[1].split(',').count(), lines[0].split(',').count());
}

#[test]
fn rank_pretty_shows_names() {
    let (dir, input) = setup();
    crk_cmd(dir.path())
        .args(["rank", "--format", "pretty", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("INFLUENCE"))
        .stdout(predicate::str::contains("Ada"));
}

// ---------------------------------------------------------------------------
// crk validate
// ---------------------------------------------------------------------------

#[test]
fn validate_reports_stats_and_issues() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_json(
        dir.path(),
        "graph.json",
        &json!({
            "nodes": [{ "id": "a" }, { "id": "b" }, { "id": "c" }],
            "links": [
                { "source": "a", "target": "b" },
                { "source": "b", "target": "a", "weight": -2 },
                { "source": "c", "target": "c" }
            ]
        }),
    );
    let output = crk_cmd(dir.path())
        .args(["validate", "--format", "json", "--input"])
        .arg(&input)
        .output()
        .expect("run");
    let report = stdout_json(&output);
    assert_eq!(report["stats"]["node_count"], 3);
    assert_eq!(report["stats"]["edge_count"], 2);
    assert_eq!(report["stats"]["isolated_node_count"], 1);
    assert_eq!(report["input_link_count"], 3);
    let kinds: Vec<&str> = report["issues"]
        .as_array()
        .expect("issues")
        .iter()
        .filter_map(|i| i["kind"].as_str())
        .collect();
    assert_eq!(kinds, vec!["invalid_weight", "self_loop"]);
}

#[test]
fn validate_text_is_key_value_lines() {
    let (dir, input) = setup();
    crk_cmd(dir.path())
        .args(["validate", "--format", "text", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("nodes\t4"))
        .stdout(predicate::str::contains("edges\t5"));
}

#[test]
fn validate_strict_rejects_invalid_weight() {
    let dir = TempDir::new().expect("tempdir");
    let input = write_json(
        dir.path(),
        "graph.json",
        &json!({
            "nodes": [{ "id": "a" }, { "id": "b" }],
            "links": [{ "source": "a", "target": "b", "weight": "heavy" }]
        }),
    );
    crk_cmd(dir.path())
        .args(["validate", "--strict", "--format", "text", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("links[0].weight"));
}

// ---------------------------------------------------------------------------
// crk completions
// ---------------------------------------------------------------------------

#[test]
fn completions_generate_for_bash() {
    let dir = TempDir::new().expect("tempdir");
    crk_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("crk"));
}
