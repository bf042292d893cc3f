//! E2E tests for the stage commands:
//! `tia munge`, `tia network`, `tia centrality`, `tia cluster`, `tia run`,
//! `tia config`, `tia completions`.
//!
//! Covers: staging/network/report files on disk, JSON summaries, stage-by-stage
//! runs matching the in-memory pipeline, and coded errors for missing input.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test harness helpers
// ---------------------------------------------------------------------------

fn tia_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tia"));
    cmd.arg("--data-dir").arg(dir);
    cmd.env("TIA_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = tia_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON summary")
}

fn write(path: &Path, body: &Value) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, body.to_string()).expect("write fixture");
}

fn author(id: u32, name: &str) -> Value {
    json!({"id": id, "display_name": name, "roles": ["member"]})
}

fn comment(id: u32, post: u32, parent: u32, author_id: u32, name: &str, text: &str) -> Value {
    json!({"id": id, "post": post, "parent": parent, "excerpt": text, "author": author(author_id, name)})
}

/// Two posts about payments (Acme) and ride hailing (Zoom), each with
/// on-topic comments, plus a small tia.toml so clustering has usable terms.
fn seed(root: &Path) {
    let acme = json!({"id": 500, "name": "Acme", "date_founded": "2015"});
    let zoom = json!({"id": 501, "name": "Zoom", "date_founded": "2017"});

    write(
        &root.join("raw/posts/1"),
        &json!({
            "total_pages": 1,
            "posts": [
                {"id": 1, "title": "Acme payments", "author": author(100, "Ann"), "companies": [acme]},
                {"id": 2, "title": "Zoom rides", "author": author(101, "Bob"), "companies": [zoom]},
            ]
        }),
    );

    let mut first = comment(10, 1, 0, 200, "Cat", "payments wallet fintech");
    first["children"] = json!([comment(11, 1, 10, 201, "Dan", "fintech wallet payments")]);
    write(
        &root.join("raw/comments/1_1"),
        &json!({
            "total_pages": 1,
            "comments": [first, comment(12, 1, 0, 100, "Ann", "wallet payments fintech")]
        }),
    );
    write(
        &root.join("raw/comments/2_1"),
        &json!({
            "total_pages": 1,
            "comments": [
                comment(20, 2, 0, 201, "Dan", "ride hailing drivers"),
                comment(21, 2, 0, 202, "Eve", "drivers ride hailing"),
                comment(22, 2, 0, 101, "Bob", "hailing drivers ride"),
            ]
        }),
    );

    fs::write(
        root.join("tia.toml"),
        "[cluster]\nclusters = 2\nmax_df = 0.6\nmin_df = 0.2\n",
    )
    .expect("write config");
}

fn csv_rows(path: &Path) -> usize {
    let content = fs::read_to_string(path).expect("read csv");
    content.lines().count() - 1
}

// ---------------------------------------------------------------------------
// tia run
// ---------------------------------------------------------------------------

#[test]
fn run_writes_every_table() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    let report = run_json(dir.path(), &["run"]);

    assert_eq!(report["munge"]["posts"], 2);
    assert_eq!(report["munge"]["unique_comments"], 6);
    assert_eq!(report["network"]["companies"], 2);
    assert_eq!(report["network"]["authors"], 5);
    assert_eq!(report["cluster"]["documents"], 6);

    for rel in [
        "staging/posts.csv",
        "staging/posts_companies.csv",
        "staging/comments.csv",
        "staging/comments_dedup.csv",
        "network_input/authors_node.csv",
        "network_input/companies_node.csv",
        "network_input/edges.csv",
        "network_output/centralities.csv",
        "network_output/clusters.csv",
    ] {
        assert!(dir.path().join(rel).is_file(), "{rel} missing");
    }
    assert_eq!(csv_rows(&dir.path().join("network_output/clusters.csv")), 6);
}

#[test]
fn run_separates_comment_topics() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());
    run_json(dir.path(), &["run"]);

    let sizes = report_cluster_sizes(dir.path());
    assert_eq!(sizes, [3, 3]);
}

fn report_cluster_sizes(root: &Path) -> Vec<usize> {
    let content = fs::read_to_string(root.join("network_output/clusters.csv")).expect("read file");
    let mut sizes = std::collections::BTreeMap::<String, usize>::new();
    for line in content.lines().skip(1) {
        let cluster = line.split(',').next().expect("cluster cell").to_string();
        *sizes.entry(cluster).or_default() += 1;
    }
    sizes.into_values().collect()
}

#[test]
fn run_skip_cluster_omits_clusters() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    let report = run_json(dir.path(), &["run", "--skip-cluster"]);
    assert!(report.get("cluster").is_none());
    assert!(!dir.path().join("network_output/clusters.csv").exists());
}

#[test]
fn run_reports_top_actors() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    let report = run_json(dir.path(), &["run", "--top", "3"]);
    let top = report["centrality"]["top"].as_array().expect("top array");
    assert_eq!(top.len(), 3);
    assert!(top.iter().all(|row| row["node_id"].is_string()));
    assert!(
        report["centrality"]["graph"]["content_hash"]
            .as_str()
            .expect("hash")
            .starts_with("blake3:")
    );
}

#[test]
fn run_on_empty_snapshot_writes_header_only_tables() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir_all(dir.path().join("raw/posts")).expect("create dir");
    fs::create_dir_all(dir.path().join("raw/comments")).expect("create dir");

    let report = run_json(dir.path(), &["run"]);
    assert_eq!(report["munge"]["posts"], 0);
    assert_eq!(report["network"]["authors"], 0);
    assert_eq!(report["cluster"]["documents"], 0);
    assert_eq!(report["cluster"]["sizes"], json!([]));

    for rel in [
        "staging/posts.csv",
        "staging/comments_dedup.csv",
        "network_input/authors_node.csv",
        "network_input/edges.csv",
        "network_output/centralities.csv",
        "network_output/clusters.csv",
    ] {
        assert_eq!(csv_rows(&dir.path().join(rel)), 0, "{rel} should be header-only");
    }
    let clusters = fs::read_to_string(dir.path().join("network_output/clusters.csv"))
        .expect("read file");
    assert_eq!(clusters.trim_end(), r#""cluster","row","excerpt""#);
}

// ---------------------------------------------------------------------------
// Stage by stage
// ---------------------------------------------------------------------------

#[test]
fn stages_match_the_full_run() {
    let staged = TempDir::new().expect("tempdir");
    seed(staged.path());
    run_json(staged.path(), &["munge"]);
    let network = run_json(staged.path(), &["network"]);
    run_json(staged.path(), &["centrality"]);
    run_json(staged.path(), &["cluster"]);

    let full = TempDir::new().expect("tempdir");
    seed(full.path());
    let report = run_json(full.path(), &["run"]);

    assert_eq!(network, report["network"]);
    for rel in [
        "network_input/edges.csv",
        "network_output/centralities.csv",
        "network_output/clusters.csv",
    ] {
        assert_eq!(
            fs::read_to_string(staged.path().join(rel)).expect("read file"),
            fs::read_to_string(full.path().join(rel)).expect("read file"),
            "{rel} differs"
        );
    }
}

#[test]
fn cluster_flag_overrides_config() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());
    run_json(dir.path(), &["munge"]);

    let summary = run_json(dir.path(), &["cluster", "--clusters", "3"]);
    let sizes = summary["sizes"].as_array().expect("sizes");
    assert!(sizes.len() <= 3);
    assert_eq!(
        sizes.iter().map(|s| s[1].as_u64().expect("cluster size")).sum::<u64>(),
        6
    );
}

#[test]
fn text_output_is_key_value() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());
    run_json(dir.path(), &["munge"]);

    tia_cmd(dir.path())
        .args(["--format", "text", "network"])
        .assert()
        .success()
        .stdout(predicate::str::contains("authors=5 companies=2"));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn centrality_without_network_input_fails_with_code() {
    let dir = TempDir::new().expect("tempdir");

    let output = tia_cmd(dir.path())
        .args(["centrality", "--json"])
        .output()
        .expect("command should not crash");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("JSON error");
    assert_eq!(err["error"]["error_code"], "E2001");
    assert!(err["error"]["suggestion"].is_string());
}

#[test]
fn munge_without_raw_directory_fails() {
    let dir = TempDir::new().expect("tempdir");

    tia_cmd(dir.path())
        .args(["--format", "text", "munge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2001]"));
}

#[test]
fn malformed_raw_json_fails_with_code() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());
    fs::write(dir.path().join("raw/posts/2"), "{not json").expect("write fixture");

    tia_cmd(dir.path())
        .args(["--format", "text", "munge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2002]"));
}

#[test]
fn too_many_clusters_fails_with_code() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());
    run_json(dir.path(), &["munge"]);

    tia_cmd(dir.path())
        .args(["--format", "text", "cluster", "--clusters", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E6002]"));
}

// ---------------------------------------------------------------------------
// tia config / tia completions
// ---------------------------------------------------------------------------

#[test]
fn config_show_merges_file_over_defaults() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    let cfg = run_json(dir.path(), &["config", "show"]);
    assert_eq!(cfg["cluster"]["clusters"], 2);
    assert_eq!(cfg["cluster"]["seed"], 42);
    assert_eq!(cfg["crawl"]["sleep_interval"], 10);
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = TempDir::new().expect("tempdir");

    tia_cmd(dir.path()).args(["config", "init"]).assert().success();
    assert!(dir.path().join("tia.toml").is_file());

    tia_cmd(dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    tia_cmd(dir.path())
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn completions_mention_the_binary() {
    let dir = TempDir::new().expect("tempdir");
    tia_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tia"));
}

#[test]
fn timing_report_goes_to_stderr() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    tia_cmd(dir.path())
        .args(["run", "--timing", "--json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("stage.munge"));
}
