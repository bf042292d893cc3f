//! Munge stage against on-disk snapshots: raw JSON pages in, staging CSVs out.

use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;
use tia_core::config::PipelineConfig;
use tia_core::munge;
use tia_core::table::Table;

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

fn write_page(dir: &Path, name: &str, body: &serde_json::Value) {
    fs::create_dir_all(dir).expect("create page dir");
    fs::write(dir.join(name), body.to_string()).expect("write page");
}

fn seed(root: &Path) {
    write_page(
        &root.join("raw/posts"),
        "1",
        &json!({
            "total_pages": 1,
            "posts": [
                {
                    "id": 1,
                    "title": "Acme raises seed",
                    "author": {"id": 100, "display_name": "Ann", "roles": ["author"]},
                    "companies": [{"id": 500, "name": "Acme", "date_founded": "2015"}],
                    "tags": [{"id": 1, "name": "funding"}],
                },
                {
                    "id": 2,
                    "title": "Opinion",
                    "author": {"id": 101, "display_name": "Bob", "roles": ["contributor"]},
                    "sponsor": {"name": "BigCo"},
                }
            ]
        }),
    );

    write_page(
        &root.join("raw/comments"),
        "1_1",
        &json!({
            "total_pages": 1,
            "comments": [
                {
                    "id": 10, "post": 1, "parent": 0, "excerpt": "Congrats",
                    "author": {"id": 200, "display_name": "Cat", "roles": ["subscriber"]},
                    "children": [
                        {"id": 11, "post": 1, "parent": 10, "excerpt": "Agreed",
                         "author": {"id": 201, "display_name": "Dan", "roles": []}}
                    ]
                }
            ]
        }),
    );
    // The second page repeats the reply at top level.
    write_page(
        &root.join("raw/comments"),
        "1_2",
        &json!({
            "comments": [
                {"id": 11, "post": 1, "parent": 10, "excerpt": "Agreed",
                 "author": {"id": 201, "display_name": "Dan", "roles": []}}
            ]
        }),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn munge_writes_every_staging_table() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    let cfg = PipelineConfig::default();
    let paths = cfg.resolve(dir.path());
    let (posts, comments) = munge::run(&cfg.munge, &paths).expect("munge");

    assert_eq!(posts.posts.len(), 2);
    assert_eq!(comments.all.len(), 3);
    assert_eq!(comments.deduped.len(), 2);

    for file in [
        paths.posts(),
        paths.posts_side("categories"),
        paths.posts_side("companies"),
        paths.posts_side("tags"),
        paths.comments.clone(),
        paths.comments_dedup.clone(),
    ] {
        assert!(file.exists(), "{} should exist", file.display());
    }

    let posts_csv = Table::read_csv(&paths.posts()).expect("read table");
    assert_eq!(posts_csv.columns[0], "id");
    assert!(posts_csv.column("author_display_name").is_some());
    assert!(posts_csv.column("sponsor_name").is_some());
    assert!(posts_csv.column("companies").is_none(), "list fields are excluded");
    assert_eq!(posts_csv.value(0, "author_roles"), Some(r#"["author"]"#));
    assert_eq!(posts_csv.value(0, "sponsor_name"), None);

    let companies = Table::read_csv(&paths.posts_side("companies")).expect("read table");
    assert_eq!(companies.columns, ["date_founded", "id", "name", "post_id"]);
    assert_eq!(companies.len(), 1);
    assert_eq!(companies.value(0, "post_id"), Some("1"));

    let dedup = Table::read_csv(&paths.comments_dedup).expect("read table");
    let ids: Vec<_> = (0..dedup.len()).map(|i| dedup.value(i, "id")).collect();
    assert_eq!(ids, [Some("10"), Some("11")]);
}

#[test]
fn every_csv_field_is_quoted() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    let cfg = PipelineConfig::default();
    let paths = cfg.resolve(dir.path());
    munge::run(&cfg.munge, &paths).expect("munge");

    let raw = fs::read_to_string(&paths.comments_dedup).expect("read file");
    for line in raw.lines() {
        assert!(line.starts_with('"') && line.ends_with('"'), "unquoted line: {line}");
    }
}

#[test]
fn empty_snapshot_produces_header_only_tables() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir_all(dir.path().join("raw/posts")).expect("create dir");
    fs::create_dir_all(dir.path().join("raw/comments")).expect("create dir");

    let cfg = PipelineConfig::default();
    let paths = cfg.resolve(dir.path());
    let (posts, comments) = munge::run(&cfg.munge, &paths).expect("munge");

    assert!(posts.posts.is_empty());
    assert_eq!(posts.posts.columns, ["id"]);
    assert!(comments.deduped.is_empty());

    let back = Table::read_csv(&paths.posts_side("companies")).expect("read table");
    assert_eq!(back.columns, ["post_id"]);
    assert!(back.is_empty());
}

#[test]
fn malformed_page_aborts_the_run() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());
    fs::write(dir.path().join("raw/comments/broken"), "{\"comments\": [").expect("write fixture");

    let cfg = PipelineConfig::default();
    let paths = cfg.resolve(dir.path());
    let err = munge::run(&cfg.munge, &paths).expect_err("malformed input is fatal");
    assert_eq!(err.error_code(), tia_core::ErrorCode::MalformedInput);
}

#[test]
fn missing_posts_directory_writes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());
    fs::remove_dir_all(dir.path().join("raw/posts")).expect("remove posts");

    let cfg = PipelineConfig::default();
    let paths = cfg.resolve(dir.path());
    let err = munge::run(&cfg.munge, &paths).expect_err("posts are required");
    assert_eq!(err.error_code(), tia_core::ErrorCode::InputMissing);
    assert!(!paths.comments.exists());
    assert!(!paths.comments_dedup.exists());
    assert!(!paths.posts().exists());
}
