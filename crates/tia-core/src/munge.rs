//! The munge stage: raw JSON snapshots → staging CSV tables.
//!
//! ```text
//! raw/posts/*     ─ load ─ discover ─ flatten ─▶ staging/posts.csv
//!                                              ├▶ staging/posts_categories.csv
//!                                              ├▶ staging/posts_companies.csv
//!                                              └▶ staging/posts_tags.csv
//! raw/comments/*  ─ load ─ discover ─ flatten ─▶ staging/comments.csv
//!                                    └ dedupe ─▶ staging/comments_dedup.csv
//! ```

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::{MungeConfig, PipelinePaths};
use crate::dedupe::dedupe_table;
use crate::error::TiaError;
use crate::flatten::{CommentFlattener, PostFlattener, PostTables};
use crate::input::load_records;
use crate::table::Table;
use crate::value::RecordKind;

/// Flattened comment tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentTables {
    /// One row per comment tree node, repeats included.
    pub all: Table,
    /// First occurrence of every comment id.
    pub deduped: Table,
}

/// Row counts produced by the munge stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MungeSummary {
    pub posts: usize,
    pub post_columns: usize,
    pub side_rows: Vec<(String, usize)>,
    pub comment_rows: usize,
    pub comment_columns: usize,
    pub unique_comments: usize,
}

impl MungeSummary {
    #[must_use]
    pub fn from_tables(posts: &PostTables, comments: &CommentTables) -> Self {
        Self {
            posts: posts.posts.len(),
            post_columns: posts.posts.columns.len(),
            side_rows: posts
                .side
                .iter()
                .map(|(key, table)| (key.clone(), table.len()))
                .collect(),
            comment_rows: comments.all.len(),
            comment_columns: comments.all.columns.len(),
            unique_comments: comments.deduped.len(),
        }
    }
}

/// Flatten every post snapshot in memory.
///
/// # Errors
///
/// Fails if the posts directory is missing or a document is malformed.
pub fn flatten_posts(cfg: &MungeConfig, paths: &PipelinePaths) -> Result<PostTables, TiaError> {
    let records = load_records(&paths.raw_posts, RecordKind::Posts)?;
    let flattener = PostFlattener::discover(
        &records,
        &cfg.post_exclude,
        &cfg.post_nested,
        &cfg.post_lists,
    );
    flattener.flatten_all(&records)
}

/// Flatten and deduplicate every comment snapshot in memory.
///
/// # Errors
///
/// Fails if the comments directory is missing or a document is malformed.
pub fn flatten_comments(
    cfg: &MungeConfig,
    paths: &PipelinePaths,
) -> Result<CommentTables, TiaError> {
    let records = load_records(&paths.raw_comments, RecordKind::Comments)?;
    let flattener = CommentFlattener::discover(
        &records,
        &cfg.comment_exclude,
        &cfg.comment_nested,
        &cfg.comment_descend,
    );
    let all = flattener.flatten_all(&records)?;
    let deduped = dedupe_table(all.clone());
    info!(
        rows = all.len(),
        unique = deduped.len(),
        "deduplicated comments"
    );
    Ok(CommentTables { all, deduped })
}

/// Write the post table and its side tables.
///
/// # Errors
///
/// Fails if any file cannot be written.
pub fn write_posts(tables: &PostTables, paths: &PipelinePaths) -> Result<(), TiaError> {
    tables.posts.write_csv(&paths.posts())?;
    for (key, table) in &tables.side {
        table.write_csv(&paths.posts_side(key))?;
    }
    Ok(())
}

/// Write the full and deduplicated comment tables.
///
/// # Errors
///
/// Fails if either file cannot be written.
pub fn write_comments(tables: &CommentTables, paths: &PipelinePaths) -> Result<(), TiaError> {
    tables.all.write_csv(&paths.comments)?;
    tables.deduped.write_csv(&paths.comments_dedup)
}

/// Run the whole munge stage: flatten posts and comments and write every
/// staging table.
///
/// Both inputs are loaded before anything is written, so missing or
/// malformed input leaves the staging directory untouched.
///
/// # Errors
///
/// Fails on missing input, malformed JSON, or an unwritable output.
#[instrument(skip_all, fields(root = %paths.root.display()))]
pub fn run(
    cfg: &MungeConfig,
    paths: &PipelinePaths,
) -> Result<(PostTables, CommentTables), TiaError> {
    let comments = flatten_comments(cfg, paths)?;
    let posts = flatten_posts(cfg, paths)?;

    write_comments(&comments, paths)?;
    write_posts(&posts, paths)?;

    info!(
        posts = posts.posts.len(),
        comments = comments.deduped.len(),
        "munge complete"
    );
    Ok((posts, comments))
}
