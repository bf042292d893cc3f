//! `tia munge`: raw JSON snapshots to staging CSV tables.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use clap::Args;
use tia_core::munge::{self, MungeSummary};

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `tia munge`.
#[derive(Args, Debug, Default)]
pub struct MungeArgs {}

/// Execute `tia munge`.
pub fn run_munge(_args: &MungeArgs, output: OutputMode, data_root: &Path) -> anyhow::Result<()> {
    let (cfg, paths) = super::load(data_root)?;
    let (posts, comments) = munge::run(&cfg.munge, &paths).context("munge stage failed")?;
    let summary = MungeSummary::from_tables(&posts, &comments);
    render_summary(output, &summary)
}

pub fn render_summary(output: OutputMode, summary: &MungeSummary) -> anyhow::Result<()> {
    render_mode(output, summary, write_text, write_pretty)
}

pub fn write_text(s: &MungeSummary, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "posts={} columns={}", s.posts, s.post_columns)?;
    for (key, rows) in &s.side_rows {
        writeln!(w, "posts_{key}={rows}")?;
    }
    writeln!(
        w,
        "comments={} columns={} unique={}",
        s.comment_rows, s.comment_columns, s.unique_comments
    )
}

pub fn write_pretty(s: &MungeSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Staging tables")?;
    pretty_kv(w, "posts", format!("{} rows, {} columns", s.posts, s.post_columns))?;
    for (key, rows) in &s.side_rows {
        pretty_kv(w, &format!("posts_{key}"), format!("{rows} rows"))?;
    }
    pretty_kv(
        w,
        "comments",
        format!("{} rows, {} columns", s.comment_rows, s.comment_columns),
    )?;
    pretty_kv(w, "comments_dedup", format!("{} rows", s.unique_comments))
}
