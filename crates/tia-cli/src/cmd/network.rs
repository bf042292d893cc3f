//! `tia network`: staging tables to node and edge tables.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use clap::Args;
use tia_network::stage::{self, NetworkSummary};

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `tia network`.
#[derive(Args, Debug, Default)]
pub struct NetworkArgs {}

/// Execute `tia network`.
pub fn run_network(_args: &NetworkArgs, output: OutputMode, data_root: &Path) -> anyhow::Result<()> {
    let (cfg, paths) = super::load(data_root)?;
    let input = stage::run_network(&cfg.columns, &paths).context("network stage failed")?;
    render_summary(output, &input.summary())
}

pub fn render_summary(output: OutputMode, summary: &NetworkSummary) -> anyhow::Result<()> {
    render_mode(output, summary, write_text, write_pretty)
}

pub fn write_text(s: &NetworkSummary, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "authors={} companies={} edges={}", s.authors, s.companies, s.edges)
}

pub fn write_pretty(s: &NetworkSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Network input")?;
    pretty_kv(w, "authors", s.authors.to_string())?;
    pretty_kv(w, "companies", s.companies.to_string())?;
    pretty_kv(w, "edges", s.edges.to_string())
}
