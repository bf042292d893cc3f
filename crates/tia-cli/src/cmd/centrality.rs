//! `tia centrality`: node and edge tables to the centrality report.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tia_network::graph::GraphStats;
use tia_network::report::ReportRow;
use tia_network::stage::{self, CentralityOutcome};

use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `tia centrality`.
#[derive(Args, Debug)]
pub struct CentralityArgs {
    /// Fail when eigenvector centrality does not converge.
    #[arg(long)]
    pub strict: bool,

    /// Number of top-ranked actors to show.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

/// What `tia centrality` reports: graph shape plus the highest-ranked actors.
#[derive(Debug, Serialize)]
pub struct CentralityView {
    pub graph: GraphStats,
    pub rows: usize,
    /// Why the eigenvector column is null, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eigenvector_error: Option<String>,
    /// Ranked by eigenvector centrality, or in-degree when that is missing.
    pub top: Vec<ReportRow>,
}

impl CentralityView {
    pub fn new(outcome: &CentralityOutcome, top: usize) -> Self {
        let eigen_available = outcome.eigenvector_error.is_none();
        let ranked = outcome.report.top_by(top, |row| {
            if eigen_available {
                row.eigenvector
            } else {
                row.in_degree
            }
        });

        Self {
            graph: outcome.stats.clone(),
            rows: outcome.report.len(),
            eigenvector_error: outcome.eigenvector_error.as_ref().map(ToString::to_string),
            top: ranked.into_iter().cloned().collect(),
        }
    }
}

/// Execute `tia centrality`.
pub fn run_centrality(
    args: &CentralityArgs,
    output: OutputMode,
    data_root: &Path,
) -> anyhow::Result<()> {
    let (mut cfg, paths) = super::load(data_root)?;
    cfg.centrality.strict_eigenvector |= args.strict;

    let outcome =
        stage::run_centrality(&cfg.centrality, &paths).context("centrality stage failed")?;
    render_view(output, &CentralityView::new(&outcome, args.top))
}

pub fn render_view(output: OutputMode, view: &CentralityView) -> anyhow::Result<()> {
    render_mode(output, view, write_text, write_pretty)
}

fn score(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

pub fn write_text(v: &CentralityView, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "nodes={} edges={} rows={} hash={}",
        v.graph.node_count, v.graph.edge_count, v.rows, v.graph.content_hash
    )?;
    if let Some(err) = &v.eigenvector_error {
        writeln!(w, "eigenvector_error={err}")?;
    }
    for row in &v.top {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.node_id,
            row.kind,
            score(row.in_degree),
            score(row.out_degree),
            score(row.eigenvector),
            row.name.as_deref().unwrap_or("")
        )?;
    }
    Ok(())
}

pub fn write_pretty(v: &CentralityView, w: &mut dyn Write) -> io::Result<()> {
    let g = &v.graph;
    pretty_section(w, "Actor graph")?;
    pretty_kv(w, "nodes", g.node_count.to_string())?;
    pretty_kv(w, "edges", g.edge_count.to_string())?;
    pretty_kv(w, "density", format!("{:.4}", g.density))?;
    pretty_kv(w, "components", g.weakly_connected_component_count.to_string())?;
    pretty_kv(w, "self loops", g.self_loop_count.to_string())?;
    pretty_kv(w, "skipped edges", g.skipped_edges.to_string())?;
    pretty_kv(w, "content hash", &g.content_hash)?;
    if let Some(err) = &v.eigenvector_error {
        pretty_kv(w, "eigenvector", format!("unavailable ({err})"))?;
    }

    writeln!(w)?;
    pretty_section(w, &format!("Top {} of {} actors", v.top.len(), v.rows))?;
    writeln!(
        w,
        "{:<10} {:<8} {:>8} {:>8} {:>8}  name",
        "id", "type", "in", "out", "eigen"
    )?;
    pretty_rule(w)?;
    for row in &v.top {
        writeln!(
            w,
            "{:<10} {:<8} {:>8} {:>8} {:>8}  {}",
            row.node_id,
            row.kind.as_str(),
            score(row.in_degree),
            score(row.out_degree),
            score(row.eigenvector),
            row.name.as_deref().unwrap_or("")
        )?;
    }
    Ok(())
}
