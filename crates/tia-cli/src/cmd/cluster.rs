//! `tia cluster`: group deduplicated comment excerpts by vocabulary.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use clap::Args;
use tia_cluster::stage::{self, ClusterSummary};
use tia_core::config::ClusterConfig;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `tia cluster`.
#[derive(Args, Debug, Default)]
pub struct ClusterArgs {
    /// Number of clusters (overrides `cluster.clusters`).
    #[arg(long)]
    pub clusters: Option<usize>,

    /// Random seed for centroid selection (overrides `cluster.seed`).
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ClusterArgs {
    pub fn apply(&self, cfg: &mut ClusterConfig) {
        if let Some(k) = self.clusters {
            cfg.clusters = k;
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
    }
}

/// Execute `tia cluster`.
pub fn run_cluster(args: &ClusterArgs, output: OutputMode, data_root: &Path) -> anyhow::Result<()> {
    let (mut cfg, paths) = super::load(data_root)?;
    args.apply(&mut cfg.cluster);

    let summary = stage::run_cluster(&cfg.cluster, &paths).context("cluster stage failed")?;
    render_summary(output, &summary)
}

pub fn render_summary(output: OutputMode, summary: &ClusterSummary) -> anyhow::Result<()> {
    render_mode(output, summary, write_text, write_pretty)
}

pub fn write_text(s: &ClusterSummary, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "documents={} terms={} iterations={} converged={} inertia={:.4}",
        s.documents, s.terms, s.iterations, s.converged, s.inertia
    )?;
    for (cluster, size) in &s.sizes {
        writeln!(w, "cluster_{cluster}={size}")?;
    }
    Ok(())
}

pub fn write_pretty(s: &ClusterSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Comment clusters")?;
    pretty_kv(w, "documents", s.documents.to_string())?;
    pretty_kv(w, "terms", s.terms.to_string())?;
    let convergence = if s.converged { "converged" } else { "iteration limit" };
    pretty_kv(w, "iterations", format!("{} ({convergence})", s.iterations))?;
    pretty_kv(w, "inertia", format!("{:.4}", s.inertia))?;
    for (cluster, size) in &s.sizes {
        pretty_kv(w, &format!("cluster {cluster}"), format!("{size} documents"))?;
    }
    Ok(())
}
