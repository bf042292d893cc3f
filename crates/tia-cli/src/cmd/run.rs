//! `tia run`: munge → network → centrality → cluster in one process.
//!
//! Tables flow between stages in memory; every stage still writes its
//! outputs, so the result on disk matches running the stages one by one.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tia_cluster::stage::{ClusterSummary, cluster_comments};
use tia_core::munge::{self, MungeSummary};
use tia_core::table::Table;
use tia_core::timing::StageTimings;
use tia_network::stage::{self, NetworkSummary};
use tracing::info;

use super::centrality::{self, CentralityView};
use super::cluster::{self, ClusterArgs};
use super::{munge as munge_cmd, network};
use crate::output::{OutputMode, render_mode};

/// Arguments for `tia run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Fail when eigenvector centrality does not converge.
    #[arg(long)]
    pub strict: bool,

    /// Skip the text clustering stage.
    #[arg(long)]
    pub skip_cluster: bool,

    /// Number of top-ranked actors to show.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    #[command(flatten)]
    pub cluster: ClusterArgs,
}

/// Summary of every stage of one run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub munge: MungeSummary,
    pub network: NetworkSummary,
    pub centrality: CentralityView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterSummary>,
}

/// Execute `tia run`.
pub fn run_pipeline(
    args: &RunArgs,
    output: OutputMode,
    data_root: &Path,
    timings: &mut StageTimings,
) -> anyhow::Result<()> {
    let (mut cfg, paths) = super::load(data_root)?;
    cfg.centrality.strict_eigenvector |= args.strict;
    args.cluster.apply(&mut cfg.cluster);

    let (posts, comments) = timings
        .time("stage.munge", || munge::run(&cfg.munge, &paths))
        .context("munge stage failed")?;

    let no_companies = Table::default();
    let companies = posts.side(&cfg.columns.companies_list).unwrap_or(&no_companies);
    let input = timings
        .time("stage.network", || {
            let input = stage::prepare(&posts.posts, companies, &comments.deduped, &cfg.columns);
            stage::write_network_input(&input, &paths).map(|()| input)
        })
        .context("network stage failed")?;

    let outcome = timings
        .time("stage.centrality", || {
            let outcome = stage::score(&input, &cfg.centrality)?;
            stage::write_report(&outcome.report, &paths)?;
            Ok::<_, tia_network::NetworkError>(outcome)
        })
        .context("centrality stage failed")?;

    let cluster = if args.skip_cluster {
        None
    } else {
        Some(
            timings
                .time("stage.cluster", || {
                    cluster_comments(&comments.deduped, &cfg.cluster, &paths)
                })
                .context("cluster stage failed")?,
        )
    };

    let report = RunReport {
        munge: MungeSummary::from_tables(&posts, &comments),
        network: input.summary(),
        centrality: CentralityView::new(&outcome, args.top),
        cluster,
    };
    info!(root = %paths.root.display(), "pipeline complete");
    render_mode(output, &report, write_text, write_pretty)
}

fn write_text(r: &RunReport, w: &mut dyn Write) -> io::Result<()> {
    munge_cmd::write_text(&r.munge, w)?;
    network::write_text(&r.network, w)?;
    centrality::write_text(&r.centrality, w)?;
    if let Some(c) = &r.cluster {
        cluster::write_text(c, w)?;
    }
    Ok(())
}

fn write_pretty(r: &RunReport, w: &mut dyn Write) -> io::Result<()> {
    munge_cmd::write_pretty(&r.munge, w)?;
    writeln!(w)?;
    network::write_pretty(&r.network, w)?;
    writeln!(w)?;
    centrality::write_pretty(&r.centrality, w)?;
    if let Some(c) = &r.cluster {
        writeln!(w)?;
        cluster::write_pretty(c, w)?;
    }
    Ok(())
}
