pub mod centrality;
pub mod cluster;
pub mod completions;
pub mod config;
pub mod crawl;
pub mod munge;
pub mod network;
pub mod run;

use std::path::Path;

use anyhow::Context;
use tia_core::config::{PipelineConfig, PipelinePaths, load_config};

/// Load `tia.toml` from the data root and resolve every stage path.
pub fn load(root: &Path) -> anyhow::Result<(PipelineConfig, PipelinePaths)> {
    let cfg = load_config(root)
        .with_context(|| format!("failed to load configuration from {}", root.display()))?;
    let paths = cfg.resolve(root);
    Ok((cfg, paths))
}
