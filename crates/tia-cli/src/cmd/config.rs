use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tia_core::config::{CONFIG_FILE, PipelineConfig};

use crate::output::{OutputMode, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Show the effective configuration (file values over defaults)
    Show(ShowArgs),
    /// Write a tia.toml holding every default value
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Show tia.toml exactly as written instead of the effective values
    #[arg(long)]
    raw: bool,
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Overwrite an existing tia.toml
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    path: String,
    overwritten: bool,
}

pub fn run_config(args: &ConfigArgs, data_root: &Path, output: OutputMode) -> Result<()> {
    match &args.command {
        ConfigCommand::Show(show) => run_show(show, data_root, output),
        ConfigCommand::Init(init) => run_init(init, data_root, output),
    }
}

fn run_show(args: &ShowArgs, data_root: &Path, output: OutputMode) -> Result<()> {
    if args.raw {
        let path = data_root.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value: toml::Value = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        return print_toml_or_json(&value, output);
    }

    let (cfg, _) = super::load(data_root)?;
    print_toml_or_json(&cfg, output)
}

fn run_init(args: &InitArgs, data_root: &Path, output: OutputMode) -> Result<()> {
    let path = data_root.join(CONFIG_FILE);
    let exists = path.exists();
    if exists && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    std::fs::create_dir_all(data_root)
        .with_context(|| format!("Failed to create {}", data_root.display()))?;
    let serialized = toml::to_string_pretty(&PipelineConfig::default())?;
    std::fs::write(&path, serialized)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let report = InitReport {
        path: path.display().to_string(),
        overwritten: exists,
    };
    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "path={} overwritten={}", r.path, r.overwritten),
        |r, w| pretty_kv(w, "wrote", &r.path),
    )
}

fn print_toml_or_json<T: Serialize>(value: &T, output: OutputMode) -> Result<()> {
    match output {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputMode::Text | OutputMode::Pretty => {
            print!("{}", toml::to_string_pretty(value)?);
        }
    }
    Ok(())
}
