#![forbid(unsafe_code)]

mod cmd;
mod crawl;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tia_core::timing::{StageTimings, timing_enabled_from_env};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tia: crawl a content site and analyze its author/company network",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (ignored when TIA_LOG is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors (ignored when TIA_LOG is set).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Data root holding raw/, staging/, network_input/, network_output/ and tia.toml.
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,

    /// Emit per-stage timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format (default: pretty on a TTY, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Collect",
        about = "Crawl raw post or comment pages",
        long_about = "Fetch every page of posts, or the comments of every crawled post, into the raw directories.",
        after_help = "EXAMPLES:\n    # Crawl all post pages\n    tia crawl posts\n\n    # Then crawl comments for every crawled post\n    tia crawl comments"
    )]
    Crawl(cmd::crawl::CrawlArgs),

    #[command(
        next_help_heading = "Stages",
        about = "Flatten raw JSON into staging CSV tables",
        long_about = "Discover the post and comment schemas, flatten nested records and comment trees, and write the staging tables.",
        after_help = "EXAMPLES:\n    # Flatten the snapshot in the current directory\n    tia munge\n\n    # Emit machine-readable output\n    tia munge --json"
    )]
    Munge(cmd::munge::MungeArgs),

    #[command(
        next_help_heading = "Stages",
        about = "Derive node and edge tables from staging",
        long_about = "Join posts, post companies and deduplicated comments into author/company nodes and directed edges.",
        after_help = "EXAMPLES:\n    # Build network input\n    tia network --data-dir data"
    )]
    Network(cmd::network::NetworkArgs),

    #[command(
        next_help_heading = "Stages",
        about = "Score every actor with degree and eigenvector centrality",
        long_about = "Build the directed actor graph from network input and write the centrality report.",
        after_help = "EXAMPLES:\n    # Show the top 5 actors\n    tia centrality --top 5\n\n    # Fail if eigenvector centrality does not converge\n    tia centrality --strict"
    )]
    Centrality(cmd::centrality::CentralityArgs),

    #[command(
        next_help_heading = "Stages",
        about = "Cluster deduplicated comment excerpts",
        long_about = "Vectorize comment excerpts with TF-IDF and partition them with k-means.",
        after_help = "EXAMPLES:\n    # Use three clusters\n    tia cluster --clusters 3"
    )]
    Cluster(cmd::cluster::ClusterArgs),

    #[command(
        next_help_heading = "Stages",
        about = "Run every stage from raw JSON to centralities and clusters",
        after_help = "EXAMPLES:\n    # Full pipeline with timing\n    tia run --timing\n\n    # Skip clustering\n    tia run --skip-cluster --json"
    )]
    Run(cmd::run::RunArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Show or initialize tia.toml",
        after_help = "EXAMPLES:\n    # Show effective configuration\n    tia config show\n\n    # Write a config with every default\n    tia config init"
    )]
    Config(cmd::config::ConfigArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    tia completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env("TIA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "tia=debug,info"
        } else if quiet {
            "error"
        } else {
            "tia=info,warn"
        })
    });

    let format = env::var("TIA_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn report_timings(timings: &StageTimings) -> anyhow::Result<()> {
    if timings.is_empty() {
        eprintln!("timing report: no samples recorded");
    } else {
        eprintln!("timing report:");
        eprintln!("{}", timings.display_table());
        eprintln!("timing report (json):");
        eprintln!("{}", serde_json::to_string_pretty(&timings.to_json())?);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let output = cli.output_mode();
    let mut timings = StageTimings::new(cli.timing || timing_enabled_from_env());
    let root = cli.data_dir.clone();
    debug!(root = %root.display(), ?output, "starting");

    let command_result = match cli.command {
        Commands::Crawl(ref args) => {
            timings.time("cmd.crawl", || cmd::crawl::run_crawl(args, output, &root))
        }
        Commands::Munge(ref args) => {
            timings.time("cmd.munge", || cmd::munge::run_munge(args, output, &root))
        }
        Commands::Network(ref args) => timings.time("cmd.network", || {
            cmd::network::run_network(args, output, &root)
        }),
        Commands::Centrality(ref args) => timings.time("cmd.centrality", || {
            cmd::centrality::run_centrality(args, output, &root)
        }),
        Commands::Cluster(ref args) => timings.time("cmd.cluster", || {
            cmd::cluster::run_cluster(args, output, &root)
        }),
        Commands::Run(ref args) => cmd::run::run_pipeline(args, output, &root, &mut timings),
        Commands::Config(ref args) => {
            timings.time("cmd.config", || cmd::config::run_config(args, &root, output))
        }
        Commands::Completions(ref args) => timings.time("cmd.completions", || {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }),
    };

    if timings.is_enabled() {
        if let Err(err) = report_timings(&timings) {
            eprintln!("timing report failed: {err}");
        }
    }

    match command_result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(output, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
