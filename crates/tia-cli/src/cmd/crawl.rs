//! `tia crawl`: fetch raw post and comment pages.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use clap::{Args, Subcommand};

use crate::crawl::{CrawlSummary, Crawler, HttpSource};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct CrawlArgs {
    #[command(subcommand)]
    command: CrawlCommand,

    /// Override `crawl.base_url`.
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum CrawlCommand {
    /// Crawl every page of posts into the raw posts directory
    Posts {
        /// First page to fetch.
        #[arg(long, default_value_t = 1)]
        start: u32,
    },
    /// Crawl the comments of every post already in the raw posts directory
    Comments,
}

/// Execute `tia crawl`.
pub fn run_crawl(args: &CrawlArgs, output: OutputMode, data_root: &Path) -> anyhow::Result<()> {
    let (mut cfg, paths) = super::load(data_root)?;
    if let Some(url) = &args.base_url {
        cfg.crawl.base_url.clone_from(url);
    }

    let crawler = Crawler::new(HttpSource::new(cfg.crawl.user_agent.as_str()), &cfg.crawl);
    let summary = match args.command {
        CrawlCommand::Posts { start } => crawler
            .crawl_posts(&paths.raw_posts, start)
            .context("crawling posts failed")?,
        CrawlCommand::Comments => crawler
            .crawl_comments(&paths.raw_posts, &paths.raw_comments)
            .context("crawling comments failed")?,
    };

    render_mode(
        output,
        &summary,
        |s, w| writeln!(w, "target={} posts={} pages={}", s.target, s.posts, s.pages),
        write_pretty,
    )
}

fn write_pretty(s: &CrawlSummary, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Crawled {}", s.target))?;
    if s.target == "comments" {
        pretty_kv(w, "posts", s.posts.to_string())?;
    }
    pretty_kv(w, "pages", s.pages.to_string())?;
    pretty_kv(w, "output", s.output_dir.display().to_string())
}
