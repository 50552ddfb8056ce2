//! Tide-Frontier main entry point
//!
//! Command-line interface for running a polite crawl from a TOML configuration.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tide_frontier::config::{load_config_with_hash, Config, OutputFormat};
use tide_frontier::crawler::run_crawl;
use tide_frontier::output::{print_run_history, print_summary};
use tide_frontier::storage::{open_storage, Storage};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Tide-Frontier: a polite, priority-driven web crawler
///
/// Crawls outward from seed URLs, shallowest pages first, while honouring
/// robots.txt and a minimum interval between requests to each host.
#[derive(Parser, Debug)]
#[command(name = "tide-frontier")]
#[command(version)]
#[command(about = "A polite, priority-driven web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the run history recorded in the SQLite database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!(path = %cli.config.display(), "Loading configuration");
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!(hash = %config_hash, "Configuration loaded");

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &config_hash, cli.quiet).await?;
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tide_frontier=info,warn"),
            1 => EnvFilter::new("tide_frontier=debug,info"),
            2 => EnvFilter::new("tide_frontier=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: prints the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Tide-Frontier Dry Run ===\n");

    println!("Crawler:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Default delay: {}ms", config.crawler.default_delay_ms);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);

    println!("\nUser-Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    match config.output.format {
        OutputFormat::Json => println!("  JSON files in {}", config.output.directory),
        OutputFormat::Sqlite => println!("  SQLite database {}", config.output.database_path),
        OutputFormat::None => println!("  Discarded"),
    }
    if let Some(path) = &config.output.summary_path {
        println!("  Summary: {}", path);
    }

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles --stats: lists runs recorded in the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.output.database_path);
    println!("Database: {}\n", path.display());

    let storage =
        open_storage(path).with_context(|| format!("failed to open {}", path.display()))?;
    let runs = storage.list_runs()?;
    print_run_history(&runs);

    Ok(())
}

/// Handles the crawl, cancelling it cleanly on Ctrl-C
async fn handle_crawl(config: Config, config_hash: &str, quiet: bool) -> anyhow::Result<()> {
    tracing::info!(seeds = config.seeds.len(), "Starting crawl");

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests");
            interrupt.cancel();
        }
    });

    let summary = run_crawl(config, config_hash, cancel)
        .await
        .context("crawl failed")?;

    if !quiet {
        print_summary(&summary);
    }

    Ok(())
}
