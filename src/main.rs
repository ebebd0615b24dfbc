//! Forum-Harvester main entry point
//!
//! Command-line interface for the listing crawler and the download URL checker.

use anyhow::Context;
use clap::{Parser, Subcommand};
use forum_harvester::checker::run_check;
use forum_harvester::config::{load_config_with_hash, validate, Config};
use forum_harvester::crawler::run_crawl;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const CRAWL_LOG_FILE: &str = "crawler_debug.log";
const CHECK_LOG_FILE: &str = "check_torrent_urls.log";

/// Forum-Harvester: a torrent forum listing crawler
///
/// Crawls the listing pages of a forum section into a CSV table, or checks a
/// list of torrent download URLs for reachability. Output files are committed
/// and pushed to git as the run progresses.
#[derive(Parser, Debug)]
#[command(name = "forum-harvester")]
#[command(version = "1.0.0")]
#[command(about = "Torrent forum listing crawler and download link checker", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Log file path (defaults depend on the command)
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl listing pages into the CSV table
    Crawl {
        /// First (highest) page to crawl; 0 discovers the last page and rewrites the table
        #[arg(long)]
        start_page: Option<u32>,

        /// Last (lowest) page to crawl
        #[arg(long)]
        end_page: Option<u32>,

        /// Skip git checkpoints
        #[arg(long)]
        no_commit: bool,
    },

    /// Check download URLs for reachability
    Check {
        /// URL list to check, one per line
        #[arg(long, value_name = "PATH")]
        input: Option<PathBuf>,

        /// Skip git checkpoints
        #[arg(long)]
        no_commit: bool,
    },
}

impl Command {
    fn default_log_file(&self) -> &'static str {
        match self {
            Command::Crawl { .. } => CRAWL_LOG_FILE,
            Command::Check { .. } => CHECK_LOG_FILE,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(cli.command.default_log_file()));
    let _guard = setup_logging(cli.verbose, cli.quiet, &log_file);

    let started = Instant::now();
    let result = run(cli).await;

    if let Err(e) = &result {
        tracing::error!("Run failed: {:#}", e);
    }
    tracing::info!(
        "Forum-Harvester finished in {:.2}s",
        started.elapsed().as_secs_f64()
    );

    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Crawl {
            start_page,
            end_page,
            no_commit,
        } => handle_crawl(config, start_page, end_page, no_commit, cli.quiet).await,
        Command::Check { input, no_commit } => handle_check(config, input, no_commit).await,
    }
}

/// Sets up console and file logging based on verbosity level
///
/// The returned guard flushes the file writer when dropped, so it must live
/// until `main` returns.
fn setup_logging(verbose: u8, quiet: bool, log_file: &Path) -> WorkerGuard {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("forum_harvester=debug,info"),
            1 => EnvFilter::new("forum_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = log_file
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CRAWL_LOG_FILE));

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        )
        .init();

    guard
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }

    let (config, hash) = load_config_with_hash(path).context("Failed to load configuration")?;
    if let Some(hash) = hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    Ok(config)
}

/// Handles the `crawl` command
async fn handle_crawl(
    mut config: Config,
    start_page: Option<u32>,
    end_page: Option<u32>,
    no_commit: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    if let Some(start) = start_page {
        config.crawler.start_page = start;
    }
    if let Some(end) = end_page {
        config.crawler.end_page = end;
    }
    if no_commit {
        config.checkpoint.enabled = false;
    }
    if quiet {
        config.crawler.show_progress = false;
    }
    validate(&config).context("Invalid command-line options")?;

    tracing::info!("Forum URL: {}", config.forum.base_url());
    tracing::info!(
        "Page range: {} -> {}, workers: {}, output: {}",
        config.crawler.start_page,
        config.crawler.end_page,
        config.crawler.max_workers,
        config.csv_path()
    );
    if !config.checkpoint.enabled {
        tracing::info!("Git checkpoints disabled");
    }

    let report = run_crawl(config).await.context("Crawl failed")?;
    tracing::info!(
        "Crawl completed: pages {} -> {}, {} records, {} checkpoints",
        report.start_page,
        report.end_page,
        report.records_written,
        report.checkpoints
    );

    Ok(())
}

/// Handles the `check` command
async fn handle_check(
    mut config: Config,
    input: Option<PathBuf>,
    no_commit: bool,
) -> anyhow::Result<()> {
    if let Some(input) = input {
        config.checker.input_file = input.display().to_string();
    }
    if no_commit {
        config.checkpoint.enabled = false;
    }
    validate(&config).context("Invalid command-line options")?;

    tracing::info!(
        "Checking {} in batches of {}, timeout {}ms",
        config.checker.input_file,
        config.checker.batch_size,
        config.checker.timeout_ms
    );

    let summary = run_check(config).await.context("URL check failed")?;
    tracing::info!(
        "Check completed: {} URLs, {} ok, {} failed, {} checkpoints",
        summary.total,
        summary.ok,
        summary.failed,
        summary.checkpoints
    );

    Ok(())
}
