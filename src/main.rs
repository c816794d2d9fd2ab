//! Harvestman main entry point
//!
//! Command-line interface for the crawler: one invocation runs one crawl
//! session against a seed URL, then prints the session summary.

use clap::Parser;
use harvestman::config::{load_config, CrawlConfig};
use harvestman::crawler::Engine;
use harvestman::storage::SqliteStore;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Harvestman: a polite, time-boxed web crawler
///
/// Seeds from a single URL, crawls for a fixed duration while honoring
/// robots.txt and per-host rate limits, and stores harvested text in a
/// SQLite database searchable with `harvestman-search`.
#[derive(Parser, Debug)]
#[command(name = "harvestman")]
#[command(version)]
#[command(about = "A polite, time-boxed web crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "SEED_URL")]
    seed: String,

    /// Number of crawl workers (default 20)
    #[arg(short = 'w', long = "workers")]
    workers: Option<usize>,

    /// Session duration in seconds (default 20)
    #[arg(short = 'd', long = "duration")]
    duration: Option<u64>,

    /// Verbose console logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Log file path (default db.log)
    #[arg(short = 'o', long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Optional TOML configuration file
    #[arg(long = "config", value_name = "CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Defaults, then config file, then flags, then environment
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CrawlConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(duration) = cli.duration {
        config.crawler.duration_secs = duration;
    }
    if let Some(path) = &cli.log_file {
        config.output.log_path = path.display().to_string();
    }
    if let Ok(db) = std::env::var("HARVESTMAN_DB") {
        config.output.database_path = db;
    }

    setup_logging(&config.output.log_path, cli.verbose)?;

    // Startup failures are fatal: the store must be open and its schema in
    // place before any worker spawns
    let store = Arc::new(SqliteStore::open(Path::new(&config.output.database_path))?);
    tracing::info!(path = %config.output.database_path, "store opened");

    println!("{}", config.http.user_agent);
    println!("{} workers starting...", config.crawler.workers);

    let engine = Engine::new(config, store)?;
    let start = Instant::now();
    engine.run(&cli.seed).await?;
    engine.stats().print_summary(start.elapsed());

    Ok(())
}

/// Sets up the tracing subscriber
///
/// All log lines go to the append-only log file; `--verbose` adds a console
/// layer so the crawl can be watched live.
fn setup_logging(log_path: &str, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new().append(true).create(true).open(log_path)?;

    let filter = if verbose {
        EnvFilter::new("harvestman=debug,info")
    } else {
        EnvFilter::new("harvestman=info,warn")
    };

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Arc::new(file));

    if verbose {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    Ok(())
}
