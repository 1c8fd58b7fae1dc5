//! Tele-Trawl main entry point
//!
//! This is the command-line interface for the Tele-Trawl link crawler.

use anyhow::Context;
use clap::Parser;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tele_trawl::config::{load_config_with_hash, Config};
use tele_trawl::crawler::trawl;
use tele_trawl::output::{load_statistics, print_statistics};
use tele_trawl::storage::open_storage;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Number of recent links shown by `--stats`
const STATS_RECENT_LINKS: usize = 20;

/// Tele-Trawl: a continuous Telegram link crawler
///
/// Tele-Trawl searches the web for configured keywords, crawls the result
/// sites, records every new Telegram link once and forwards each discovery
/// to a Telegram chat.
#[derive(Parser, Debug)]
#[command(name = "tele-trawl")]
#[command(version = "1.0.0")]
#[command(about = "A continuous Telegram link crawler", long_about = None)]
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

    /// Validate config and show the effective settings without crawling
    #[arg(long, conflicts_with_all = ["stats", "once"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "once"])]
    stats: bool,

    /// Run a single cycle, then shut down
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Handle different modes
    let result = if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config, cli.once).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tele_trawl=info,warn"),
            1 => EnvFilter::new("tele_trawl=debug,info"),
            2 => EnvFilter::new("tele_trawl=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the effective settings
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Tele-Trawl Dry Run ===\n");

    println!("Keywords ({}):", config.search.keywords.len());
    for keyword in &config.search.keywords {
        println!("  - {}", keyword);
    }
    println!("  Search endpoint: {}", config.search.endpoint);

    println!("\nCrawl:");
    println!("  Queue batch size: {}", config.crawl.queue_batch_size);
    match config.crawl.page_size_limit() {
        Some(limit) => println!("  Max page size: {} bytes", limit),
        None => println!("  Max page size: unlimited"),
    }
    println!("  Request timeout: {}ms", config.crawl.request_timeout_ms);

    println!("\nTiming:");
    println!("  Keyword delay: {}ms", config.timing.keyword_delay_ms);
    println!("  Fetch delay: {}ms", config.timing.fetch_delay_ms);
    println!("  Jitter: up to {}ms", config.timing.jitter_ms);
    println!("  Cycle delay: {}ms", config.timing.cycle_delay_ms);

    println!("\nTargets:");
    println!("  Hosts: {}", config.targets.hosts.join(", "));
    println!("  Canonical base: {}", config.targets.canonical_base);
    println!(
        "  Excluded segments: {}",
        config.targets.excluded_segments.join(", ")
    );

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nNotifier:");
    if config.notifier.is_usable() {
        println!("  Chat: {}", config.notifier.chat_id);
        println!("  Send delay: {}ms", config.notifier.send_delay_ms);
        println!("  Queue capacity: {}", config.notifier.queue_capacity);
    } else if config.notifier.enabled {
        println!("  Enabled but missing bot-token or chat-id (will be disabled)");
    } else {
        println!("  Disabled");
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))
        .context("Failed to open database")?;

    let stats = load_statistics(&storage, STATS_RECENT_LINKS)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, once: bool) -> anyhow::Result<()> {
    tracing::info!("Initializing database at {}", config.storage.database_path);
    let storage = open_storage(Path::new(&config.storage.database_path))
        .context("Database setup failed")?;

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    tracing::info!(
        "Starting with {} keywords, queue batch size {}",
        config.search.keywords.len(),
        config.crawl.queue_batch_size
    );

    let cycles = trawl(&config, Arc::new(storage), shutdown, once)
        .await
        .context("Crawler failed to start")?;

    tracing::info!("Shutdown complete after {} cycles", cycles);
    Ok(())
}

/// Cancels `token` on the first SIGINT/SIGTERM and exits on the second
fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::warn!("Shutdown requested. Finishing current tasks...");
        token.cancel();

        wait_for_signal().await;
        tracing::warn!("Forcing exit...");
        std::process::exit(1);
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = await_listener("Ctrl-C", tokio::signal::ctrl_c()) => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            await_listener("Ctrl-C", tokio::signal::ctrl_c()).await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    await_listener("Ctrl-C", tokio::signal::ctrl_c()).await;
}

/// Resolves once `listener` reports a signal
///
/// A listener that fails never resolves, so it cannot be mistaken for a signal.
async fn await_listener<F>(name: &str, listener: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = listener.await {
        tracing::error!("Failed to listen for {}: {}", name, e);
        std::future::pending::<()>().await;
    }
}
