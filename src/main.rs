//! Registry-Harvester main entry point
//!
//! This is the command-line interface for the registry harvester.

use anyhow::Context;
use clap::Parser;
use registry_harvester::config::{load_config_with_hash, Config};
use registry_harvester::crawler::crawl;
use registry_harvester::output::print_statistics;
use registry_harvester::storage::{item_stem, Layout, RecordKind};
use registry_harvester::Query;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Registry-Harvester: a resumable collector for the food-safety product registry
///
/// Searches the registry for QUERY, walks every listing page, and stores each
/// item with its company data under the collect path. Items already stored
/// are skipped, so an interrupted run is resumed by running it again.
#[derive(Parser, Debug)]
#[command(name = "registry-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A resumable collector for the food-safety product registry", long_about = None)]
struct Cli {
    /// Search term, e.g. 과자
    #[arg(value_name = "QUERY")]
    query: String,

    /// Path to TOML configuration file (defaults apply without one)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the query key, output layout and tunables without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            (Config::default(), None)
        }
    };

    let query = Query::new(&cli.query)?;

    if cli.dry_run {
        handle_dry_run(&config, &query);
        return Ok(());
    }

    handle_crawl(&config, config_hash, &query).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("registry_harvester=info,warn"),
            1 => EnvFilter::new("registry_harvester=debug,info"),
            2 => EnvFilter::new("registry_harvester=trace,debug"),
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

/// Handles the --dry-run mode: shows what a crawl would do
fn handle_dry_run(config: &Config, query: &Query) {
    println!("=== Registry-Harvester Dry Run ===\n");

    println!("Query:");
    println!("  Term: {}", query);
    println!("  Key: {}", query.key());

    let layout = Layout::new(&config.output.collect_path);
    println!("\nOutput:");
    println!("  Collect path: {}", layout.root().display());
    println!(
        "  Item records: {}",
        layout
            .record_path(RecordKind::Item, &item_stem(query.key().as_str(), "{itemID}"))
            .display()
    );
    println!(
        "  Consolidated artifact: {}",
        layout.consolidated_path(query.key()).display()
    );

    println!("\nRetry budgets:");
    println!(
        "  Item: {} attempts (short delay for the first {} retries)",
        config.retry.item_attempts, config.retry.item_short_delay_threshold
    );
    println!("  Listing: {} attempts", config.retry.listing_attempts);
    println!("  Page size expansion: {} attempts", config.retry.expand_attempts);
    println!("  Pagination: {} attempts", config.retry.pagination_attempts);

    println!("\nTiming (seconds):");
    println!(
        "  Settle: {} short / {} long",
        config.timing.short_settle, config.timing.long_settle
    );
    println!(
        "  Retry delay: {} short / {} long",
        config.timing.fail_delay, config.timing.long_fail_delay
    );

    println!("\nBrowser:");
    println!("  Entry URL: {}", config.browser.entry_url);
    println!("  Headless: {}", config.browser.headless);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: Option<String>,
    query: &Query,
) -> anyhow::Result<()> {
    tracing::info!(
        "Collecting '{}' into {}",
        query,
        config.output.collect_path.display()
    );

    match crawl(config, config_hash, query).await {
        Ok(report) => {
            tracing::info!(
                "Crawl completed successfully, artifact: {}",
                report.artifact.display()
            );
            print_statistics(&report.stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).context(format!("Crawl for '{}' did not finish", query))
        }
    }
}
