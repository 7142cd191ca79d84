//! Catalog-Ripple main entry point
//!
//! This is the command-line interface for the catalog crawler.

use anyhow::Context;
use catalog_ripple::config::{load_config_with_hash, validate, Config};
use catalog_ripple::crawler::crawl;
use catalog_ripple::output::{
    generate_markdown_summary, generate_summary, load_statistics, print_statistics,
};
use catalog_ripple::storage::SqliteStorage;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Catalog-Ripple: an academic catalog crawler
///
/// Walks a registration site's catalog from faculties down to course groups,
/// storing every record with per-entity error statistics.
#[derive(Parser, Debug)]
#[command(name = "catalog-ripple")]
#[command(version = "1.0.0")]
#[command(about = "An academic catalog crawler", long_about = None)]
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

    /// Only follow this faculty (overrides the config file)
    #[arg(long, value_name = "ID")]
    faculty: Option<u32>,

    /// Only follow this track (overrides the config file)
    #[arg(long, value_name = "ID")]
    track: Option<u32>,

    /// Catalog year to crawl (overrides the config file)
    #[arg(long)]
    year: Option<u32>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Generate markdown summary from existing data and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    config.apply_overrides(cli.faculty, cli.track, cli.year);
    validate(&config).context("Invalid command-line override")?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_ripple=info,warn"),
            1 => EnvFilter::new("catalog_ripple=debug,info"),
            2 => EnvFilter::new("catalog_ripple=trace,debug"),
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

fn describe_filter(filter: Option<u32>) -> String {
    filter.map_or_else(|| "all".to_string(), |id| id.to_string())
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Ripple Dry Run ===\n");

    println!("Site:");
    println!("  Endpoint: {}", config.site.endpoint);

    println!("\nFilters:");
    println!("  Year: {}", config.filters.year);
    println!("  Faculty: {}", describe_filter(config.filters.faculty));
    println!("  Track: {}", describe_filter(config.filters.track));

    println!("\nCrawler Configuration:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!(
        "  Retries: {} ({}ms apart)",
        config.crawler.max_retries, config.crawler.retry_delay
    );
    println!("  Numeric default: {}", config.crawler.numeric_default);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);
    if let Some(records_path) = &config.output.records_path {
        println!("  Records: {}", records_path);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling the {} catalog from the faculty list",
        config.filters.year
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Crawl Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    tracing::info!("Loading crawl data from database...");
    let summary = generate_summary(&storage)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Year: {}, faculty: {}, track: {}",
        config.filters.year,
        describe_filter(config.filters.faculty),
        describe_filter(config.filters.track)
    );

    match crawl(config, config_hash).await {
        Ok(report) => {
            tracing::info!(
                "Crawl completed successfully: {} records emitted",
                report.records_emitted
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
