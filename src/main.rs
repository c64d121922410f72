//! Ripcrawl main entry point
//!
//! This is the command-line interface for the Ripcrawl web crawler.

use clap::Parser;
use ripcrawl::config::load_config_with_hash;
use ripcrawl::engine::Engine;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Ripcrawl: a polite, concurrent web crawler
///
/// Ripcrawl crawls websites while respecting robots.txt, rate limits,
/// and domain classifications. It maps link relationships between sites
/// and generates comprehensive summaries.
#[derive(Parser, Debug)]
#[command(name = "ripcrawl")]
#[command(version = "0.1.0")]
#[command(about = "A polite, concurrent web crawler", long_about = None)]
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

    /// Resume an interrupted crawl (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh crawl, ignoring previous state
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

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
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::from(1);
        }
    };

    let result = if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.export_summary {
        handle_export_summary(&config)
    } else {
        handle_crawl(config, &config_hash, cli.fresh).await
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(2)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripcrawl=info,warn"),
            1 => EnvFilter::new("ripcrawl=debug,info"),
            2 => EnvFilter::new("ripcrawl=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &ripcrawl::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Ripcrawl Dry Run ===\n");

    println!("Engine Configuration:");
    println!("  Max depth: {}", config.engine.max_depth);
    println!("  Max concurrent tasks: {}", config.engine.max_concurrent_tasks);
    println!("  Max concurrent per domain: {}", config.engine.max_concurrent_per_domain);
    println!("  Request delay: {}ms", config.engine.request_delay_ms);
    println!("  Respect robots.txt: {}", config.engine.respect_robots_txt);
    println!("  Anti-bot detection: {}", config.engine.enable_anti_bot_detection);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nQuality Domains ({}):", config.quality.len());
    for entry in &config.quality {
        println!("  - {} ({} seeds)", entry.domain, entry.seeds.len());
        for seed in &entry.seeds {
            println!("    * {}", seed);
        }
    }

    println!("\nBlacklisted Domains ({}):", config.blacklist.len());
    for entry in &config.blacklist {
        println!("  - {}", entry.domain);
    }

    println!("\nStubbed Domains ({}):", config.stub.len());
    for entry in &config.stub {
        println!("  - {}", entry.domain);
    }

    println!("\n\u{2713} Configuration is valid");
    println!(
        "\u{2713} Would start crawling with {} seed URLs",
        config.quality.iter().map(|q| q.seeds.len()).sum::<usize>()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &ripcrawl::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    use ripcrawl::output::{load_statistics, print_statistics};
    use ripcrawl::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary for the latest run
fn handle_export_summary(config: &ripcrawl::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    use ripcrawl::output::{generate_markdown_summary, generate_summary};
    use ripcrawl::storage::{SqliteStorage, Storage};
    use std::path::Path;

    println!("=== Exporting Crawl Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run_id = storage
        .get_latest_run()?
        .ok_or("no crawl runs found in database")?
        .id;

    tracing::info!("Loading crawl data from database...");
    let summary = generate_summary(&storage, run_id)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("\u{2713} Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Runs the crawl to completion, printing a final summary on success.
async fn handle_crawl(
    config: ripcrawl::config::Config,
    config_hash: &str,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use ripcrawl::storage::SqliteStorage;
    use std::path::Path;
    use std::sync::Arc;

    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume frontier state if an interrupted run exists)");
    }

    tracing::info!(
        "Quality domains: {}, Blacklist: {}, Stub: {}",
        config.quality.len(),
        config.blacklist.len(),
        config.stub.len()
    );

    let seed_count: usize = config.quality.iter().map(|q| q.seeds.len()).sum();
    tracing::info!("Total seed URLs: {}", seed_count);

    let database_path = config.output.database_path.clone();
    if fresh {
        let _ = std::fs::remove_file(&database_path);
    }
    let storage = SqliteStorage::new(Path::new(&database_path))?;

    let engine = Arc::new(Engine::new(config, config_hash, storage)?);
    engine.add_seed_urls()?;

    let summary = engine.run_to_completion().await?;

    tracing::info!(
        "Crawl completed: {} pages processed across {} domains",
        summary.total_pages,
        summary.unique_domains
    );
    println!(
        "\u{2713} Crawl finished: {} pages, {} domains, {} errors",
        summary.total_pages, summary.unique_domains, summary.total_errors
    );

    Ok(())
}
