//! Sumi-Mirror main entry point
//!
//! This is the command-line interface for the Sumi-Mirror site and HLS mirror.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use sumi_mirror::config::{load_config_with_hash, Config};
use sumi_mirror::crawler::{Coordinator, SegmentPipeline};
use sumi_mirror::output::{generate_markdown_summary, print_statistics, RunKind, RunSummary};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Sumi-Mirror: a recursive site and HLS mirror
///
/// Sumi-Mirror crawls from seed URLs, following links found in HTML, JSON
/// and HLS bodies, and mirrors every resource to a local directory tree.
/// HLS playlists can also be mirrored directly with a bounded worker pool.
#[derive(Parser, Debug)]
#[command(name = "sumi-mirror")]
#[command(version = "1.0.0")]
#[command(about = "A recursive site and HLS mirror", long_about = None)]
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

    /// Which targets to run
    #[arg(long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Validate config and show what would be mirrored without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Crawl every seed, then mirror every playlist
    All,
    /// Crawl the seeds only
    Crawl,
    /// Mirror the playlists only
    Segments,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, cli.mode);
        return Ok(());
    }

    let mut runs = Vec::new();
    if cli.mode != Mode::Segments {
        handle_crawls(&config, &mut runs).await?;
    }
    if cli.mode != Mode::Crawl {
        handle_playlists(&config, &mut runs).await?;
    }

    let runs: Vec<RunSummary> = runs
        .into_iter()
        .map(|run| run.with_config_hash(config_hash.clone()))
        .collect();

    if let Some(summary_path) = &config.output.summary_path {
        tracing::info!("Generating markdown summary...");
        generate_markdown_summary(&runs, Path::new(summary_path))?;
        tracing::info!("Summary written to {}", summary_path);
    }

    if !cli.quiet {
        print_statistics(&runs);
    }

    let aborted = runs.iter().filter(|run| run.is_aborted()).count();
    if aborted > 0 {
        bail!("{} of {} runs aborted", aborted, runs.len());
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
            0 => EnvFilter::new("sumi_mirror=info,warn"),
            1 => EnvFilter::new("sumi_mirror=debug,info"),
            2 => EnvFilter::new("sumi_mirror=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated config and the targets
fn handle_dry_run(config: &Config, mode: Mode) {
    println!("=== Sumi-Mirror Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);
    println!("  Deduplicate: {}", config.crawler.deduplicate);
    match config.crawler.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unlimited"),
    }

    println!("\nSegment Pipeline:");
    println!("  Concurrency: {}", config.segments.concurrency);
    println!("  Follow variants: {}", config.segments.follow_variants);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Destination: {}", config.output.destination);
    if let Some(summary_path) = &config.output.summary_path {
        println!("  Summary: {}", summary_path);
    }

    if mode != Mode::Segments {
        println!("\nSeeds ({}):", config.targets.seeds.len());
        for seed in &config.targets.seeds {
            println!("  - {}", seed);
        }
    }
    if mode != Mode::Crawl {
        println!("\nPlaylists ({}):", config.targets.playlists.len());
        for playlist in &config.targets.playlists {
            println!("  - {}", playlist);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Crawls every seed with a fresh coordinator
async fn handle_crawls(config: &Config, runs: &mut Vec<RunSummary>) -> anyhow::Result<()> {
    tracing::info!("Total seed URLs: {}", config.targets.seeds.len());

    for seed in &config.targets.seeds {
        let seed_url = Url::parse(seed).with_context(|| format!("Invalid seed URL {}", seed))?;
        let started_at = Utc::now();

        let mut coordinator = Coordinator::from_config(config)?;
        match coordinator.run(seed_url).await {
            Ok(report) => runs.push(RunSummary::from_crawl(&report, started_at)),
            Err(e) => {
                tracing::error!("Crawl of {} failed: {}", seed, e);
                runs.push(RunSummary::aborted(RunKind::Crawl, seed, &e, started_at));
            }
        }
    }

    Ok(())
}

/// Mirrors every playlist through the segment pipeline
async fn handle_playlists(config: &Config, runs: &mut Vec<RunSummary>) -> anyhow::Result<()> {
    tracing::info!("Total playlists: {}", config.targets.playlists.len());

    let pipeline = SegmentPipeline::from_config(config)?;
    for playlist in &config.targets.playlists {
        let playlist_url =
            Url::parse(playlist).with_context(|| format!("Invalid playlist URL {}", playlist))?;
        let started_at = Utc::now();

        match pipeline.run(&playlist_url).await {
            Ok(report) => runs.push(RunSummary::from_segments(&report, started_at)),
            Err(e) => {
                tracing::error!("Playlist {} failed: {}", playlist, e);
                runs.push(RunSummary::aborted(RunKind::Segments, playlist, &e, started_at));
            }
        }
    }

    Ok(())
}
