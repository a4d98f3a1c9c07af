//! Site-Insights main entry point
//!
//! This is the command-line interface for the Site-Insights content crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use site_insights::config::{resolve_config, Config, CrawlOverrides};
use site_insights::crawler::run_crawl;
use site_insights::output::{
    export_report, load_statistics, print_statistics, ExportFormat, ProjectLayout,
};
use site_insights::storage::open_storage;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Site-Insights: single-domain content crawler
///
/// Crawls one website, extracts titles, headings, images, links and word
/// frequencies from every page and writes Markdown, CSV and JSON reports.
/// Progress is kept in a per-project ledger so runs can be resumed.
#[derive(Parser, Debug)]
#[command(name = "site-insights")]
#[command(version)]
#[command(about = "Single-domain content crawler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to TOML configuration file
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the project folders
    #[arg(short, long, global = true, value_name = "DIR")]
    output: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site and export its pages
    Crawl {
        /// Project identifier, usually the domain (e.g. example.com)
        slug: String,

        /// Base URL to start crawling (e.g. https://example.com)
        base_url: String,

        /// Maximum number of pages to process in this run
        #[arg(long)]
        max_pages: Option<usize>,

        /// Number of concurrent workers
        #[arg(long)]
        workers: Option<usize>,

        /// Timeout in seconds for each request
        #[arg(long)]
        timeout: Option<u64>,

        /// Language for stopword filtering (en, pt-br, es, fr, it, de)
        #[arg(long)]
        language: Option<String>,

        /// Seconds between requests; overrides robots.txt Crawl-delay
        #[arg(long)]
        delay: Option<f64>,

        /// Queue unseen internal links found on visited pages
        #[arg(long)]
        follow_links: bool,

        /// Do not seed the ledger from sitemap.xml
        #[arg(long)]
        no_sitemap: bool,

        /// Render pages in headless Chromium (requires the `browser` feature)
        #[arg(long)]
        browser: bool,
    },

    /// Build a report from a project's page documents
    Export {
        /// Project identifier used when crawling
        slug: String,

        /// Report format: csv, json or markdown
        format: ExportFormat,
    },

    /// Show ledger statistics for a project
    Stats {
        /// Project identifier used when crawling
        slug: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Crawl {
            slug,
            base_url,
            max_pages,
            workers,
            timeout,
            language,
            delay,
            follow_links,
            no_sitemap,
            browser,
        } => {
            if delay.is_some_and(|d| !d.is_finite() || d < 0.0) {
                anyhow::bail!("--delay must be a non-negative number of seconds");
            }
            let overrides = CrawlOverrides {
                max_pages,
                workers,
                timeout_secs: timeout,
                language,
                crawl_delay_ms: delay.map(|seconds| (seconds * 1000.0).round() as u64),
                follow_internal_links: follow_links,
                no_sitemap,
                browser,
                output_root: cli.output,
            };
            let config = load_configuration(cli.config, &overrides)?;
            handle_crawl(&config, &slug, &base_url).await
        }
        Command::Export { slug, format } => {
            let overrides = CrawlOverrides {
                output_root: cli.output,
                ..CrawlOverrides::default()
            };
            let config = load_configuration(cli.config, &overrides)?;
            handle_export(&config, &slug, format)
        }
        Command::Stats { slug } => {
            let overrides = CrawlOverrides {
                output_root: cli.output,
                ..CrawlOverrides::default()
            };
            let config = load_configuration(cli.config, &overrides)?;
            handle_stats(&config, &slug)
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
            0 => EnvFilter::new("site_insights=info,warn"),
            1 => EnvFilter::new("site_insights=debug,info"),
            2 => EnvFilter::new("site_insights=trace,debug"),
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

/// Loads the optional config file and applies command-line overrides
fn load_configuration(path: Option<PathBuf>, overrides: &CrawlOverrides) -> anyhow::Result<Config> {
    if let Some(path) = &path {
        tracing::info!("Loading configuration from: {}", path.display());
    }

    let (config, hash) = resolve_config(path.as_deref(), overrides).context("Invalid configuration")?;
    if let Some(hash) = hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    Ok(config)
}

/// Handles the crawl command
async fn handle_crawl(config: &Config, slug: &str, base_url: &str) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            on_interrupt.cancel();
        }
    });

    tracing::info!(
        "Crawling {} (max pages: {}, workers: {}, language: {})",
        base_url,
        config.crawler.max_pages,
        config.crawler.workers,
        config.crawler.language
    );

    let run = run_crawl(config, slug, base_url, cancel)
        .await
        .context("Crawl failed")?;

    println!("=== Crawl Summary ===\n");
    println!("  Pages processed: {}", run.pages_processed);
    println!("  Pages failed: {}", run.pages_failed);
    println!("  External links: {}", run.external_links.len());
    if run.cancelled {
        println!("  Run was cancelled; remaining URLs stay pending");
    }
    if !run.failures.is_empty() {
        println!("\nFailed URLs:");
        for failure in &run.failures {
            println!("  - {} ({})", failure.url, failure.reason);
        }
    }

    Ok(())
}

/// Handles the export command
fn handle_export(config: &Config, slug: &str, format: ExportFormat) -> anyhow::Result<()> {
    let layout = ProjectLayout::for_project(&config.output.root_dir, slug);

    let path = export_report(&layout, format)
        .with_context(|| format!("Failed to export {} report for {}", format, slug))?;

    println!("✓ Report exported to: {}", path.display());
    Ok(())
}

/// Handles the stats command
fn handle_stats(config: &Config, slug: &str) -> anyhow::Result<()> {
    let layout = ProjectLayout::for_project(&config.output.root_dir, slug);
    let db_path = layout.ledger_db();
    if !db_path.is_file() {
        anyhow::bail!("No ledger found at {}", db_path.display());
    }

    let storage = open_storage(&db_path)?;
    let stats = load_statistics(&storage)?;

    print_statistics(slug, &stats);
    Ok(())
}
