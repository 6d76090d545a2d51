//! Sitemap-Analyzer main entry point
//!
//! This is the command-line interface for the website-structure analysis
//! pipeline: the HTTP read API, the background worker, and the
//! administrative queue operations.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use sitemap_analyzer::api::{router, AppState, ReadApi};
use sitemap_analyzer::config::{load_config_with_hash, Config};
use sitemap_analyzer::crawler::{HttpSiteCrawler, SiteCrawler};
use sitemap_analyzer::queue::{AnalysisQueue, RetryPolicy};
use sitemap_analyzer::storage::{lock, open_storage, Company, SqliteStorage};
use sitemap_analyzer::url::canonical_domain;
use sitemap_analyzer::worker::{WorkerPool, WorkerSettings};
use sitemap_analyzer::RelevanceScorer;
use tracing_subscriber::EnvFilter;

/// Sitemap-Analyzer: cached website structure for a company directory
///
/// Crawls company websites in the background, ranks the pages found
/// (careers pages first) and serves the cached result without waiting on
/// a live crawl.
#[derive(Parser, Debug)]
#[command(name = "sitemap-analyzer")]
#[command(version)]
#[command(about = "Cached website-structure analysis for company websites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Also run the background worker loop in this process
        #[arg(long)]
        with_worker: bool,
    },

    /// Process the queue until interrupted
    Work,

    /// Queue every company in the directory
    InitializeQueue {
        /// Priority for new jobs (lower is more urgent)
        #[arg(long)]
        priority: Option<i64>,
    },

    /// Run a single worker pass and print the outcomes
    ProcessQueue {
        /// Maximum jobs to claim
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Crawl one domain now and print the ranked structure as JSON
    Analyze {
        /// Domain or URL to analyze
        domain: String,
    },

    /// Show queue statistics
    Stats,

    /// Add or update a company in the local directory
    AddCompany {
        id: i64,
        name: String,
        /// Company website
        #[arg(long)]
        domain: Option<String>,
    },

    /// Delete every queued job
    ClearQueue,

    /// Delete finished jobs older than the given number of days
    PurgeJobs {
        #[arg(long, default_value_t = 30)]
        older_than_days: i64,
    },
}

type SharedStorage = Arc<Mutex<SqliteStorage>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    match cli.command {
        Command::Serve { with_worker } => handle_serve(config, with_worker).await,
        Command::Work => handle_work(config).await,
        Command::InitializeQueue { priority } => handle_initialize_queue(&config, priority),
        Command::ProcessQueue { batch_size } => handle_process_queue(config, batch_size).await,
        Command::Analyze { domain } => handle_analyze(&config, &domain).await,
        Command::Stats => handle_stats(&config),
        Command::AddCompany { id, name, domain } => handle_add_company(&config, id, name, domain),
        Command::ClearQueue => handle_clear_queue(&config),
        Command::PurgeJobs { older_than_days } => handle_purge_jobs(&config, older_than_days),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_analyzer=info,warn"),
            1 => EnvFilter::new("sitemap_analyzer=debug,info"),
            2 => EnvFilter::new("sitemap_analyzer=trace,debug"),
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

fn open_shared_storage(config: &Config) -> Result<SharedStorage> {
    let path = Path::new(&config.storage.database_path);
    let storage = open_storage(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    Ok(Arc::new(Mutex::new(storage)))
}

fn build_queue(config: &Config, storage: &SharedStorage) -> AnalysisQueue<SqliteStorage> {
    AnalysisQueue::new(Arc::clone(storage), RetryPolicy::from_config(&config.queue))
}

fn build_pool(
    config: &Config,
    storage: &SharedStorage,
) -> Result<WorkerPool<SqliteStorage, HttpSiteCrawler>> {
    let crawler = HttpSiteCrawler::new(config.crawler.clone(), &config.user_agent)
        .context("Failed to build HTTP client")?;
    Ok(WorkerPool::new(
        build_queue(config, storage),
        Arc::clone(storage),
        Arc::new(crawler),
        WorkerSettings::from_config(config),
    ))
}

/// Resolves when the process receives Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Handles `serve`: runs the HTTP API until interrupted
async fn handle_serve(config: Config, with_worker: bool) -> Result<()> {
    let storage = open_shared_storage(&config)?;
    let pool = Arc::new(build_pool(&config, &storage)?);

    let state = AppState {
        api: ReadApi::new(build_queue(&config, &storage), Arc::clone(&storage), &config),
        pool: Arc::clone(&pool),
        default_batch_size: config.worker.concurrency,
    };

    let worker = if with_worker {
        let pool = Arc::clone(&pool);
        Some(tokio::spawn(async move { pool.run(shutdown_signal()).await }))
    } else {
        None
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    tracing::info!("Listening on {}", config.server.bind_address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Some(worker) = worker {
        let summary = worker.await.context("Worker task panicked")??;
        tracing::info!(
            "Worker stopped: {} succeeded, {} skipped, {} failed",
            summary.succeeded,
            summary.skipped,
            summary.failed
        );
    }

    Ok(())
}

/// Handles `work`: processes the queue until interrupted
async fn handle_work(config: Config) -> Result<()> {
    let storage = open_shared_storage(&config)?;
    let pool = build_pool(&config, &storage)?;

    let summary = pool.run(shutdown_signal()).await?;
    tracing::info!(
        "Worker stopped: {} succeeded, {} skipped, {} failed",
        summary.succeeded,
        summary.skipped,
        summary.failed
    );
    Ok(())
}

fn handle_initialize_queue(config: &Config, priority: Option<i64>) -> Result<()> {
    let storage = open_shared_storage(config)?;
    let api = ReadApi::new(build_queue(config, &storage), Arc::clone(&storage), config);
    let priority = priority.unwrap_or(config.queue.initial_priority);

    let summary = api.initialize_queue(priority)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn handle_process_queue(config: Config, batch_size: Option<usize>) -> Result<()> {
    let storage = open_shared_storage(&config)?;
    let pool = build_pool(&config, &storage)?;
    let batch_size = batch_size.unwrap_or(config.worker.concurrency);

    let outcomes = pool.run_pass(batch_size).await?;
    let report = json!({ "processed": outcomes.len(), "outcomes": outcomes });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Handles `analyze`: a one-off crawl that bypasses the queue and the cache
async fn handle_analyze(config: &Config, domain: &str) -> Result<()> {
    let domain = canonical_domain(domain)?;
    let crawler = HttpSiteCrawler::new(config.crawler.clone(), &config.user_agent)
        .context("Failed to build HTTP client")?;

    tracing::info!("Analyzing {}", domain);
    let report = crawler.crawl(&domain).await?;

    let mut subdomains = report.subdomains;
    subdomains.truncate(config.crawler.max_subdomains);
    let pages = RelevanceScorer::default().rank(report.candidates, config.crawler.max_pages);
    let has_careers_page = pages
        .iter()
        .any(|page| page.category == sitemap_analyzer::PageCategory::Careers);

    let output = json!({
        "domain": report.domain,
        "discoveryMethod": report.discovery_method,
        "sitemapUrl": report.sitemap_url,
        "hasCareersPage": has_careers_page,
        "subdomains": subdomains,
        "pages": pages,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Handles `stats`: prints queue statistics
fn handle_stats(config: &Config) -> Result<()> {
    let storage = open_shared_storage(config)?;
    let stats = build_queue(config, &storage).stats()?;

    println!("Database: {}\n", config.storage.database_path);
    println!("Queue:");
    println!("  Queued:      {}", stats.queued);
    println!("  In progress: {}", stats.in_progress);
    println!("  Succeeded:   {}", stats.succeeded);
    println!("  Failed:      {}", stats.failed);
    println!("  Total:       {}", stats.total);
    match stats.avg_processing_ms {
        Some(ms) => println!("  Avg processing time: {:.0}ms", ms),
        None => println!("  Avg processing time: n/a"),
    }
    Ok(())
}

fn handle_add_company(config: &Config, id: i64, name: String, domain: Option<String>) -> Result<()> {
    let storage = open_shared_storage(config)?;
    let company = Company { id, name, domain };
    lock(&storage)?.upsert_company(&company)?;
    println!("✓ Company {} saved", company.id);
    Ok(())
}

fn handle_clear_queue(config: &Config) -> Result<()> {
    let storage = open_shared_storage(config)?;
    let removed = build_queue(config, &storage).clear()?;
    println!("✓ Removed {} queued jobs", removed);
    Ok(())
}

fn handle_purge_jobs(config: &Config, older_than_days: i64) -> Result<()> {
    let storage = open_shared_storage(config)?;
    let removed = build_queue(config, &storage).purge_finished(chrono::Duration::days(older_than_days))?;
    println!("✓ Purged {} finished jobs older than {} days", removed, older_than_days);
    Ok(())
}
