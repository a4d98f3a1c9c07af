//! Crawl orchestration
//!
//! This module contains the main crawl loop, including:
//! - Selecting the pending batch from the ledger
//! - Dispatching fetch, extract and export tasks on a bounded worker pool
//! - Applying completions to the ledger from a single owner
//! - The full `crawl` pipeline around it (reconcile, seed, aggregate, persist)

use crate::config::{validate_base_url, Config, Language};
use crate::crawler::fetcher::{
    build_http_client, FetchBackend, FetchError, HttpFetcher, PageFetcher, RetryPolicy,
};
use crate::crawler::sitemap::seed_from_sitemap;
use crate::crawler::throttle::HostThrottle;
use crate::crawler::{extract_page, CrawlRun, PageResult};
use crate::ledger::{reconcile, Ledger};
use crate::output::{
    read_ledger_csv, write_aggregates, write_ledger_csv, write_ledger_json, write_page_artifacts,
    AggregateInput, ProjectInfo, ProjectLayout,
};
use crate::robots::resolve_crawl_delay;
use crate::storage::{open_storage, LedgerStore, RunStatus};
use crate::url::extract_domain;
use crate::InsightsError;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why one page did not produce artifacts
#[derive(Debug, Clone, Error)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to write artifacts: {0}")]
    Export(String),

    #[error("Page task failed: {0}")]
    Task(String),
}

impl PageError {
    /// Transient failures leave the URL Pending instead of Failed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch(e) if e.is_transient())
    }
}

/// Parameters of one orchestrator pass
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub domain: String,
    pub base_url: Url,
    /// Maximum number of pending URLs dispatched
    pub max_pages: usize,
    /// Maximum number of tasks in flight
    pub workers: usize,
    pub language: Language,
    pub follow_internal_links: bool,
    /// Request spacing used by the fetcher, recorded in the run summary
    pub crawl_delay: Duration,
}

/// Drives a bounded-concurrency crawl over the ledger's pending rows
pub struct Orchestrator<F: PageFetcher = HttpFetcher> {
    fetcher: Arc<F>,
    layout: Arc<ProjectLayout>,
    settings: CrawlSettings,
    cancel: CancellationToken,
    progress: ProgressBar,
}

impl<F: PageFetcher> Orchestrator<F> {
    /// Creates an orchestrator writing page artifacts into `layout`
    pub fn new(fetcher: F, layout: ProjectLayout, settings: CrawlSettings) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            layout: Arc::new(layout),
            settings,
            cancel: CancellationToken::new(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Reports completions on `progress`; hidden by default
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Uses an externally owned token, e.g. one cancelled on Ctrl-C
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Processes at most `max_pages` pending URLs with at most `workers` in flight
    ///
    /// Only this loop mutates `ledger`: successes become Visited with today's
    /// date and their artifact names, permanent failures become Failed and
    /// transient failures stay Pending. With no pending rows the ledger is
    /// left untouched.
    pub async fn run(&self, ledger: &mut Ledger) -> CrawlRun {
        let mut run = CrawlRun::new(&self.settings);

        let mut seen = HashSet::new();
        let batch: Vec<String> = ledger
            .select_pending(self.settings.max_pages)
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect();

        if batch.is_empty() {
            tracing::info!("No pending URLs to process");
            return run;
        }

        let workers = self.settings.workers.max(1);
        tracing::info!(
            "Dispatching {} URLs with {} workers",
            batch.len(),
            workers
        );

        self.progress.set_length(batch.len() as u64);
        self.progress.set_position(0);

        let mut queue = batch.into_iter();
        let mut in_flight: HashSet<String> = HashSet::new();
        let mut tasks: JoinSet<(String, Result<PageResult, PageError>)> = JoinSet::new();

        loop {
            while tasks.len() < workers && !self.cancel.is_cancelled() {
                let Some(url) = queue.next() else {
                    break;
                };
                in_flight.insert(url.clone());
                self.spawn_page(&mut tasks, url);
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };

            match joined {
                Ok((url, result)) => {
                    in_flight.remove(&url);
                    self.apply(ledger, &mut run, &url, result);
                    self.progress.set_message(url);
                    self.progress.inc(1);
                }
                Err(e) => tracing::error!("Page task could not be joined: {}", e),
            }
        }

        // Only reachable if a wrapper task itself died
        for url in in_flight {
            self.apply(
                ledger,
                &mut run,
                &url,
                Err(PageError::Task("task lost".to_string())),
            );
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        if self.cancel.is_cancelled() {
            run.cancelled = true;
            tracing::warn!("Crawl cancelled, undispatched URLs remain pending");
        }

        if self.settings.follow_internal_links {
            let added = ledger.merge_discovered(run.internal_links());
            tracing::info!("Queued {} newly discovered internal links", added);
        }

        run
    }

    fn spawn_page(
        &self,
        tasks: &mut JoinSet<(String, Result<PageResult, PageError>)>,
        url: String,
    ) {
        let fetcher = Arc::clone(&self.fetcher);
        let layout = Arc::clone(&self.layout);
        let domain = self.settings.domain.clone();
        let language = self.settings.language;
        let cancel = self.cancel.clone();

        tasks.spawn(async move {
            // The page runs in its own task so a panic maps to this URL
            let page = tokio::spawn(process_page(
                fetcher,
                layout,
                url.clone(),
                domain,
                language,
                cancel,
            ));
            let result = match page.await {
                Ok(result) => result,
                Err(e) => Err(PageError::Task(e.to_string())),
            };
            (url, result)
        });
    }

    fn apply(
        &self,
        ledger: &mut Ledger,
        run: &mut CrawlRun,
        url: &str,
        result: Result<PageResult, PageError>,
    ) {
        match result {
            Ok(page) => {
                let today = chrono::Local::now().date_naive();
                ledger.mark_visited(url, today, &page.markdown_filename, &page.json_filename);
                tracing::debug!("Visited {}", url);
                run.record_success(page);
            }
            Err(e) if e.is_transient() => {
                tracing::warn!("{} left pending: {}", url, e);
                run.record_failure(url, &e);
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", url, e);
                ledger.mark_failed(url);
                run.record_failure(url, &e);
            }
        }
    }
}

/// Fetch, extract and export one page
async fn process_page<F: PageFetcher>(
    fetcher: Arc<F>,
    layout: Arc<ProjectLayout>,
    url: String,
    domain: String,
    language: Language,
    cancel: CancellationToken,
) -> Result<PageResult, PageError> {
    let parsed = Url::parse(&url).map_err(|e| PageError::InvalidUrl(e.to_string()))?;

    let fetched = fetcher.fetch(&parsed, &cancel).await?;
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled.into());
    }

    let page = extract_page(&fetched.body, &parsed, &domain, language);
    write_page_artifacts(&layout, &page, &fetched.body)
        .map_err(|e| PageError::Export(e.to_string()))?;

    Ok(page)
}

/// Terminal progress bar for a crawl; draws nothing when stderr is not a TTY
fn crawl_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let template = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}";
    match ProgressStyle::with_template(template) {
        Ok(style) => bar.set_style(style.progress_chars("##-")),
        Err(e) => tracing::debug!("Invalid progress template: {}", e),
    }
    bar
}

/// Runs the complete `crawl` command for one project
///
/// This is the main entry point for a crawl. It will:
/// 1. Open (or create) the project folder and its ledger database
/// 2. Resolve the crawl delay from configuration or robots.txt
/// 3. Reconcile the ledger and seed it with the base URL and sitemap
/// 4. Run the orchestrator over the pending batch
/// 5. Persist the ledger once, then write the aggregate artifacts once
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `project` - Project identifier; its slug names the project folder
/// * `base_url` - Site root to crawl
/// * `cancel` - Token that stops dispatch when cancelled
///
/// # Returns
///
/// * `Ok(CrawlRun)` - The run finished (possibly with per-page failures)
/// * `Err(InsightsError)` - Setup or ledger persistence failed
///
/// # Example
///
/// ```no_run
/// use site_insights::config::Config;
/// use site_insights::crawler::run_crawl;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let run = run_crawl(&Config::default(), "example.com", "https://example.com", CancellationToken::new()).await?;
/// println!("{} pages processed", run.pages_processed);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    project: &str,
    base_url: &str,
    cancel: CancellationToken,
) -> Result<CrawlRun, InsightsError> {
    let base_url = validate_base_url(base_url)?;
    let domain = extract_domain(base_url.as_str())?;
    let language: Language = config.crawler.language.parse()?;
    let backend = FetchBackend::select(config.crawler.browser)?;

    let layout = ProjectLayout::for_project(&config.output.root_dir, project);
    layout.ensure_dirs().map_err(|source| InsightsError::OutputDir {
        path: layout.dir().display().to_string(),
        source,
    })?;

    let mut storage = open_storage(&layout.ledger_db())?;
    let mut ledger = storage.load_ledger()?;
    let ledger_csv = layout.ledger_csv(&domain);
    if ledger.is_empty() && ledger_csv.is_file() {
        ledger = read_ledger_csv(&ledger_csv)?;
        tracing::info!("Imported {} URLs from {}", ledger.len(), ledger_csv.display());
    }

    let run_id = storage.create_run()?;
    tracing::info!("Starting crawl run {} for {}", run_id, base_url);

    let timeout = Duration::from_secs(config.crawler.timeout_secs);
    let client = Arc::new(build_http_client(&config.user_agent, timeout)?);

    let configured_delay = config.crawler.crawl_delay_ms.map(Duration::from_millis);
    let crawl_delay = resolve_crawl_delay(
        &client,
        &base_url,
        &config.user_agent.crawler_name,
        configured_delay,
    )
    .await;

    reconcile(&mut ledger, &layout);
    if ledger.insert_pending(base_url.as_str()) {
        tracing::debug!("Seeded ledger with {}", base_url);
    }
    if config.crawler.use_sitemap {
        seed_from_sitemap(&client, &base_url, &mut ledger).await;
    }

    let settings = CrawlSettings {
        domain: domain.clone(),
        base_url: base_url.clone(),
        max_pages: config.crawler.max_pages,
        workers: config.crawler.workers,
        language,
        follow_internal_links: config.crawler.follow_internal_links,
        crawl_delay,
    };
    let throttle = Arc::new(HostThrottle::new(crawl_delay));
    let run = match backend {
        FetchBackend::Http => {
            let fetcher = HttpFetcher::new(
                Arc::clone(&client),
                throttle,
                RetryPolicy::from_config(&config.crawler),
            );
            Orchestrator::new(fetcher, layout.clone(), settings)
                .with_cancellation(cancel)
                .with_progress(crawl_progress_bar())
                .run(&mut ledger)
                .await
        }
        #[cfg(feature = "browser")]
        FetchBackend::Browser => {
            let fetcher = crate::crawler::BrowserFetcher::launch(throttle, timeout)
                .await
                .map_err(|e| InsightsError::Browser(e.to_string()))?;
            Orchestrator::new(fetcher, layout.clone(), settings)
                .with_cancellation(cancel)
                .with_progress(crawl_progress_bar())
                .run(&mut ledger)
                .await
        }
    };

    storage.save_ledger(&ledger)?;
    if let Err(e) = write_ledger_csv(&ledger_csv, &ledger) {
        tracing::error!("Failed to write ledger mirror {}: {}", ledger_csv.display(), e);
    }
    let ledger_json = layout.ledger_json(&domain);
    if let Err(e) = write_ledger_json(&ledger_json, &ledger) {
        tracing::error!("Failed to write ledger mirror {}: {}", ledger_json.display(), e);
    }

    let project_slug = layout.project_slug();
    let base_url_str = base_url.to_string();
    let input = AggregateInput {
        domain: &domain,
        external_links: &run.external_links,
        corpus: &run.corpus,
        language,
        pages: &run.pages,
        project: ProjectInfo {
            project_slug: &project_slug,
            domain: &domain,
            base_url: &base_url_str,
            language: language.code(),
            max_pages: config.crawler.max_pages,
            max_workers: config.crawler.workers,
            crawl_delay: crawl_delay.as_secs_f64(),
        },
    };
    let errors = write_aggregates(&layout, &input);
    if !errors.is_empty() {
        tracing::error!("{} aggregate exports failed", errors.len());
    }

    let status = if run.cancelled {
        RunStatus::Cancelled
    } else {
        RunStatus::Completed
    };
    storage.finish_run(
        run_id,
        status,
        run.pages_processed as u64,
        run.pages_failed as u64,
    )?;

    run.log_summary();
    Ok(run)
}
