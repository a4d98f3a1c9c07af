use serde::Deserialize;

/// Main configuration structure for Site-Insights
///
/// Every section and field is optional in the TOML file; missing values take
/// the defaults below. Command-line flags are applied on top of this.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pending URLs processed per run
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Maximum number of concurrent page tasks
    pub workers: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Fixed delay between requests to the host (milliseconds)
    ///
    /// When unset, the robots.txt `Crawl-delay` is used, falling back to zero.
    #[serde(rename = "crawl-delay-ms")]
    pub crawl_delay_ms: Option<u64>,

    /// Total attempts per URL, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// First retry backoff (milliseconds); doubles on each further attempt
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on a single backoff wait (milliseconds)
    #[serde(rename = "backoff-max-ms")]
    pub backoff_max_ms: u64,

    /// Append unseen same-domain links from visited pages to the ledger
    #[serde(rename = "follow-internal-links")]
    pub follow_internal_links: bool,

    /// Seed the ledger from `<base>/sitemap.xml` before each run
    #[serde(rename = "use-sitemap")]
    pub use_sitemap: bool,

    /// Render pages in headless Chromium (needs the `browser` feature)
    pub browser: bool,

    /// Stopword language code (`en`, `pt-br`, `es`, `fr`, `it`, `de`)
    pub language: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            workers: 4,
            timeout_secs: 10,
            crawl_delay_ms: None,
            max_attempts: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 8_000,
            follow_internal_links: false,
            use_sitemap: true,
            browser: false,
            language: "en".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "site-insights".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl UserAgentConfig {
    /// The `User-Agent` header value, e.g. `site-insights/1.0.0`
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory under which one folder per project is created
    #[serde(rename = "root-dir")]
    pub root_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: ".".to_string(),
        }
    }
}

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct CrawlOverrides {
    pub max_pages: Option<usize>,
    pub workers: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub language: Option<String>,
    pub crawl_delay_ms: Option<u64>,
    pub follow_internal_links: bool,
    pub no_sitemap: bool,
    pub browser: bool,
    pub output_root: Option<String>,
}

impl Config {
    /// Applies command-line overrides on top of file values
    pub fn apply_overrides(&mut self, overrides: &CrawlOverrides) {
        if let Some(max_pages) = overrides.max_pages {
            self.crawler.max_pages = max_pages;
        }
        if let Some(workers) = overrides.workers {
            self.crawler.workers = workers;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.crawler.timeout_secs = timeout;
        }
        if let Some(language) = &overrides.language {
            self.crawler.language = language.clone();
        }
        if let Some(delay) = overrides.crawl_delay_ms {
            self.crawler.crawl_delay_ms = Some(delay);
        }
        if overrides.follow_internal_links {
            self.crawler.follow_internal_links = true;
        }
        if overrides.no_sitemap {
            self.crawler.use_sitemap = false;
        }
        if overrides.browser {
            self.crawler.browser = true;
        }
        if let Some(root) = &overrides.output_root {
            self.output.root_dir = root.clone();
        }
    }
}
