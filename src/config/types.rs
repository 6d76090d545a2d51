use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sitemap-Analyzer
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Database location
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./sitemap-analyzer.db".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SitemapAnalyzer".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "bot@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Site crawler limits
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum number of pages kept per company after ranking
    pub max_pages: usize,

    /// Maximum number of subdomains kept per company
    pub max_subdomains: usize,

    /// Maximum link depth followed from the homepage during link discovery
    pub max_depth: u32,

    /// Maximum number of HTML pages fetched during link discovery
    pub max_fetches: usize,

    /// Maximum number of sitemap documents read (indexes included)
    pub max_sitemaps: usize,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 20,
            max_subdomains: 10,
            max_depth: 2,
            max_fetches: 20,
            max_sitemaps: 10,
            request_timeout_secs: 10,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Analysis queue retry policy and priorities
///
/// Priorities follow one convention everywhere: a lower number is more urgent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct QueueConfig {
    /// Attempts allowed before a job fails permanently
    pub max_attempts: u32,

    /// Delay before the first retry (seconds)
    pub backoff_base_secs: u64,

    /// Upper bound on the retry delay (seconds)
    pub backoff_max_secs: u64,

    /// Random jitter added to each delay, as a fraction of the delay (0.0..1.0)
    pub jitter_ratio: f64,

    /// Priority used by the bulk initializer
    pub initial_priority: i64,

    /// Priority used when a reader hits a missing or stale entry
    pub on_demand_priority: i64,

    /// Claims older than this are considered abandoned (minutes)
    pub stale_claim_minutes: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base_secs: 60,
            backoff_max_secs: 6 * 60 * 60,
            jitter_ratio: 0.25,
            initial_priority: 5,
            on_demand_priority: 1,
            stale_claim_minutes: 30,
        }
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WorkerConfig {
    /// Maximum number of crawls in flight at once
    pub concurrency: usize,

    /// Delay between claim rounds in the background loop (seconds)
    pub batch_delay_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            batch_delay_secs: 45,
        }
    }
}

impl WorkerConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_secs(self.batch_delay_secs)
    }
}

/// Cache freshness policy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CacheConfig {
    /// Age in days after which a cached structure is stale
    pub freshness_window_days: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_window_days: 30,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServerConfig {
    /// Address the HTTP API binds to
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}
