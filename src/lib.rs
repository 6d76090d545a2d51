//! Sitemap-Analyzer: cached website-structure analysis for a company directory
//!
//! This crate crawls company websites in the background, ranks the pages it
//! discovers, and caches the resulting structure so readers are answered
//! instantly instead of waiting on a live crawl.

pub mod api;
pub mod config;
pub mod crawler;
pub mod queue;
pub mod robots;
pub mod scoring;
pub mod storage;
pub mod url;
pub mod worker;

use thiserror::Error;

/// Main error type for Sitemap-Analyzer operations
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Worker pool at capacity ({in_flight} jobs in flight), retry later")]
    Capacity { in_flight: usize },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Failures of a single site crawl
///
/// These are local to one analysis job: the worker pool turns them into a
/// `fail` call on that job and never lets them escape a pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrawlError {
    /// Timeout, DNS failure, refused connection or a 5xx root response
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// Malformed sitemap or HTML with nothing usable to fall back on
    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    /// The site root answered with a 4xx status
    #[error("Site root {url} returned HTTP {status}")]
    NotFound { url: String, status: u16 },
}

impl CrawlError {
    /// Short machine-readable kind, stored alongside the error message
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Parse { .. } => "parse",
            Self::NotFound { .. } => "not_found",
        }
    }
}

/// Result type alias for Sitemap-Analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for crawl operations
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use queue::{AnalysisJob, AnalysisQueue, JobStatus};
pub use scoring::{PageCategory, RelevanceScorer};
pub use storage::{Page, SqliteStorage, WebsiteStructure};
pub use crate::url::{extract_domain, normalize_url};
pub use worker::{JobOutcome, WorkerPool};
