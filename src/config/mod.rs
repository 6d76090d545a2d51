//! Configuration module for Sitemap-Analyzer
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitemap_analyzer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("analyzer.toml")).unwrap();
//! println!("Worker concurrency: {}", config.worker.concurrency);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    CacheConfig, Config, CrawlerConfig, QueueConfig, ServerConfig, StorageConfig,
    UserAgentConfig, WorkerConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
