//! Storage module for persisting analysis data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - The analysis job queue and its statistics view
//! - Cached website structures with their pages and subdomains
//! - The local mirror of the company directory

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{CacheStore, CompanyDirectory, QueueStore, Storage, StorageError, StorageResult};

use crate::scoring::PageCategory;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Locks a shared backend, reporting a poisoned lock as unavailable storage
pub fn lock<S>(storage: &Mutex<S>) -> StorageResult<MutexGuard<'_, S>> {
    storage
        .lock()
        .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))
}

/// How a page was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    Sitemap,
    Link,
}

impl PageSource {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Sitemap => "sitemap",
            Self::Link => "link",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "sitemap" => Some(Self::Sitemap),
            "link" => Some(Self::Link),
            _ => None,
        }
    }
}

/// Which crawl strategy produced a structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    Sitemap,
    LinkCrawl,
}

impl DiscoveryMethod {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Sitemap => "sitemap",
            Self::LinkCrawl => "link_crawl",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "sitemap" => Some(Self::Sitemap),
            "link_crawl" => Some(Self::LinkCrawl),
            _ => None,
        }
    }
}

/// A scored page belonging to one website structure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub url: String,
    pub title: Option<String>,
    pub category: PageCategory,
    pub score: u32,
    pub source: PageSource,
    pub depth: u32,
    pub last_modified: Option<DateTime<Utc>>,
    /// Sitemap `<priority>`, when the page came from a sitemap that set one
    pub priority: Option<f32>,
    pub change_frequency: Option<String>,
}

/// Whether a cached structure is still within its freshness window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    Stale,
}

/// The cached analysis result for one company
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteStructure {
    pub company_id: i64,
    pub domain: String,
    /// Best first
    pub pages: Vec<Page>,
    /// Sorted, without duplicates
    pub subdomains: Vec<String>,
    pub last_analyzed_at: DateTime<Utc>,
    pub freshness_window_days: i64,
    pub has_careers_page: bool,
    pub discovery_method: DiscoveryMethod,
    pub sitemap_url: Option<String>,
}

impl WebsiteStructure {
    /// Builds a structure, deriving `has_careers_page` from the pages
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        company_id: i64,
        domain: impl Into<String>,
        pages: Vec<Page>,
        mut subdomains: Vec<String>,
        discovery_method: DiscoveryMethod,
        sitemap_url: Option<String>,
        last_analyzed_at: DateTime<Utc>,
        freshness_window_days: i64,
    ) -> Self {
        subdomains.sort();
        subdomains.dedup();
        let has_careers_page = pages.iter().any(|p| p.category == PageCategory::Careers);

        Self {
            company_id,
            domain: domain.into(),
            pages,
            subdomains,
            last_analyzed_at,
            freshness_window_days,
            has_careers_page,
            discovery_method,
            sitemap_url,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_analyzed_at
    }

    /// Fresh until strictly more than the window has elapsed
    pub fn freshness(&self, now: DateTime<Utc>) -> Freshness {
        if self.age(now) > chrono::Duration::days(self.freshness_window_days) {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }
}

/// A company from the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i64,
    pub name: String,
    /// Website as recorded in the directory; may be missing or unnormalized
    pub domain: Option<String>,
}
