//! Crawler module for discovering the pages of a company website
//!
//! This module contains the site crawling logic, including:
//! - HTTP fetching with typed failure classification
//! - Sitemap discovery (robots.txt directives, conventional locations, indexes)
//! - Bounded link discovery as a fallback
//! - HTML parsing and link extraction

mod candidates;
mod fetcher;
mod link_crawl;
mod parser;
mod site;
mod sitemaps;

pub use candidates::{CandidateSet, MAX_CANDIDATES};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use parser::{parse_html, Link, ParsedPage};
pub use site::{CrawlReport, HttpSiteCrawler, Site, SiteCrawler, StrategyOutcome};
pub use sitemaps::{parse_sitemap, sitemap_roots, SitemapDocument, SitemapUrl};
