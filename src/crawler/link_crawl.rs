//! Link discovery strategy
//!
//! Starts at the homepage and follows links on the main host breadth-first,
//! bounded by depth and by the number of fetches. Links to subdomains are
//! recorded but not followed.

use crate::config::CrawlerConfig;
use crate::crawler::candidates::CandidateSet;
use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::parser::parse_html;
use crate::crawler::site::Site;
use crate::robots::RobotsRules;
use crate::scoring::Candidate;
use crate::storage::PageSource;
use crate::url::{is_sitemap_document, normalize_url};
use crate::{CrawlError, CrawlResult};
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use tracing::debug;
use url::Url;

/// File extensions that never lead to HTML pages
const ASSET_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".zip", ".css", ".js", ".mp4",
    ".mp3", ".doc", ".docx", ".xls", ".xlsx",
];

fn is_asset(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Maps a failed homepage fetch to the crawl error for the whole site
fn homepage_error(url: &Url, result: FetchResult) -> CrawlError {
    match result {
        FetchResult::HttpError { status_code } if (400..500).contains(&status_code) => {
            CrawlError::NotFound {
                url: url.to_string(),
                status: status_code,
            }
        }
        FetchResult::HttpError { status_code } => CrawlError::Network {
            url: url.to_string(),
            message: format!("HTTP {}", status_code),
        },
        FetchResult::NetworkError { error } => CrawlError::Network {
            url: url.to_string(),
            message: error,
        },
        FetchResult::Success { .. } => CrawlError::Network {
            url: url.to_string(),
            message: "unexpected success".to_string(),
        },
    }
}

/// Runs the link strategy, adding every page found to `candidates`
///
/// # Arguments
///
/// * `client` - HTTP client
/// * `site` - The site being crawled
/// * `robots` - robots.txt rules; disallowed pages are not fetched
/// * `agent_token` - Product token matched against robots.txt user-agent lines
/// * `config` - Depth and fetch limits
/// * `candidates` - Collector for discovered pages and subdomains
///
/// # Returns
///
/// An error only when the homepage itself cannot be fetched.
pub async fn discover(
    client: &Client,
    site: &Site,
    robots: &RobotsRules,
    agent_token: &str,
    config: &CrawlerConfig,
    candidates: &mut CandidateSet,
) -> CrawlResult<()> {
    let homepage = site.origin.clone();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(Url, u32)> = VecDeque::new();
    let mut fetches = 0usize;

    visited.insert(homepage.to_string());
    candidates.add(Candidate::new(homepage.clone(), PageSource::Link));
    queue.push_back((homepage.clone(), 0));

    while let Some((url, depth)) = queue.pop_front() {
        if fetches >= config.max_fetches {
            debug!(limit = config.max_fetches, "Fetch budget exhausted");
            break;
        }

        if !robots.is_allowed(url.as_str(), agent_token) {
            debug!(url = %url, "Disallowed by robots.txt");
            continue;
        }

        fetches += 1;
        let result = fetch_url(client, &url).await;
        let is_html = result.is_html();

        let (final_url, body) = match result {
            FetchResult::Success {
                final_url, body, ..
            } => (final_url, body),
            failed if url == homepage => return Err(homepage_error(&url, failed)),
            failed => {
                debug!(url = %url, result = ?failed, "Skipping page");
                continue;
            }
        };

        if !is_html {
            continue;
        }

        let parsed = parse_html(&body, &final_url);
        if let Some(title) = parsed.title {
            candidates.set_title(&url, title);
        }

        for link in parsed.links {
            if !site.in_family(&link.url) || is_asset(&link.url) || is_sitemap_document(&link.url) {
                continue;
            }

            let Ok(target) = normalize_url(link.url.as_str()) else {
                continue;
            };

            if let Some(host) = site.subdomain(&target) {
                candidates.add_subdomain(host);
            }

            let mut candidate = Candidate::new(target.clone(), PageSource::Link);
            candidate.link_text = link.text;
            candidates.add(candidate);

            if site.is_primary(&target)
                && depth < config.max_depth
                && visited.insert(target.to_string())
            {
                queue.push_back((target, depth + 1));
            }
        }
    }

    Ok(())
}
