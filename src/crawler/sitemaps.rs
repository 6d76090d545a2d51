//! Sitemap discovery strategy
//!
//! Sitemap locations come from robots.txt first, then from the
//! conventional paths. Sitemap indexes are followed breadth-first, bounded
//! by a total document budget.

use crate::crawler::candidates::CandidateSet;
use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::site::{Site, StrategyOutcome};
use crate::robots::RobotsRules;
use crate::scoring::Candidate;
use crate::storage::PageSource;
use crate::url::{is_sitemap_document, normalize_url};
use chrono::{DateTime, Utc};
use reqwest::Client;
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use sitemap::structs::LastMod;
use std::collections::{HashSet, VecDeque};
use std::io::Cursor;
use tracing::{debug, warn};
use url::Url;

/// Paths probed when robots.txt lists no sitemap that works
const CONVENTIONAL_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemaps.xml"];

/// A page entry from a `<urlset>`
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    pub url: Url,
    pub last_modified: Option<DateTime<Utc>>,
    /// `<priority>`, within 0.0..=1.0
    pub priority: Option<f32>,
    /// `<changefreq>`, lowercase
    pub change_frequency: Option<String>,
}

/// The contents of one sitemap document
#[derive(Debug, Clone, Default)]
pub struct SitemapDocument {
    /// Page entries, in document order
    pub urls: Vec<SitemapUrl>,
    /// Nested sitemaps from a `<sitemapindex>`
    pub sitemaps: Vec<Url>,
    /// First parse problem, if any
    pub error: Option<String>,
}

impl SitemapDocument {
    /// A document is malformed when it failed to parse and yielded nothing
    pub fn is_malformed(&self) -> bool {
        self.error.is_some() && self.urls.is_empty() && self.sitemaps.is_empty()
    }
}

/// Parses a `<urlset>` or `<sitemapindex>` document
///
/// Parsing stops at the first error; entries read before it are kept.
pub fn parse_sitemap(body: &str) -> SitemapDocument {
    let mut doc = SitemapDocument::default();

    if !body.trim_start().starts_with('<') {
        doc.error = Some("not an XML document".to_string());
        return doc;
    }

    for entity in SiteMapReader::new(Cursor::new(body.as_bytes())) {
        match entity {
            SiteMapEntity::Url(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    let last_modified = match entry.lastmod {
                        LastMod::DateTime(ts) => Some(ts.with_timezone(&Utc)),
                        _ => None,
                    };
                    let change_frequency = Some(entry.changefreq.as_str())
                        .filter(|freq| !freq.is_empty())
                        .map(str::to_string);
                    doc.urls.push(SitemapUrl {
                        url,
                        last_modified,
                        priority: entry.priority.get_priority(),
                        change_frequency,
                    });
                }
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    doc.sitemaps.push(url);
                }
            }
            SiteMapEntity::Err(error) => {
                doc.error = Some(error.to_string());
                break;
            }
        }
    }

    if doc.error.is_none() && doc.urls.is_empty() && doc.sitemaps.is_empty() {
        let lower = body.to_lowercase();
        if !lower.contains("</urlset>") && !lower.contains("</sitemapindex>") {
            doc.error = Some("no <urlset> or <sitemapindex> element".to_string());
        }
    }

    doc
}

/// Sitemap locations to try, in order, without duplicates
pub fn sitemap_roots(site: &Site, robots: &RobotsRules) -> Vec<Url> {
    let mut roots: Vec<Url> = Vec::new();

    let declared = robots.sitemaps().iter().filter(|url| site.in_family(url)).cloned();
    let conventional = CONVENTIONAL_PATHS
        .iter()
        .filter_map(|path| site.origin.join(path).ok());
    let www = site.www_origin().and_then(|origin| origin.join("/sitemap.xml").ok());

    for url in declared.chain(conventional).chain(www) {
        if !roots.contains(&url) {
            roots.push(url);
        }
    }
    roots
}

/// Runs the sitemap strategy
///
/// Roots are tried in order; the first one whose sitemap tree yields any
/// page wins. At most `max_documents` sitemap documents are fetched overall.
pub async fn discover(
    client: &Client,
    site: &Site,
    robots: &RobotsRules,
    max_documents: usize,
) -> StrategyOutcome {
    let mut fetched = 0usize;
    let mut visited: HashSet<Url> = HashSet::new();
    let mut malformed: Option<(Url, String)> = None;

    for root in sitemap_roots(site, robots) {
        let mut candidates = CandidateSet::new();
        let mut queue: VecDeque<Url> = VecDeque::from([root.clone()]);

        while let Some(sitemap_url) = queue.pop_front() {
            if fetched >= max_documents {
                debug!(limit = max_documents, "Sitemap document budget exhausted");
                break;
            }
            if !visited.insert(sitemap_url.clone()) || sitemap_url.path().ends_with(".gz") {
                continue;
            }
            fetched += 1;

            let body = match fetch_url(client, &sitemap_url).await {
                FetchResult::Success {
                    body, content_type, ..
                } if !content_type.contains("text/html") => body,
                FetchResult::Success { .. } => {
                    debug!(url = %sitemap_url, "Sitemap location served HTML, skipping");
                    continue;
                }
                other => {
                    debug!(url = %sitemap_url, result = ?other, "Sitemap not available");
                    continue;
                }
            };

            let doc = parse_sitemap(&body);
            if doc.is_malformed() {
                let message = doc.error.clone().unwrap_or_default();
                warn!(url = %sitemap_url, error = %message, "Malformed sitemap");
                malformed.get_or_insert((sitemap_url.clone(), message));
                continue;
            }

            collect_pages(site, &doc, &mut candidates);

            for nested in doc.sitemaps {
                if site.in_family(&nested) && !visited.contains(&nested) {
                    queue.push_back(nested);
                }
            }
        }

        if !candidates.is_empty() {
            return StrategyOutcome::Found {
                candidates,
                sitemap_url: root,
            };
        }

        if fetched >= max_documents {
            break;
        }
    }

    StrategyOutcome::Empty { malformed }
}

fn collect_pages(site: &Site, doc: &SitemapDocument, candidates: &mut CandidateSet) {
    for entry in &doc.urls {
        if !site.in_family(&entry.url) || is_sitemap_document(&entry.url) {
            continue;
        }

        let Ok(url) = normalize_url(entry.url.as_str()) else {
            continue;
        };

        if let Some(host) = site.subdomain(&url) {
            candidates.add_subdomain(host);
        }

        let mut candidate = Candidate::new(url, PageSource::Sitemap);
        candidate.last_modified = entry.last_modified;
        candidate.priority = entry.priority;
        candidate.change_frequency = entry.change_frequency.clone();
        candidates.add(candidate);
    }
}
