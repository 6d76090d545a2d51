//! The crawl target and the crawler seam used by the worker pool

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::candidates::CandidateSet;
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::{link_crawl, sitemaps};
use crate::robots::{robots_url, RobotsRules};
use crate::scoring::Candidate;
use crate::storage::DiscoveryMethod;
use crate::url::{extract_domain, in_site_family, is_primary_host, subdomain_of};
use crate::{CrawlError, CrawlResult};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::{Host, Url};

/// A company website: its bare domain and the origin requests start from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Lowercase host without a `www.` prefix
    pub domain: String,
    /// Scheme, host and port of the homepage
    pub origin: Url,
}

impl Site {
    /// Builds a site from a domain (`acme.com`) or a full URL
    ///
    /// `scheme` is used when `domain` has none.
    pub fn new(domain: &str, scheme: &str) -> CrawlResult<Self> {
        let input = domain.trim();
        let raw = if input.contains("://") {
            input.to_string()
        } else {
            format!("{}://{}", scheme, input.trim_end_matches('/'))
        };

        let parse_error = |message: String| CrawlError::Parse {
            url: domain.to_string(),
            message,
        };

        let mut origin = Url::parse(&raw).map_err(|e| parse_error(e.to_string()))?;
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);

        let host = extract_domain(&origin)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| parse_error("missing host".to_string()))?;
        let domain = host.strip_prefix("www.").unwrap_or(&host).to_string();

        Ok(Self { domain, origin })
    }

    /// True for the domain itself and its `www.` variant
    pub fn is_primary(&self, url: &Url) -> bool {
        extract_domain(url).is_some_and(|host| is_primary_host(&self.domain, &host))
    }

    /// True for the domain, its `www.` variant, and any subdomain
    pub fn in_family(&self, url: &Url) -> bool {
        extract_domain(url).is_some_and(|host| in_site_family(&self.domain, &host))
    }

    /// The host of `url` if it is a subdomain other than `www.`
    pub fn subdomain(&self, url: &Url) -> Option<String> {
        extract_domain(url).and_then(|host| subdomain_of(&self.domain, &host))
    }

    /// The `www.` origin, when the site is addressed by a bare domain name
    pub fn www_origin(&self) -> Option<Url> {
        if !matches!(self.origin.host(), Some(Host::Domain(_))) {
            return None;
        }
        let host = extract_domain(&self.origin)?;
        if host.starts_with("www.") {
            return None;
        }
        let mut www = self.origin.clone();
        www.set_host(Some(&format!("www.{}", host))).ok()?;
        Some(www)
    }
}

/// Everything one crawl discovered, before scoring
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub domain: String,
    /// Deduplicated candidates in discovery order
    pub candidates: Vec<Candidate>,
    /// Subdomains seen, capped
    pub subdomains: Vec<String>,
    pub discovery_method: DiscoveryMethod,
    /// The sitemap that yielded pages, if any
    pub sitemap_url: Option<String>,
}

/// Result of trying the sitemap strategy
#[derive(Debug)]
pub enum StrategyOutcome {
    /// Sitemaps produced at least one page
    Found {
        candidates: CandidateSet,
        sitemap_url: Url,
    },
    /// Nothing usable; `malformed` carries the first sitemap parse problem
    Empty { malformed: Option<(Url, String)> },
}

/// Discovers the pages of a company website
#[async_trait]
pub trait SiteCrawler: Send + Sync + 'static {
    async fn crawl(&self, domain: &str) -> CrawlResult<CrawlReport>;
}

/// Crawls live websites over HTTP
pub struct HttpSiteCrawler {
    client: Client,
    config: CrawlerConfig,
    agent_token: String,
    scheme: String,
}

impl HttpSiteCrawler {
    /// Creates a crawler from the crawler and user agent settings
    ///
    /// # Arguments
    ///
    /// * `config` - Crawl limits and timeouts
    /// * `user_agent` - Identification sent with every request
    pub fn new(config: CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, config.request_timeout())?;
        Ok(Self {
            client,
            config,
            agent_token: user_agent.crawler_name.clone(),
            scheme: "https".to_string(),
        })
    }

    /// Uses `scheme` for bare domains instead of https
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    /// Fetches robots.txt; any failure means no restrictions
    async fn fetch_robots(&self, site: &Site) -> RobotsRules {
        let Some(url) = robots_url(&site.origin) else {
            return RobotsRules::allow_all();
        };

        match fetch_url(&self.client, &url).await {
            FetchResult::Success { body, .. } => RobotsRules::from_content(&body, &url),
            other => {
                debug!(url = %url, result = ?other, "No usable robots.txt");
                RobotsRules::allow_all()
            }
        }
    }

    async fn try_sitemaps(&self, site: &Site, robots: &RobotsRules) -> StrategyOutcome {
        sitemaps::discover(&self.client, site, robots, self.config.max_sitemaps).await
    }
}

#[async_trait]
impl SiteCrawler for HttpSiteCrawler {
    async fn crawl(&self, domain: &str) -> CrawlResult<CrawlReport> {
        let site = Site::new(domain, &self.scheme)?;
        let robots = self.fetch_robots(&site).await;

        let (candidates, discovery_method, sitemap_url) = match self.try_sitemaps(&site, &robots).await {
            StrategyOutcome::Found {
                candidates,
                sitemap_url,
            } => {
                info!(domain = %site.domain, sitemap = %sitemap_url, pages = candidates.len(), "Sitemap discovery succeeded");
                (candidates, DiscoveryMethod::Sitemap, Some(sitemap_url.to_string()))
            }
            StrategyOutcome::Empty { malformed } => {
                info!(domain = %site.domain, "No usable sitemap, falling back to link discovery");
                let mut candidates = CandidateSet::new();
                let crawled = link_crawl::discover(
                    &self.client,
                    &site,
                    &robots,
                    &self.agent_token,
                    &self.config,
                    &mut candidates,
                )
                .await;

                match (crawled, malformed) {
                    (Ok(()), _) => (candidates, DiscoveryMethod::LinkCrawl, None),
                    (Err(e), Some((url, message))) => {
                        debug!(error = %e, "Link discovery failed after a malformed sitemap");
                        return Err(CrawlError::Parse {
                            url: url.to_string(),
                            message,
                        });
                    }
                    (Err(e), None) => return Err(e),
                }
            }
        };

        let (candidates, mut subdomains) = candidates.into_parts();
        subdomains.truncate(self.config.max_subdomains);

        Ok(CrawlReport {
            domain: site.domain,
            candidates,
            subdomains,
            discovery_method,
            sitemap_url,
        })
    }
}
