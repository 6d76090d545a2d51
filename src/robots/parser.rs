//! Robots.txt parser implementation
//!
//! Access rules are answered by the robotstxt crate's matcher. `Sitemap:`
//! directives are read separately because they sit outside any user-agent
//! group.

use robotstxt::DefaultMatcher;
use url::Url;

/// Parsed robots.txt data for one site
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    /// Raw robots.txt content (empty means allow all)
    content: String,
    /// Absolute sitemap URLs listed with `Sitemap:`
    sitemaps: Vec<Url>,
}

impl RobotsRules {
    /// Creates rules from raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    /// * `base` - The robots.txt URL, used to resolve relative sitemap entries
    pub fn from_content(content: &str, base: &Url) -> Self {
        let sitemaps = content
            .lines()
            .filter_map(|line| {
                let line = line.split('#').next().unwrap_or("").trim();
                let (key, value) = line.split_once(':')?;
                let value = value.trim();
                if !key.trim().eq_ignore_ascii_case("sitemap") || value.is_empty() {
                    return None;
                }
                base.join(value).ok()
            })
            .collect();

        Self {
            content: content.to_string(),
            sitemaps,
        }
    }

    /// Rules that allow everything, used when robots.txt is missing or unreadable
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Sitemap URLs declared in robots.txt, in file order
    pub fn sitemaps(&self) -> &[Url] {
        &self.sitemaps
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The full URL to check
    /// * `user_agent` - The product token of the crawler (e.g. "SitemapAnalyzer")
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}
