use crate::scoring::Candidate;
use std::collections::HashMap;
use url::Url;

/// Upper bound on candidates collected for one site before ranking
pub const MAX_CANDIDATES: usize = 5_000;

/// Discovered pages and subdomains, deduplicated and kept in discovery order
#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
    index: HashMap<String, usize>,
    subdomains: Vec<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a candidate keyed by its (already normalized) URL
    ///
    /// A repeat sighting only fills in fields the first one lacked.
    /// Returns true if the URL was new.
    pub fn add(&mut self, candidate: Candidate) -> bool {
        if let Some(&idx) = self.index.get(candidate.url.as_str()) {
            let existing = &mut self.candidates[idx];
            if existing.title.is_none() {
                existing.title = candidate.title;
            }
            if existing.link_text.is_none() {
                existing.link_text = candidate.link_text;
            }
            if existing.last_modified.is_none() {
                existing.last_modified = candidate.last_modified;
            }
            if existing.priority.is_none() {
                existing.priority = candidate.priority;
            }
            if existing.change_frequency.is_none() {
                existing.change_frequency = candidate.change_frequency;
            }
            return false;
        }

        if self.candidates.len() >= MAX_CANDIDATES {
            return false;
        }

        self.index
            .insert(candidate.url.as_str().to_string(), self.candidates.len());
        self.candidates.push(candidate);
        true
    }

    /// Records the `<title>` of a fetched page
    pub fn set_title(&mut self, url: &Url, title: String) {
        if let Some(&idx) = self.index.get(url.as_str()) {
            self.candidates[idx].title = Some(title);
        }
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.index.contains_key(url.as_str())
    }

    pub fn add_subdomain(&mut self, host: String) {
        if !self.subdomains.contains(&host) {
            self.subdomains.push(host);
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Candidate>, Vec<String>) {
        (self.candidates, self.subdomains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PageSource;

    fn candidate(url: &str) -> Candidate {
        Candidate::new(Url::parse(url).unwrap(), PageSource::Sitemap)
    }

    #[test]
    fn test_dedup_keeps_first_and_fills_gaps() {
        let mut set = CandidateSet::new();
        assert!(set.add(candidate("https://acme.com/about")));

        let mut again = candidate("https://acme.com/about");
        again.link_text = Some("About us".to_string());
        assert!(!set.add(again));

        let (candidates, _) = set.into_parts();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].link_text.as_deref(), Some("About us"));
        assert_eq!(candidates[0].source, PageSource::Sitemap);
    }

    #[test]
    fn test_set_title() {
        let mut set = CandidateSet::new();
        let url = Url::parse("https://acme.com/team").unwrap();
        set.add(candidate(url.as_str()));
        set.set_title(&url, "Our Team".to_string());
        let (candidates, _) = set.into_parts();
        assert_eq!(candidates[0].title.as_deref(), Some("Our Team"));
    }

    #[test]
    fn test_subdomains_unique_in_order() {
        let mut set = CandidateSet::new();
        set.add_subdomain("shop.acme.com".to_string());
        set.add_subdomain("blog.acme.com".to_string());
        set.add_subdomain("shop.acme.com".to_string());
        let (_, subdomains) = set.into_parts();
        assert_eq!(subdomains, vec!["shop.acme.com", "blog.acme.com"]);
    }
}
