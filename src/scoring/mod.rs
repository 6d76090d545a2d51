//! Relevance scoring for discovered pages
//!
//! Every candidate page gets a category and a numeric score. Scores decide
//! which pages survive truncation to the per-company page cap, so the one
//! hard rule lives here: a careers page always outranks every other page.

mod category;

pub use category::{categorize, is_careers, PageCategory, CAREERS_LEXICON};

use crate::storage::{Page, PageSource};
use crate::url::path_depth;
use chrono::{DateTime, Utc};
use url::Url;

/// Score given to every careers/jobs page
pub const CAREERS_SCORE: u32 = 1000;

/// Highest score a non-careers page can reach
pub const MAX_OTHER_SCORE: u32 = CAREERS_SCORE - 1;

/// A page found by the crawler, before scoring
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Normalized page URL
    pub url: Url,

    /// The page `<title>`, when the page was fetched
    pub title: Option<String>,

    /// Anchor text of a link pointing at the page
    pub link_text: Option<String>,

    /// How the page was found
    pub source: PageSource,

    /// `<lastmod>` from the sitemap, when present
    pub last_modified: Option<DateTime<Utc>>,

    /// `<priority>` from the sitemap, when present
    pub priority: Option<f32>,

    /// `<changefreq>` from the sitemap, when present
    pub change_frequency: Option<String>,
}

impl Candidate {
    pub fn new(url: Url, source: PageSource) -> Self {
        Self {
            url,
            title: None,
            link_text: None,
            source,
            last_modified: None,
            priority: None,
            change_frequency: None,
        }
    }

    /// Text the categorizer matches against besides the path
    pub fn label(&self) -> Option<String> {
        match (&self.title, &self.link_text) {
            (Some(title), Some(text)) => Some(format!("{} {}", title, text)),
            (Some(title), None) => Some(title.clone()),
            (None, Some(text)) => Some(text.clone()),
            (None, None) => None,
        }
    }
}

/// Weights for ranking non-careers pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWeights {
    /// Bonus for pages listed in a sitemap
    pub sitemap_bonus: u32,

    /// Bonus for the site root
    pub homepage_bonus: u32,

    /// Penalty per path segment beyond the first
    pub depth_penalty: u32,

    /// Ceiling on the total depth penalty
    pub max_depth_penalty: u32,

    /// Bonus for a sitemap `<priority>` of 1.0, scaled down linearly
    pub priority_bonus: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            sitemap_bonus: 25,
            homepage_bonus: 50,
            depth_penalty: 10,
            max_depth_penalty: 100,
            priority_bonus: 40,
        }
    }
}

/// Scores and ranks candidate pages
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    weights: ScoringWeights,
}

impl RelevanceScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Scores a single page
    ///
    /// Careers pages get [`CAREERS_SCORE`]; everything else is clamped to
    /// [`MAX_OTHER_SCORE`] so no heuristic can lift it past a careers page.
    pub fn score(&self, url: &Url, label: Option<&str>, source: PageSource) -> u32 {
        let category = categorize(url, label);
        if category == PageCategory::Careers {
            return CAREERS_SCORE;
        }

        let depth = path_depth(url) as u32;
        let mut score = category.base_score();

        if source == PageSource::Sitemap {
            score += self.weights.sitemap_bonus;
        }

        if depth == 0 {
            score += self.weights.homepage_bonus;
        }

        let penalty = depth
            .saturating_sub(1)
            .saturating_mul(self.weights.depth_penalty)
            .min(self.weights.max_depth_penalty);

        score.saturating_sub(penalty).min(MAX_OTHER_SCORE)
    }

    /// Scores a candidate, adding the sitemap priority to non-careers pages
    pub fn score_candidate(&self, candidate: &Candidate) -> u32 {
        let label = candidate.label();
        let score = self.score(&candidate.url, label.as_deref(), candidate.source);
        if score == CAREERS_SCORE {
            return score;
        }

        let bonus = candidate
            .priority
            .map(|p| (p.clamp(0.0, 1.0) * self.weights.priority_bonus as f32).round() as u32)
            .unwrap_or(0);
        score.saturating_add(bonus).min(MAX_OTHER_SCORE)
    }

    /// Scores every candidate, orders them best first and keeps at most `cap`
    ///
    /// The sort is stable: equal scores keep their discovery order.
    pub fn rank(&self, candidates: Vec<Candidate>, cap: usize) -> Vec<Page> {
        let mut pages: Vec<Page> = candidates
            .into_iter()
            .map(|candidate| self.to_page(candidate))
            .collect();

        pages.sort_by(|a, b| b.score.cmp(&a.score));
        pages.truncate(cap);
        pages
    }

    fn to_page(&self, candidate: Candidate) -> Page {
        let label = candidate.label();
        let category = categorize(&candidate.url, label.as_deref());
        let score = self.score_candidate(&candidate);
        let title = candidate
            .title
            .or(candidate.link_text)
            .unwrap_or_else(|| title_from_url(&candidate.url));

        Page {
            url: candidate.url.to_string(),
            title: Some(title),
            category,
            score,
            source: candidate.source,
            depth: path_depth(&candidate.url) as u32,
            last_modified: candidate.last_modified,
            priority: candidate.priority,
            change_frequency: candidate.change_frequency,
        }
    }
}

/// Builds a readable title from the last path segment
///
/// `/our-story.html` becomes "Our Story"; the site root becomes "Home".
pub fn title_from_url(url: &Url) -> String {
    let Some(last) = url.path().split('/').filter(|s| !s.is_empty()).last() else {
        return "Home".to_string();
    };

    let lower = last.to_lowercase();
    let stem = lower
        .strip_suffix(".html")
        .or_else(|| lower.strip_suffix(".htm"))
        .unwrap_or(&lower);

    let words: Vec<String> = stem
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        "Page".to_string()
    } else {
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn candidate(s: &str) -> Candidate {
        Candidate::new(url(s), PageSource::Sitemap)
    }

    #[test]
    fn test_careers_scores_maximum() {
        let scorer = RelevanceScorer::default();
        assert_eq!(
            scorer.score(&url("https://acme.com/careers"), None, PageSource::Link),
            CAREERS_SCORE
        );
        assert_eq!(
            scorer.score(&url("https://acme.com/JOBS/engineer"), None, PageSource::Link),
            CAREERS_SCORE
        );
    }

    #[test]
    fn test_careers_by_label_only() {
        let scorer = RelevanceScorer::default();
        let score = scorer.score(
            &url("https://acme.com/p/123"),
            Some("Join Us - Acme"),
            PageSource::Link,
        );
        // "join us" with a space is not in the lexicon, "join-us" is
        assert!(score < CAREERS_SCORE);

        let score = scorer.score(
            &url("https://acme.com/p/123"),
            Some("Recruiting at Acme"),
            PageSource::Link,
        );
        assert_eq!(score, CAREERS_SCORE);
    }

    #[test]
    fn test_non_careers_never_reaches_careers_tier() {
        let scorer = RelevanceScorer::new(ScoringWeights {
            sitemap_bonus: 5_000,
            homepage_bonus: 5_000,
            depth_penalty: 0,
            max_depth_penalty: 0,
            priority_bonus: 5_000,
        });
        let score = scorer.score(&url("https://acme.com/"), None, PageSource::Sitemap);
        assert_eq!(score, MAX_OTHER_SCORE);
    }

    #[test]
    fn test_sitemap_priority_breaks_ties() {
        let scorer = RelevanceScorer::default();
        let plain = candidate("https://acme.com/services/consulting");
        let mut favoured = candidate("https://acme.com/services/design");
        favoured.priority = Some(1.0);
        assert_eq!(scorer.score_candidate(&favoured), scorer.score_candidate(&plain) + 40);

        let pages = scorer.rank(vec![plain, favoured], 2);
        assert!(pages[0].url.ends_with("/design"));
        assert_eq!(pages[0].priority, Some(1.0));
    }

    #[test]
    fn test_sitemap_priority_leaves_careers_alone() {
        let scorer = RelevanceScorer::default();
        let mut careers = candidate("https://acme.com/careers");
        careers.priority = Some(1.0);
        assert_eq!(scorer.score_candidate(&careers), CAREERS_SCORE);

        let mut home = candidate("https://acme.com/");
        home.priority = Some(7.0);
        assert!(scorer.score_candidate(&home) < CAREERS_SCORE);
    }

    #[test]
    fn test_secondary_ordering() {
        let scorer = RelevanceScorer::default();
        let about = scorer.score(&url("https://acme.com/about"), None, PageSource::Sitemap);
        let team = scorer.score(&url("https://acme.com/team"), None, PageSource::Sitemap);
        let news = scorer.score(&url("https://acme.com/news"), None, PageSource::Sitemap);
        let other = scorer.score(&url("https://acme.com/misc"), None, PageSource::Sitemap);
        assert!(about > team);
        assert!(team > news);
        assert!(news > other);
    }

    #[test]
    fn test_sitemap_pages_outrank_crawled_duplicates() {
        let scorer = RelevanceScorer::default();
        let from_sitemap = scorer.score(&url("https://acme.com/about"), None, PageSource::Sitemap);
        let from_link = scorer.score(&url("https://acme.com/about"), None, PageSource::Link);
        assert!(from_sitemap > from_link);
    }

    #[test]
    fn test_deeper_pages_score_lower() {
        let scorer = RelevanceScorer::default();
        let shallow = scorer.score(&url("https://acme.com/products"), None, PageSource::Link);
        let deep = scorer.score(
            &url("https://acme.com/products/line/a/b"),
            None,
            PageSource::Link,
        );
        assert!(shallow > deep);
    }

    #[test]
    fn test_careers_page_survives_truncation() {
        let scorer = RelevanceScorer::default();
        let mut candidates: Vec<Candidate> = (0..29)
            .map(|i| candidate(&format!("https://acme.com/about/section-{}", i)))
            .collect();
        candidates.push(candidate("https://acme.com/careers"));

        let ranked = scorer.rank(candidates, 20);

        assert_eq!(ranked.len(), 20);
        assert_eq!(ranked[0].url, "https://acme.com/careers");
        assert_eq!(ranked[0].category, PageCategory::Careers);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let scorer = RelevanceScorer::default();
        let candidates = vec![
            candidate("https://acme.com/misc-a"),
            candidate("https://acme.com/misc-b"),
            candidate("https://acme.com/misc-c"),
        ];

        let ranked = scorer.rank(candidates, 10);
        let urls: Vec<&str> = ranked.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://acme.com/misc-a",
                "https://acme.com/misc-b",
                "https://acme.com/misc-c"
            ]
        );
    }

    #[test]
    fn test_rank_fills_title_from_url() {
        let scorer = RelevanceScorer::default();
        let ranked = scorer.rank(vec![candidate("https://acme.com/our-story.html")], 5);
        assert_eq!(ranked[0].title.as_deref(), Some("Our Story"));
    }

    #[test]
    fn test_link_text_marks_careers() {
        let scorer = RelevanceScorer::default();
        let mut c = Candidate::new(url("https://acme.com/p/123"), PageSource::Link);
        c.title = Some("Acme | Open Roles".to_string());
        c.link_text = Some("Careers".to_string());

        let ranked = scorer.rank(vec![c], 5);
        assert_eq!(ranked[0].category, PageCategory::Careers);
        assert_eq!(ranked[0].title.as_deref(), Some("Acme | Open Roles"));
    }

    #[test]
    fn test_title_from_url() {
        assert_eq!(title_from_url(&url("https://acme.com/")), "Home");
        assert_eq!(title_from_url(&url("https://acme.com/job_openings")), "Job Openings");
        assert_eq!(title_from_url(&url("https://acme.com/a/contact-us/")), "Contact Us");
    }
}
