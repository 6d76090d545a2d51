use serde::Serialize;
use url::Url;

/// Terms that mark a careers/jobs page, matched case-insensitively
/// against the URL path and the page label
pub const CAREERS_LEXICON: &[&str] = &[
    "career",
    "careers",
    "jobs",
    "job-openings",
    "recruiting",
    "join-us",
    "work-with-us",
];

const SERVICES_TERMS: &[&str] = &["service", "solution", "offering", "capabilit", "what-we-do"];
const PRODUCTS_TERMS: &[&str] = &["product", "shop", "catalog", "store", "brands"];
const ABOUT_TERMS: &[&str] = &["about", "company", "who-we-are", "overview", "our-story"];
const TEAM_TERMS: &[&str] = &["team", "leadership", "people", "staff", "management", "executives"];
const NEWS_TERMS: &[&str] = &["news", "blog", "insight", "article", "press", "media"];
const LOCATIONS_TERMS: &[&str] = &["location", "office", "facility", "branch"];
const CONTACT_TERMS: &[&str] = &["contact", "reach-us", "get-in-touch"];

/// Business-intelligence category of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCategory {
    Careers,
    Services,
    Products,
    About,
    Team,
    News,
    Locations,
    Contact,
    Other,
}

impl PageCategory {
    /// Convert to database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            PageCategory::Careers => "careers",
            PageCategory::Services => "services",
            PageCategory::Products => "products",
            PageCategory::About => "about",
            PageCategory::Team => "team",
            PageCategory::News => "news",
            PageCategory::Locations => "locations",
            PageCategory::Contact => "contact",
            PageCategory::Other => "other",
        }
    }

    /// Parse from database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "careers" => Some(PageCategory::Careers),
            "services" => Some(PageCategory::Services),
            "products" => Some(PageCategory::Products),
            "about" => Some(PageCategory::About),
            "team" => Some(PageCategory::Team),
            "news" => Some(PageCategory::News),
            "locations" => Some(PageCategory::Locations),
            "contact" => Some(PageCategory::Contact),
            "other" => Some(PageCategory::Other),
            _ => None,
        }
    }

    /// Starting score for non-careers pages of this category
    pub fn base_score(&self) -> u32 {
        match self {
            PageCategory::Careers => super::CAREERS_SCORE,
            PageCategory::Services | PageCategory::Products | PageCategory::About => 300,
            PageCategory::Team => 250,
            PageCategory::News => 150,
            PageCategory::Locations | PageCategory::Contact => 100,
            PageCategory::Other => 0,
        }
    }
}

impl std::fmt::Display for PageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Returns true if the path or label contains a careers term
pub fn is_careers(url: &Url, label: Option<&str>) -> bool {
    let path = url.path().to_lowercase();
    let label = label.map(str::to_lowercase);

    CAREERS_LEXICON.iter().any(|term| {
        path.contains(term) || label.as_deref().is_some_and(|l| l.contains(term))
    })
}

/// Assigns a category from the URL path and optional label
///
/// Careers wins over everything. Other categories are checked in tier
/// order and the first hit wins. Path terms must start a path segment so
/// `/rebranding` is not mistaken for `/brands`.
pub fn categorize(url: &Url, label: Option<&str>) -> PageCategory {
    if is_careers(url, label) {
        return PageCategory::Careers;
    }

    let path = url.path().to_lowercase();
    let label = label.map(str::to_lowercase);

    let tiers: [(PageCategory, &[&str]); 7] = [
        (PageCategory::Services, SERVICES_TERMS),
        (PageCategory::Products, PRODUCTS_TERMS),
        (PageCategory::About, ABOUT_TERMS),
        (PageCategory::Team, TEAM_TERMS),
        (PageCategory::News, NEWS_TERMS),
        (PageCategory::Locations, LOCATIONS_TERMS),
        (PageCategory::Contact, CONTACT_TERMS),
    ];

    for (category, terms) in tiers {
        let hit = terms.iter().any(|term| {
            path.contains(&format!("/{}", term))
                || label.as_deref().is_some_and(|l| l.contains(term))
        });
        if hit {
            return category;
        }
    }

    PageCategory::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_careers_terms() {
        for path in [
            "/career",
            "/careers/",
            "/jobs",
            "/about/job-openings",
            "/recruiting",
            "/join-us",
            "/work-with-us",
        ] {
            let u = url(&format!("https://acme.com{}", path));
            assert!(is_careers(&u, None), "{} should be careers", path);
        }
    }

    #[test]
    fn test_careers_case_insensitive() {
        assert!(is_careers(&url("https://acme.com/Careers"), None));
        assert!(is_careers(&url("https://acme.com/x"), Some("CAREERS at Acme")));
    }

    #[test]
    fn test_host_alone_is_not_careers() {
        assert!(!is_careers(&url("https://careers.acme.com/"), None));
    }

    #[test]
    fn test_categorize_tiers() {
        assert_eq!(categorize(&url("https://acme.com/services/audit"), None), PageCategory::Services);
        assert_eq!(categorize(&url("https://acme.com/products"), None), PageCategory::Products);
        assert_eq!(categorize(&url("https://acme.com/about-us"), None), PageCategory::About);
        assert_eq!(categorize(&url("https://acme.com/leadership"), None), PageCategory::Team);
        assert_eq!(categorize(&url("https://acme.com/blog/post"), None), PageCategory::News);
        assert_eq!(categorize(&url("https://acme.com/offices"), None), PageCategory::Locations);
        assert_eq!(categorize(&url("https://acme.com/contact"), None), PageCategory::Contact);
        assert_eq!(categorize(&url("https://acme.com/"), None), PageCategory::Other);
    }

    #[test]
    fn test_categorize_requires_segment_start() {
        assert_eq!(categorize(&url("https://acme.com/rebranding"), None), PageCategory::Other);
    }

    #[test]
    fn test_categorize_by_label() {
        assert_eq!(
            categorize(&url("https://acme.com/p/42"), Some("Contact our team")),
            PageCategory::Team
        );
    }

    #[test]
    fn test_db_string_round_trip() {
        let all = [
            PageCategory::Careers,
            PageCategory::Services,
            PageCategory::Products,
            PageCategory::About,
            PageCategory::Team,
            PageCategory::News,
            PageCategory::Locations,
            PageCategory::Contact,
            PageCategory::Other,
        ];
        for category in all {
            assert_eq!(PageCategory::from_db_string(category.to_db_string()), Some(category));
        }
        assert_eq!(PageCategory::from_db_string("bogus"), None);
    }
}
