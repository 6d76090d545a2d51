//! URL handling module for Sitemap-Analyzer
//!
//! This module provides URL normalization (the deduplication key for
//! discovered pages), host extraction, and site-family matching used to
//! tell a company's own pages and subdomains apart from external links.

mod domain;
mod matcher;
mod normalize;

pub use domain::{canonical_domain, extract_domain, in_site_family, is_primary_host, subdomain_of};
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;

/// Number of non-empty path segments in a URL (`/` is 0, `/a/b` is 2)
pub fn path_depth(url: &::url::Url) -> usize {
    url.path().split('/').filter(|s| !s.is_empty()).count()
}

/// Returns true for URLs that point at sitemap documents rather than pages
pub fn is_sitemap_document(url: &::url::Url) -> bool {
    let path = url.path().to_lowercase();
    path.ends_with(".xml") || path.ends_with(".xml.gz") || path.contains("sitemap")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::url::Url;

    #[test]
    fn test_path_depth() {
        assert_eq!(path_depth(&Url::parse("https://acme.com/").unwrap()), 0);
        assert_eq!(path_depth(&Url::parse("https://acme.com/about").unwrap()), 1);
        assert_eq!(
            path_depth(&Url::parse("https://acme.com/careers/openings").unwrap()),
            2
        );
    }

    #[test]
    fn test_is_sitemap_document() {
        assert!(is_sitemap_document(
            &Url::parse("https://acme.com/sitemap-pages.xml").unwrap()
        ));
        assert!(is_sitemap_document(
            &Url::parse("https://acme.com/post-sitemap2.xml").unwrap()
        ));
        assert!(!is_sitemap_document(
            &Url::parse("https://acme.com/careers").unwrap()
        ));
    }
}
