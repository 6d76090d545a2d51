/// Checks if a host matches a domain pattern
///
/// 1. Exact match: "acme.com" matches only "acme.com"
/// 2. Wildcard match: "*.acme.com" matches "acme.com" itself and any
///    subdomain, however deeply nested
///
/// Both arguments are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use sitemap_analyzer::url::matches_wildcard;
///
/// assert!(matches_wildcard("acme.com", "acme.com"));
/// assert!(matches_wildcard("*.acme.com", "jobs.acme.com"));
/// assert!(!matches_wildcard("*.acme.com", "acme.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base
            || candidate
                .strip_suffix(base)
                .is_some_and(|prefix| prefix.ends_with('.'))
    } else {
        candidate == pattern
    }
}
