use crate::url::matcher::matches_wildcard;
use crate::UrlError;
use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitemap_analyzer::url::extract_domain;
///
/// let url = Url::parse("https://Careers.Acme.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("careers.acme.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Reduces a directory-supplied website value to a bare domain
///
/// Company records hold websites in many shapes (`acme.com`,
/// `https://www.Acme.com/`, `http://acme.com/home`). All of them reduce to
/// `acme.com`.
pub fn canonical_domain(input: &str) -> Result<String, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::MissingDomain);
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;
    let host = extract_domain(&url).ok_or(UrlError::MissingDomain)?;
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if !host.contains('.') {
        return Err(UrlError::Malformed(format!(
            "'{}' does not look like a public domain",
            input
        )));
    }

    Ok(host.to_string())
}

/// Returns true if `host` is the domain itself, its `www.` variant, or any subdomain
pub fn in_site_family(domain: &str, host: &str) -> bool {
    matches_wildcard(&format!("*.{}", domain), host)
}

/// Returns true if `host` serves the main site (the domain or its `www.` variant)
pub fn is_primary_host(domain: &str, host: &str) -> bool {
    host == domain || host.strip_prefix("www.") == Some(domain)
}

/// Returns the host if it is a subdomain other than `www.`
pub fn subdomain_of(domain: &str, host: &str) -> Option<String> {
    if in_site_family(domain, host) && !is_primary_host(domain, host) {
        Some(host.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_canonical_domain_shapes() {
        assert_eq!(canonical_domain("acme.com").unwrap(), "acme.com");
        assert_eq!(canonical_domain("https://www.Acme.com/").unwrap(), "acme.com");
        assert_eq!(canonical_domain("http://acme.com/home").unwrap(), "acme.com");
        assert_eq!(canonical_domain("  shop.acme.com  ").unwrap(), "shop.acme.com");
    }

    #[test]
    fn test_canonical_domain_rejects_garbage() {
        assert!(canonical_domain("").is_err());
        assert!(canonical_domain("localhost").is_err());
    }

    #[test]
    fn test_site_family() {
        assert!(in_site_family("acme.com", "acme.com"));
        assert!(in_site_family("acme.com", "www.acme.com"));
        assert!(in_site_family("acme.com", "careers.acme.com"));
        assert!(!in_site_family("acme.com", "notacme.com"));
        assert!(!in_site_family("acme.com", "acme.com.evil.net"));
    }

    #[test]
    fn test_subdomain_of() {
        assert_eq!(subdomain_of("acme.com", "acme.com"), None);
        assert_eq!(subdomain_of("acme.com", "www.acme.com"), None);
        assert_eq!(
            subdomain_of("acme.com", "shop.acme.com"),
            Some("shop.acme.com".to_string())
        );
        assert_eq!(subdomain_of("acme.com", "other.org"), None);
    }
}
