//! Robots.txt handling module
//!
//! This module parses robots.txt files. The crawler uses them twice: as a
//! source of sitemap locations and to skip disallowed paths during link
//! discovery.

mod parser;

pub use parser::RobotsRules;

use url::Url;

/// Returns the robots.txt URL for the origin of `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}
