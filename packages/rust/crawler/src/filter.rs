//! Decides which discovered links may enter the frontier.

use url::Url;

use contextpacker_shared::CrawlConfig;

use crate::frontier::Frontier;
use crate::normalize::network_location;

/// True when `stay_on_subdomain` is off, or the link's `host[:port]` equals
/// `start_domain` exactly. `blog.x.test` does not match `x.test`.
pub fn domain_allowed(url: &str, start_domain: &str, stay_on_subdomain: bool) -> bool {
    if !stay_on_subdomain {
        return true;
    }
    network_location(url).is_some_and(|netloc| netloc == start_domain)
}

/// Whether any pattern matches `url`.
///
/// Patterns starting with `http://` or `https://` are URL prefixes; anything
/// else is a substring of the URL's path.
pub fn path_matches_any(url: &str, patterns: &[String]) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_default();

    patterns.iter().any(|pattern| {
        if pattern.starts_with("http://") || pattern.starts_with("https://") {
            url.starts_with(pattern.as_str())
        } else {
            path.contains(pattern.as_str())
        }
    })
}

/// Link admission rules for one crawl.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    start_domain: String,
    stay_on_subdomain: bool,
    crawl_depth: u32,
    include_paths: Vec<String>,
    exclude_paths: Vec<String>,
}

impl LinkFilter {
    pub fn new(config: &CrawlConfig) -> Self {
        Self {
            start_domain: network_location(&config.start_url).unwrap_or_default(),
            stay_on_subdomain: config.stay_on_subdomain,
            crawl_depth: config.crawl_depth,
            include_paths: config.include_paths.clone(),
            exclude_paths: config.exclude_paths.clone(),
        }
    }

    /// Domain and path rules only. Exclude patterns win over include patterns.
    pub fn allows(&self, url: &str) -> bool {
        if !domain_allowed(url, &self.start_domain, self.stay_on_subdomain) {
            return false;
        }
        if !self.exclude_paths.is_empty() && path_matches_any(url, &self.exclude_paths) {
            return false;
        }
        self.include_paths.is_empty() || path_matches_any(url, &self.include_paths)
    }

    /// Whether a link found on a page at `parent_depth` should be queued.
    pub fn should_enqueue(&self, url: &str, parent_depth: u32, frontier: &Frontier) -> bool {
        parent_depth < self.crawl_depth && !frontier.is_visited(url) && self.allows(url)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(include: &[&str], exclude: &[&str]) -> CrawlConfig {
        CrawlConfig {
            start_url: "https://x.test/docs/".into(),
            output_dir: "/tmp/out".into(),
            max_pages: 10,
            min_pause: Duration::ZERO,
            max_pause: Duration::ZERO,
            crawl_depth: 2,
            stay_on_subdomain: true,
            ignore_queries: true,
            user_agent: "test-agent".into(),
            include_paths: include.iter().map(|s| s.to_string()).collect(),
            exclude_paths: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn domain_is_literal_host_equality() {
        assert!(domain_allowed("https://x.test/a", "x.test", true));
        assert!(!domain_allowed("https://blog.x.test/a", "x.test", true));
        assert!(!domain_allowed("https://x.test:8443/a", "x.test", true));
        assert!(domain_allowed("https://other.test/a", "x.test", false));
    }

    #[test]
    fn absolute_patterns_match_as_prefix() {
        let patterns = vec!["https://x.test/api/".to_string()];
        assert!(path_matches_any("https://x.test/api/v1", &patterns));
        assert!(!path_matches_any("https://x.test/docs/api/v1", &patterns));
    }

    #[test]
    fn relative_patterns_match_path_substring() {
        let patterns = vec!["/blog".to_string()];
        assert!(path_matches_any("https://x.test/en/blog/post", &patterns));
        // the query is not part of the path
        assert!(!path_matches_any("https://x.test/a?from=/blog", &patterns));
    }

    #[test]
    fn empty_include_allows_everything_on_domain() {
        let filter = LinkFilter::new(&config(&[], &[]));
        assert!(filter.allows("https://x.test/anything"));
        assert!(!filter.allows("https://elsewhere.test/anything"));
    }

    #[test]
    fn include_requires_a_match() {
        let filter = LinkFilter::new(&config(&["/docs/"], &[]));
        assert!(filter.allows("https://x.test/docs/intro"));
        assert!(!filter.allows("https://x.test/pricing"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let filter = LinkFilter::new(&config(&["/docs/"], &["/docs/legacy"]));
        assert!(filter.allows("https://x.test/docs/intro"));
        assert!(!filter.allows("https://x.test/docs/legacy/v1"));
    }

    #[test]
    fn should_enqueue_rejects_visited_and_deep_links() {
        let filter = LinkFilter::new(&config(&[], &[]));
        let mut frontier = Frontier::seeded("https://x.test/docs/");

        assert!(!filter.should_enqueue("https://x.test/docs", 0, &frontier));
        assert!(filter.should_enqueue("https://x.test/docs/next", 1, &frontier));
        assert!(!filter.should_enqueue("https://x.test/docs/next", 2, &frontier));

        frontier.enqueue("https://x.test/docs/next", 2);
        assert!(!filter.should_enqueue("https://x.test/docs/next/", 0, &frontier));
    }
}
