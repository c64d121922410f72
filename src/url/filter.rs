//! URL Filter: scheme gate, domain allow-list, and block-pattern matching.
//!
//! Scheme and allow-list checks are cheap string comparisons; block patterns
//! are compiled regexes so operators can express anything from a single path
//! prefix to a full URL shape. Patterns can be swapped at runtime (the engine
//! reloads them when the config file changes) without rebuilding the filter.

use crate::ConfigError;
use regex::Regex;
use std::sync::RwLock;
use url::Url;

use super::matches_wildcard;

/// Gatekeeper applied to every discovered link before it reaches the frontier.
pub struct UrlFilter {
    allowed_domains: Vec<String>,
    blocked_patterns: RwLock<Vec<Regex>>,
}

impl UrlFilter {
    pub fn new(allowed_domains: Vec<String>, blocked_patterns: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            allowed_domains,
            blocked_patterns: RwLock::new(compile_patterns(blocked_patterns)?),
        })
    }

    /// Swaps in a freshly compiled set of block patterns.
    pub fn reload_patterns(&self, patterns: &[String]) -> Result<(), ConfigError> {
        let compiled = compile_patterns(patterns)?;
        *self.blocked_patterns.write().expect("blocked_patterns poisoned") = compiled;
        Ok(())
    }

    /// Runs the full gate: scheme, allow-list, then block patterns.
    pub fn is_allowed(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        if !self.allowed_domains.is_empty() {
            let Some(host) = url.host_str() else {
                return false;
            };
            let host = host.to_lowercase();
            if !self.allowed_domains.iter().any(|d| matches_wildcard(d, &host)) {
                return false;
            }
        }

        let url_str = url.as_str();
        let patterns = self.blocked_patterns.read().expect("blocked_patterns poisoned");
        !patterns.iter().any(|re| re.is_match(url_str))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| ConfigError::InvalidPattern(format!("{p}: {e}"))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn rejects_non_http_schemes() {
        let filter = UrlFilter::new(vec![], &[]).unwrap();
        assert!(!filter.is_allowed(&url("ftp://example.com/file")));
        assert!(filter.is_allowed(&url("https://example.com/")));
    }

    #[test]
    fn enforces_allow_list() {
        let filter = UrlFilter::new(vec!["*.example.com".to_string()], &[]).unwrap();
        assert!(filter.is_allowed(&url("https://blog.example.com/")));
        assert!(!filter.is_allowed(&url("https://other.com/")));
    }

    #[test]
    fn empty_allow_list_permits_any_domain() {
        let filter = UrlFilter::new(vec![], &[]).unwrap();
        assert!(filter.is_allowed(&url("https://anything.test/")));
    }

    #[test]
    fn blocks_matching_patterns() {
        let filter = UrlFilter::new(vec![], &[r"/admin/".to_string()]).unwrap();
        assert!(!filter.is_allowed(&url("https://example.com/admin/panel")));
        assert!(filter.is_allowed(&url("https://example.com/public/page")));
    }

    #[test]
    fn reload_swaps_patterns_live() {
        let filter = UrlFilter::new(vec![], &[r"/old/".to_string()]).unwrap();
        assert!(!filter.is_allowed(&url("https://example.com/old/page")));
        filter.reload_patterns(&[r"/new/".to_string()]).unwrap();
        assert!(filter.is_allowed(&url("https://example.com/old/page")));
        assert!(!filter.is_allowed(&url("https://example.com/new/page")));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let result = UrlFilter::new(vec![], &["(unclosed".to_string()]);
        assert!(result.is_err());
    }
}
