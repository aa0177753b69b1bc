//! Route matching logic.
//!
//! # Responsibilities
//! - Match host (exact match, case-insensitive, port ignored)
//! - Match path prefix (case-sensitive)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Path matching is case-sensitive
//! - Empty condition = always matches (wildcard)
//! - No regex to guarantee O(n) matching

use crate::routing::RouteCriteria;

/// Trait for matching routing criteria against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the criteria match this condition.
    fn matches(&self, criteria: &RouteCriteria) -> bool;
}

/// Strip an optional `:port` suffix and lowercase the host.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if host.starts_with('[') {
        // IPv6 literal: keep everything up to the closing bracket
        host.split_once(']')
            .map(|(addr, _)| &host[..=addr.len()])
            .unwrap_or(host)
    } else {
        host.rsplit_once(':')
            .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
            .map(|(name, _)| name)
            .unwrap_or(host)
    };
    without_port.to_ascii_lowercase()
}

/// Matches the request host.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// Create a new host matcher.
    /// The host is normalized for case- and port-insensitive matching.
    pub fn new(host: impl AsRef<str>) -> Self {
        Self {
            expected_host: normalize_host(host.as_ref()),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, criteria: &RouteCriteria) -> bool {
        normalize_host(&criteria.host) == self.expected_host
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, criteria: &RouteCriteria) -> bool {
        criteria.url.starts_with(&self.prefix)
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, criteria: &RouteCriteria) -> bool {
        self.matchers.iter().all(|m| m.matches(criteria))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(host: &str, url: &str) -> RouteCriteria {
        RouteCriteria {
            host: host.into(),
            url: url.into(),
            method: "GET".into(),
            remote: "127.0.0.1".into(),
        }
    }

    #[test]
    fn test_host_matcher() {
        let matcher = HostMatcher::new("example.com");

        assert!(matcher.matches(&criteria("example.com", "/")));
        assert!(matcher.matches(&criteria("EXAMPLE.COM", "/"))); // Case insensitive
        assert!(matcher.matches(&criteria("example.com:8080", "/")));
        assert!(!matcher.matches(&criteria("other.com", "/")));
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api");

        assert!(matcher.matches(&criteria("example.com", "/api/v1")));
        assert!(!matcher.matches(&criteria("example.com", "/images")));
    }

    #[test]
    fn test_and_matcher() {
        let matcher = AndMatcher::new(vec![
            Box::new(HostMatcher::new("example.com")),
            Box::new(PathPrefixMatcher::new("/api")),
        ]);

        assert!(matcher.matches(&criteria("example.com", "/api")));
        assert!(!matcher.matches(&criteria("example.com", "/")));
        assert!(!matcher.matches(&criteria("other.com", "/api")));
        assert!(AndMatcher::new(Vec::new()).matches(&criteria("any", "/")));
    }

    #[test]
    fn normalizes_hosts() {
        assert_eq!(normalize_host("App.Example.com:443"), "app.example.com");
        assert_eq!(normalize_host("[::1]:8080"), "[::1]");
        assert_eq!(normalize_host("localhost"), "localhost");
    }
}
