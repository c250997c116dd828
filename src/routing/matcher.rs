//! Route matching logic.
//!
//! # Responsibilities
//! - Match a request path against a prefix (case-sensitive)
//! - Describe a route rule and where it came from
//!
//! # Design Decisions
//! - Plain string prefix, no segment boundary: `/users` matches `/users42`
//! - No regex to guarantee O(n) matching

use serde::Serialize;

use crate::config::RouteConfig;

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Specificity used for precedence: longer prefixes win.
    pub fn len(&self) -> usize {
        self.prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }
}

/// Where a rule was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOrigin {
    /// From the configuration file or built-in defaults.
    Static,
    /// Attached to a runtime service registration.
    Registered,
}

/// Maps a path prefix to a service name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRule {
    pub path_prefix: PathPrefixMatcher,
    pub service: String,
    pub origin: RuleOrigin,
}

impl RouteRule {
    pub fn new(prefix: impl Into<String>, service: impl Into<String>, origin: RuleOrigin) -> Self {
        Self {
            path_prefix: PathPrefixMatcher::new(prefix),
            service: service.into(),
            origin,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.path_prefix.matches(path)
    }
}

impl From<&RouteConfig> for RouteRule {
    fn from(config: &RouteConfig) -> Self {
        RouteRule::new(config.path_prefix.clone(), config.service.clone(), RuleOrigin::Static)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api");

        assert!(matcher.matches("/api/v1"));
        assert!(matcher.matches("/api"));
        assert!(!matcher.matches("/images"));
        assert!(!matcher.matches("/API/v1")); // Case sensitive
    }

    #[test]
    fn rule_from_config_is_static() {
        let rule = RouteRule::from(&RouteConfig::new("/orders", "order-service"));
        assert_eq!(rule.origin, RuleOrigin::Static);
        assert!(rule.matches("/orders/7"));
    }
}
