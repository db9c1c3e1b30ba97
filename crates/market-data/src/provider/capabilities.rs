//! Pacing and request configuration for quote sources.
//!
//! This module defines how aggressively a source may be called and the
//! shared HTTP settings every adapter is built from.

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default minimum delay between paced requests.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);

/// Browser-like user agent. Several public endpoints reject default client agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Rate limiting configuration for a source.
///
/// Per-symbol sources are paced: requests go out one at a time with at
/// least `min_delay` between them. Batch sources send one request per
/// chunk of up to `max_batch_size` identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Minimum delay between consecutive requests.
    pub min_delay: Duration,

    /// Maximum identifiers per request. 1 means no batching.
    pub max_batch_size: usize,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            min_delay: DEFAULT_MIN_DELAY,
            max_batch_size: 1,
        }
    }
}

/// HTTP settings shared by all adapters.
#[derive(Clone, Debug)]
pub struct SourceOptions {
    /// Overrides the provider's public endpoint (mirrors, tests).
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub min_delay: Duration,
    pub user_agent: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            min_delay: DEFAULT_MIN_DELAY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl SourceOptions {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the base URL, dropping any trailing slash.
    pub(crate) fn resolve_base_url(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SourceOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.min_delay, Duration::from_secs(1));
        assert!(options.base_url.is_none());

        let limit = RateLimit::default();
        assert_eq!(limit.max_batch_size, 1);
    }

    #[test]
    fn test_resolve_base_url() {
        let options = SourceOptions::default();
        assert_eq!(
            options.resolve_base_url("https://example.com/api"),
            "https://example.com/api"
        );

        let options = SourceOptions::default().with_base_url("http://127.0.0.1:9000/");
        assert_eq!(
            options.resolve_base_url("https://example.com/api"),
            "http://127.0.0.1:9000"
        );
    }
}
