//! Client configuration

use crate::cache::DEFAULT_CACHE_DURATION;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// API base for the beta deployment
pub const BETA_API_BASE: &str = "https://api.beta.kitepaint.com/php";

/// API base for the production deployment
pub const PRODUCTION_API_BASE: &str = "https://api.kitepaint.com/php";

/// API base serving the given front-end host.
///
/// Unknown hosts (including local development) talk to beta.
#[must_use]
pub fn api_base_for_host(host: &str) -> &'static str {
    match host {
        "kitepaint.com" => PRODUCTION_API_BASE,
        _ => BETA_API_BASE,
    }
}

/// Configuration for `KitePaintClient`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Freshness window for cached listings, in seconds
    pub cache_duration_secs: u64,
    /// Per-request timeout, in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BETA_API_BASE.to_string(),
            cache_duration_secs: DEFAULT_CACHE_DURATION.as_secs(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Create default config (beta backend)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Config for the backend serving `host`
    #[must_use]
    pub fn for_host(host: &str) -> Self {
        Self::default().with_base_url(api_base_for_host(host))
    }

    /// With base URL; a trailing slash is dropped
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    /// With cache freshness window
    #[must_use]
    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration_secs = duration.as_secs();
        self
    }

    /// With request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Cache freshness window
    #[inline]
    #[must_use]
    pub fn cache_duration(&self) -> Duration {
        Duration::from_secs(self.cache_duration_secs)
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL for an endpoint path such as `/designs.php`
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
