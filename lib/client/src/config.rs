//! Client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the API client and its transport.
///
/// Fields with defaults can be omitted when loading from configuration
/// sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST API (e.g. "http://localhost:8000/api/").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds.
    /// A timed-out call fails as a network error.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Whether concurrent `401`s share a single refresh call.
    /// When false every failing request refreshes on its own.
    #[serde(default)]
    pub coalesce_refresh: bool,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl ClientConfig {
    /// Creates a configuration for the given base URL with default settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Enables or disables refresh coalescing.
    #[must_use]
    pub fn with_coalesce_refresh(mut self, coalesce: bool) -> Self {
        self.coalesce_refresh = coalesce;
        self
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Joins an API path onto the base URL.
    ///
    /// Exactly one slash separates the two parts.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            coalesce_refresh: false,
        }
    }
}
