use crate::common::RateLimiterConfig;
use crate::paging::MaxRows;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
pub const DEFAULT_MAX_ROWS: usize = 50;

/// `[graph]` section of the application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Row cap for bounded listings; `-1` lifts it
    #[serde(default = "default_max_rows")]
    pub max_rows: MaxRows,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_GRAPH_BASE_URL.to_string()
}

fn default_scopes() -> Vec<String> {
    vec![DEFAULT_GRAPH_SCOPE.to_string()]
}

fn default_max_rows() -> MaxRows {
    MaxRows::AtMost(DEFAULT_MAX_ROWS)
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            scopes: default_scopes(),
            max_rows: default_max_rows(),
            requests_per_second: default_requests_per_second(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GraphConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rate_limiter(&self) -> RateLimiterConfig {
        RateLimiterConfig::new(self.requests_per_second)
    }
}
