//! Application configuration loaded from environment variables.

use std::time::Duration;

use serde::Deserialize;

use crate::endpoint::Endpoints;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Backends ===
    /// Raw Node service address: full URL, domain, or platform service name.
    #[serde(default)]
    pub node_api_url: Option<String>,

    /// Raw Go service address: full URL, domain, or platform service name.
    #[serde(default)]
    pub go_api_url: Option<String>,

    /// Per-request timeout. Unset means requests may wait indefinitely.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    // === Server Configuration ===
    /// HTTP server port for the state API.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Expose Prometheus metrics on `/metrics`.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_api_url: None,
            go_api_url: None,
            request_timeout_ms: None,
            port: default_port(),
            rust_log: default_log_level(),
            metrics_enabled: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Load from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        if self.request_timeout_ms == Some(0) {
            return Err("REQUEST_TIMEOUT_MS must be positive when set".to_string());
        }

        Ok(())
    }

    /// Resolve both backend endpoints.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::resolve(self.node_api_url.as_deref(), self.go_api_url.as_deref())
    }

    /// Request timeout, if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
