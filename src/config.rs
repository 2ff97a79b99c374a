//! Monitor configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! yields the standard capacities.

use std::path::Path;
use std::time::Duration;

use axum::http::HeaderName;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Entries kept in the request log
    pub request_log_capacity: usize,
    /// Entries kept in the error tracker
    pub error_capacity: usize,
    /// Latency samples kept per route
    pub route_window_capacity: usize,
    /// Distinct routes tracked before new ones fold into the overflow bucket
    pub max_routes: usize,
    /// Recent errors included in each snapshot
    pub snapshot_error_limit: usize,
    /// Header carrying the caller's actor id (attribution only)
    pub actor_header: String,
    /// Period of the SSE snapshot stream
    pub stream_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            request_log_capacity: 1_000,
            error_capacity: 100,
            route_window_capacity: 1_000,
            max_routes: 500,
            snapshot_error_limit: 10,
            actor_header: "x-actor-id".into(),
            stream_interval_ms: 1_000,
        }
    }
}

impl MonitorConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacities = [
            ("request_log_capacity", self.request_log_capacity),
            ("error_capacity", self.error_capacity),
            ("route_window_capacity", self.route_window_capacity),
            ("max_routes", self.max_routes),
        ];
        for (name, value) in capacities {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
            }
        }

        if self.stream_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "stream_interval_ms must be greater than 0".into(),
            ));
        }

        self.actor_header_name()?;
        Ok(())
    }

    pub fn actor_header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::try_from(self.actor_header.as_str()).map_err(|_| {
            ConfigError::Invalid(format!("actor_header {:?} is not a valid header name", self.actor_header))
        })
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.stream_interval_ms)
    }
}
