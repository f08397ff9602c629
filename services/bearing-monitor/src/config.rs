//! Configuration types for the bearing monitor

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::StatusPalette;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub palette: StatusPalette,
}

impl Config {
    pub fn validate(&self) -> crate::Result<()> {
        self.endpoint.validate()?;
        self.palette.validate()
    }
}

/// Upstream status endpoint and polling schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_status_path")]
    pub status_path: String,
    #[serde(default = "default_polling_interval", with = "humantime_serde")]
    pub polling_interval: Duration,
    /// Unbounded when absent
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            status_path: default_status_path(),
            polling_interval: default_polling_interval(),
            request_timeout: None,
        }
    }
}

impl EndpointConfig {
    /// Full URL of the status endpoint
    pub fn status_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.status_path.trim_start_matches('/')
        )
    }

    fn validate(&self) -> crate::Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(crate::MonitorError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.polling_interval.is_zero() {
            return Err(crate::MonitorError::Config(
                "polling_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            history_size: default_history_size(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_status_path() -> String {
    "/api/bearing-temperature/status".to_string()
}

fn default_polling_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11116
}

fn default_history_size() -> usize {
    100
}

/// Load and validate configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::MonitorError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
