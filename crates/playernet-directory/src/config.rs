//! # Directory Configuration
//!
//! Per-process settings with sane defaults and JSON file persistence. A
//! missing config file is generated with defaults on first load, so a fresh
//! deployment starts without hand-written configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Complete per-process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Message bus connection settings.
    pub bus: BusConfig,
    /// Directory service endpoint settings.
    pub service: ServiceConfig,
    /// Seconds an awaited connect request may stay unanswered.
    pub request_timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            service: ServiceConfig::default(),
            request_timeout_secs: 10,
        }
    }
}

impl DirectoryConfig {
    /// The connect request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Load from a JSON file, writing a default file first if none exists.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            info!(path = %path.display(), "Wrote default configuration");
            return Ok(config);
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist to a JSON file, pretty-printed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write configuration file")]
    Io(#[from] std::io::Error),
    #[error("configuration file is not valid JSON")]
    Parse(#[from] serde_json::Error),
}

/// Message bus connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Bus host.
    pub host: String,
    /// Bus port.
    pub port: u16,
    /// Optional username.
    pub username: Option<String>,
    /// Optional password.
    pub password: Option<String>,
    /// Whether to connect over TLS.
    pub ssl: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            username: None,
            password: None,
            ssl: false,
        }
    }
}

/// Directory service endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service address.
    pub address: String,
    /// Service port.
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            port: 8080,
        }
    }
}
