//! Configuration module for streamdash
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`STREAMDASH_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use streamdash::config::DashConfig;
//!
//! let config = DashConfig::default();
//! assert_eq!(config.server.base_url, "http://localhost:8000");
//!
//! let toml = r#"
//! [server]
//! base_url = "http://nas.local:8000"
//! "#;
//! let config: DashConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.base_url, "http://nas.local:8000");
//! ```

pub mod connection;
pub mod dashboard;
pub mod error;
pub mod locale;
pub mod logging;
pub mod server;

pub use connection::ConnectionConfig;
pub use dashboard::{ChartConfig, CountdownConfig, ExpiryPolicy};
pub use error::ConfigError;
pub use locale::LocaleConfig;
pub use logging::{LogFormat, LoggingConfig, LOG_COMPONENTS};
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for a dashboard client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DashConfig {
    /// Backend location and REST timeouts
    pub server: ServerConfig,
    /// WebSocket reconnect policy
    pub connection: ConnectionConfig,
    /// Display language settings
    pub locale: LocaleConfig,
    /// Countdown timers
    pub countdown: CountdownConfig,
    /// History chart
    pub chart: ChartConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl DashConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports STREAMDASH_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("STREAMDASH_URL") {
            if !url.is_empty() {
                self.server.base_url = url;
            }
        }
        if let Ok(lang) = std::env::var("STREAMDASH_LANG") {
            if !lang.is_empty() {
                self.locale.default_language = lang;
            }
        }

        if let Ok(level) = std::env::var("STREAMDASH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("STREAMDASH_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        if let Ok(policy) = std::env::var("STREAMDASH_ON_EXPIRY") {
            if let Ok(p) = policy.parse() {
                self.countdown.on_expiry = p;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.server.trimmed_base_url();
        if url.is_empty() {
            return Err(ConfigError::invalid("server.base_url", "URL cannot be empty"));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::invalid(
                "server.base_url",
                format!("expected an http:// or https:// URL, got '{}'", url),
            ));
        }

        if self.countdown.tick_millis == 0 {
            return Err(ConfigError::invalid(
                "countdown.tick_millis",
                "tick must be non-zero",
            ));
        }
        if self.countdown.live_mode_interval_seconds == 0 {
            return Err(ConfigError::invalid(
                "countdown.live_mode_interval_seconds",
                "interval must be non-zero",
            ));
        }

        if self.chart.width == 0 {
            return Err(ConfigError::invalid("chart.width", "width must be non-zero"));
        }

        if self.locale.default_language.trim().is_empty() {
            return Err(ConfigError::invalid(
                "locale.default_language",
                "language code cannot be empty",
            ));
        }

        let unknown = self.logging.unknown_components();
        if !unknown.is_empty() {
            return Err(ConfigError::invalid(
                "logging.component_levels",
                format!(
                    "unknown component(s) {}, expected one of {}",
                    unknown.join(", "),
                    LOG_COMPONENTS.join(", ")
                ),
            ));
        }

        Ok(())
    }
}
