//! Logging configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Modules that accept a per-component level under `[logging.component_levels]`.
pub const LOG_COMPONENTS: &[&str] = &["cli", "client", "config", "dashboard", "i18n", "logging"];

/// Where log lines go is fixed (stderr); this picks their shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration.
///
/// The dashboard frame owns stdout, so the default level stays at `warn`
/// and only problems reach the terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Per-module levels, e.g. `{"client": "debug"}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_levels: Option<HashMap<String, String>>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            component_levels: None,
        }
    }
}

impl LoggingConfig {
    /// Configured component names that match no module, sorted.
    pub fn unknown_components(&self) -> Vec<&str> {
        let mut unknown: Vec<&str> = self
            .component_levels
            .iter()
            .flat_map(|levels| levels.keys())
            .map(String::as_str)
            .filter(|name| !LOG_COMPONENTS.contains(name))
            .collect();
        unknown.sort_unstable();
        unknown
    }
}
