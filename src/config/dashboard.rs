//! Countdown and chart configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What happens when the next-check countdown runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Let the countdown wrap into the next period
    #[default]
    Wrap,
    /// Re-fetch history and reopen the socket for a fresh state push
    Resync,
}

impl FromStr for ExpiryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wrap" => Ok(ExpiryPolicy::Wrap),
            "resync" => Ok(ExpiryPolicy::Resync),
            _ => Err(format!("Invalid expiry policy: {}", s)),
        }
    }
}

/// Countdown timer configuration.
///
/// # Example
///
/// ```toml
/// [countdown]
/// live_mode_interval_seconds = 60
/// tick_millis = 1000
/// on_expiry = "wrap"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    /// Polling interval the backend uses while live mode is on.
    ///
    /// Default: 60 seconds
    pub live_mode_interval_seconds: u64,

    /// Period of the countdown timers.
    ///
    /// Default: 1000 ms
    pub tick_millis: u64,

    /// Behaviour when the next-check countdown reaches zero.
    ///
    /// Default: wrap
    pub on_expiry: ExpiryPolicy,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            live_mode_interval_seconds: 60,
            tick_millis: 1000,
            on_expiry: ExpiryPolicy::Wrap,
        }
    }
}

/// History chart configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Number of most recent entries drawn in the terminal
    pub width: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self { width: 60 }
    }
}
