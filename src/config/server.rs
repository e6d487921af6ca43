//! Backend server configuration

use serde::{Deserialize, Serialize};

/// Where the watchdog backend lives and how long REST calls may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base HTTP URL of the backend, e.g. `http://localhost:8000`
    pub base_url: String,
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

impl ServerConfig {
    /// Base URL without a trailing slash.
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// WebSocket endpoint derived from the base URL (`http` → `ws`, `https` → `wss`).
    pub fn websocket_url(&self) -> String {
        let base = self.trimmed_base_url();
        if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}/ws", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}/ws", rest)
        } else {
            format!("{}/ws", base)
        }
    }
}
