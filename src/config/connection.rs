//! WebSocket connection configuration

use serde::{Deserialize, Serialize};

/// Reconnect behaviour when an edit is sent while the socket is down.
///
/// # Example
///
/// ```toml
/// [connection]
/// max_reconnect_attempts = 1
/// reconnect_delay_ms = 0
/// connect_timeout_seconds = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Reconnect attempts made for one pending edit before giving up.
    ///
    /// Default: 1
    pub max_reconnect_attempts: u32,

    /// Pause between failed reconnect attempts.
    ///
    /// Default: 0 ms
    pub reconnect_delay_ms: u64,

    /// Upper bound for a single WebSocket handshake.
    ///
    /// Default: 10 seconds
    pub connect_timeout_seconds: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 1,
            reconnect_delay_ms: 0,
            connect_timeout_seconds: 10,
        }
    }
}
