//! Error types for backend communication.

use thiserror::Error;

/// Errors from the REST endpoints.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Request timeout
    #[error("request timeout after {0}s")]
    Timeout(u64),

    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Non-success HTTP status
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Body could not be decoded
    #[error("invalid response: {0}")]
    ParseError(String),

    /// HTTP client could not be constructed
    #[error("client setup failed: {0}")]
    Setup(String),
}

/// Errors from the WebSocket connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("WebSocket connect failed: {0}")]
    Connect(String),

    #[error("WebSocket connect timed out after {0}s")]
    Timeout(u64),

    #[error("failed to encode edit: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("connection closed before the backend sent its state")]
    ClosedBeforeState,

    #[error("no state push within {0}s")]
    StateTimeout(u64),

    #[error("reconnect failed after {attempts} attempt(s): {last_error}")]
    ReconnectExhausted { attempts: u32, last_error: String },
}
