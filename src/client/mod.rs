//! Communication with the watchdog backend.
//!
//! - [`ApiClient`] covers the one-shot REST endpoints (check-now, history, locales)
//! - [`ConnectionManager`] keeps the single WebSocket used for state sync
//! - [`WsConnector`] is the production transport behind the [`Connector`] seam

pub mod connection;
pub mod error;
pub mod http;
pub mod ws;

pub use connection::{
    ConnectionEvent, ConnectionManager, ConnectionState, ConnectionStats, Connector, Link,
    next_state, RetryPolicy, SendOutcome,
};
pub use error::{ApiError, ConnectionError};
pub use http::ApiClient;
pub use ws::WsConnector;
