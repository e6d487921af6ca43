//! streamdash - terminal dashboard for the stream watchdog
//!
//! This library provides the client side of the watchdog's UI-sync contract:
//! a WebSocket state stream, sparse configuration patches, REST one-shots
//! (manual check, history, locales) and the session that renders them.

pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod i18n;
pub mod logging;
