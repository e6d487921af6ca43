//! Status command handler

use crate::cli::lang::load_translations;
use crate::cli::output::{format_state_json, format_state_table};
use crate::cli::StatusArgs;
use crate::client::{
    next_state, ApiClient, ConnectionError, ConnectionManager, Connector, RetryPolicy,
    WsConnector,
};
use crate::config::DashConfig;
use crate::dashboard::ServerState;
use std::time::Duration;
use tokio::sync::mpsc;

/// Connect, take the first state push and disconnect.
pub async fn fetch_state<C: Connector>(
    connector: C,
    config: &DashConfig,
    wait: Duration,
) -> Result<ServerState, ConnectionError> {
    let (events, mut rx) = mpsc::unbounded_channel();
    let mut manager =
        ConnectionManager::new(connector, RetryPolicy::from(&config.connection), events);
    manager.open().await?;
    let result = next_state(&mut rx, wait).await;
    manager.shutdown();
    result
}

/// Handle `streamdash status` command
pub async fn handle_status(
    args: &StatusArgs,
    config: &DashConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let connector = WsConnector::from_config(&config.server, &config.connection);
    let state = fetch_state(connector, config, Duration::from_secs(args.wait)).await?;

    if args.json {
        return Ok(format_state_json(&state)?);
    }

    let api = ApiClient::new(&config.server)?;
    let translations = load_translations(&api, config).await;
    Ok(format_state_table(&state, &translations))
}
