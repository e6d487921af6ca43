//! Set command handler
//!
//! Connects, takes the current state as the baseline, sends one sparse patch
//! per requested change and optionally waits for the push that confirms them.

use crate::cli::SetArgs;
use crate::client::{
    next_state, ConnectionError, ConnectionManager, Connector, RetryPolicy, WsConnector,
};
use crate::config::DashConfig;
use crate::dashboard::{ConfigEditor, Control, EditError, ServerState};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum SetError {
    #[error("Nothing to change. Pass at least one setting (see --help)")]
    NothingRequested,

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Backend did not confirm the change within {0}s")]
    NotConfirmed(u64),
}

/// Requested changes in the order they are applied.
///
/// YouTube goes before OBS so that re-enabling both in one call unlocks the
/// OBS toggle first.
pub fn requested_controls(args: &SetArgs) -> Vec<Control> {
    let mut controls = Vec::new();
    if let Some(seconds) = args.check_interval {
        controls.push(Control::CheckInterval(seconds));
    }
    if let Some(enabled) = args.live_mode {
        controls.push(Control::LiveMode(enabled));
    }
    if let Some(seconds) = args.live_mode_timeout {
        controls.push(Control::LiveModeTimeout(seconds));
    }
    if let Some(enabled) = args.youtube_enabled {
        controls.push(Control::YoutubeEnabled(enabled));
    }
    if let Some(enabled) = args.obs_enabled {
        controls.push(Control::ObsEnabled(enabled));
    }
    controls
}

/// Whether a pushed state reflects every requested change.
pub fn confirms(state: &ServerState, controls: &[Control]) -> bool {
    controls.iter().all(|control| match *control {
        Control::CheckInterval(seconds) => state.check_interval == seconds,
        Control::LiveMode(enabled) => state.live_mode == enabled,
        Control::LiveModeTimeout(seconds) => state.live_mode_timeout == seconds,
        Control::ObsEnabled(enabled) => state.obs_enabled == enabled,
        Control::YoutubeEnabled(enabled) => {
            state.youtube_enabled == enabled && (enabled || !state.obs_enabled)
        }
    })
}

/// Apply `controls` over a fresh connection.
///
/// Returns the confirming state, or the baseline when `confirm_within` is `None`.
pub async fn apply_controls<C: Connector>(
    connector: C,
    config: &DashConfig,
    controls: &[Control],
    confirm_within: Option<Duration>,
) -> Result<ServerState, SetError> {
    if controls.is_empty() {
        return Err(SetError::NothingRequested);
    }

    let (events, mut rx) = mpsc::unbounded_channel();
    let mut manager =
        ConnectionManager::new(connector, RetryPolicy::from(&config.connection), events);
    manager.open().await?;

    let wait = Duration::from_secs(config.connection.connect_timeout_seconds);
    let result = async {
        let baseline = next_state(&mut rx, wait).await?;
        let mut editor = ConfigEditor::new();
        editor.sync(&baseline);

        let mut edits = Vec::new();
        for control in controls {
            edits.extend(editor.change(*control)?);
        }
        for edit in &edits {
            let outcome = manager.send(edit).await?;
            tracing::debug!(?outcome, fields = ?edit.fields(), "Patch sent");
        }

        let Some(limit) = confirm_within else {
            return Ok(baseline);
        };
        let deadline = Instant::now() + limit;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let state = match next_state(&mut rx, remaining).await {
                Ok(state) => state,
                Err(ConnectionError::StateTimeout(_)) => {
                    return Err(SetError::NotConfirmed(limit.as_secs()))
                }
                Err(e) => return Err(e.into()),
            };
            if confirms(&state, controls) {
                return Ok(state);
            }
            tracing::debug!("Push does not reflect the change yet");
        }
    }
    .await;

    manager.shutdown();
    result
}

/// Handle `streamdash set` command
pub async fn handle_set(
    args: &SetArgs,
    config: &DashConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let controls = requested_controls(args);
    let connector = WsConnector::from_config(&config.server, &config.connection);
    let confirm_within = (!args.no_wait).then(|| Duration::from_secs(args.wait));

    let state = apply_controls(connector, config, &controls, confirm_within).await?;

    if args.no_wait {
        return Ok(format!("✓ Sent {} change(s)", controls.len()));
    }
    Ok(format!(
        "✓ Saved: check every {}s, live mode {}, timeout {}s, YouTube {}, OBS {}",
        state.check_interval,
        if state.live_mode { "on" } else { "off" },
        state.live_mode_timeout,
        if state.youtube_enabled { "on" } else { "off" },
        if state.obs_enabled { "on" } else { "off" },
    ))
}
