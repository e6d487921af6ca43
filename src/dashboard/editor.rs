//! Configuration editor: turns control changes into sparse patches
//!
//! The saving indicator goes up with every patch and only comes down when the
//! backend confirms with its next push (or when sending is abandoned).

use super::types::{ClientEdit, ServerState};
use serde::Serialize;
use thiserror::Error;

/// Rejected control changes. Nothing is sent for these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("{field} must be a positive whole number of seconds, got '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("OBS control is locked while YouTube checks are disabled")]
    ObsLocked,
}

/// A user interaction with one editable control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    CheckInterval(u64),
    LiveMode(bool),
    LiveModeTimeout(u64),
    ObsEnabled(bool),
    YoutubeEnabled(bool),
}

/// Current values of the editable controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub check_interval: u64,
    pub live_mode: bool,
    pub live_mode_timeout: u64,
    pub obs_enabled: bool,
    pub youtube_enabled: bool,
    /// OBS toggle cannot be changed while YouTube is disabled
    pub obs_locked: bool,
}

impl From<&ServerState> for Controls {
    fn from(state: &ServerState) -> Self {
        Self {
            check_interval: state.check_interval,
            live_mode: state.live_mode,
            live_mode_timeout: state.live_mode_timeout,
            obs_enabled: state.obs_enabled,
            youtube_enabled: state.youtube_enabled,
            obs_locked: !state.youtube_enabled,
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::from(&ServerState::default())
    }
}

/// Parse a seconds value typed by the user.
pub fn parse_seconds(field: &'static str, raw: &str) -> Result<u64, EditError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(EditError::InvalidValue {
            field,
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug, Default)]
pub struct ConfigEditor {
    controls: Controls,
    saving: bool,
}

impl ConfigEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// A push arrived: controls follow the server and the indicator clears.
    pub fn sync(&mut self, state: &ServerState) {
        self.controls = Controls::from(state);
        self.saving = false;
    }

    /// Drop the indicator without a confirming push (send or check failed).
    pub fn clear_saving(&mut self) {
        self.saving = false;
    }

    /// Show the indicator for an action awaiting a push.
    pub fn mark_saving(&mut self) {
        self.saving = true;
    }

    /// Apply a control change and return the patches to send, in order.
    pub fn change(&mut self, control: Control) -> Result<Vec<ClientEdit>, EditError> {
        let edits = match control {
            Control::CheckInterval(seconds) => {
                validate_positive("check_interval", seconds)?;
                self.controls.check_interval = seconds;
                vec![ClientEdit::check_interval(seconds)]
            }
            Control::LiveMode(enabled) => {
                self.controls.live_mode = enabled;
                vec![ClientEdit::live_mode(enabled)]
            }
            Control::LiveModeTimeout(seconds) => {
                validate_positive("live_mode_timeout", seconds)?;
                self.controls.live_mode_timeout = seconds;
                vec![ClientEdit::live_mode_timeout(seconds)]
            }
            Control::ObsEnabled(enabled) => {
                if self.controls.obs_locked {
                    return Err(EditError::ObsLocked);
                }
                self.controls.obs_enabled = enabled;
                vec![ClientEdit::obs_enabled(enabled)]
            }
            Control::YoutubeEnabled(enabled) => {
                self.controls.youtube_enabled = enabled;
                self.controls.obs_locked = !enabled;
                let mut edits = vec![ClientEdit::youtube_enabled(enabled)];
                if !enabled {
                    self.controls.obs_enabled = false;
                    edits.push(ClientEdit::obs_enabled(false));
                }
                edits
            }
        };

        self.saving = true;
        Ok(edits)
    }
}

fn validate_positive(field: &'static str, seconds: u64) -> Result<(), EditError> {
    if seconds == 0 {
        return Err(EditError::InvalidValue {
            field,
            value: seconds.to_string(),
        });
    }
    Ok(())
}
