//! Page model: everything a surface needs to draw one frame

use super::countdown::{format_age, format_seconds};
use super::editor::Controls;
use super::status::{render_status, StatusView};
use super::types::ServerState;
use crate::client::ConnectionState;
use crate::i18n::Translations;
use std::collections::BTreeMap;

/// Static labels tagged for translation, with their built-in text.
pub const TRANSLATABLE_LABELS: &[(&str, &str)] = &[
    ("title", "Stream Watchdog"),
    ("youtube_status_label", "YouTube"),
    ("obs_status_label", "OBS"),
    ("check_interval_label", "Check interval (s)"),
    ("live_mode_label", "Live mode"),
    ("live_mode_timeout_label", "Live mode timeout (s)"),
    ("youtube_enabled_label", "YouTube checks"),
    ("obs_enabled_label", "OBS control"),
    ("last_check_label", "Last check"),
    ("live_mode_end_label", "Live mode ends"),
    ("next_check_label", "Next check in"),
    ("history_label", "History"),
    ("saving_label", "Saving..."),
];

#[derive(Debug, Clone)]
pub struct Page {
    pub labels: BTreeMap<&'static str, String>,
    pub youtube_status: StatusView,
    pub obs_status: StatusView,
    pub controls: Controls,
    pub effective_interval: String,
    pub last_check: String,
    pub next_check: String,
    /// `None` while hidden
    pub live_mode_countdown: Option<String>,
    pub saving: bool,
    pub connection: ConnectionState,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            labels: TRANSLATABLE_LABELS
                .iter()
                .map(|(key, text)| (*key, text.to_string()))
                .collect(),
            youtube_status: StatusView::default(),
            obs_status: StatusView::default(),
            controls: Controls::default(),
            effective_interval: String::new(),
            last_check: "-".to_string(),
            next_check: "--:--".to_string(),
            live_mode_countdown: None,
            saving: false,
            connection: ConnectionState::Connecting,
        }
    }
}

impl Page {
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.labels.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Replace tagged labels that the table translates; others keep their text.
    pub fn translate_labels(&mut self, translations: &Translations) {
        for (key, _) in TRANSLATABLE_LABELS {
            if let Some(text) = translations.get(key) {
                self.labels.insert(key, text.to_string());
            }
        }
    }

    /// Re-render the computed status badges from their raw values.
    pub fn retranslate_statuses(&mut self, translations: &Translations) {
        self.youtube_status = self.youtube_status.retranslate(translations);
        self.obs_status = self.obs_status.retranslate(translations);
    }

    /// Fill status badges and controls from a push.
    pub fn apply_state(&mut self, state: &ServerState, translations: &Translations) {
        self.youtube_status = render_status(state.youtube_is_live, translations);
        self.obs_status = render_status(state.obs_is_streaming, translations);
        self.controls = Controls::from(state);
    }

    pub fn set_effective_interval(&mut self, seconds: u64, translations: &Translations) {
        self.effective_interval = translations.format(
            "effective_interval",
            "Effective: {seconds} seconds",
            "seconds",
            &seconds.to_string(),
        );
    }

    pub fn set_next_check(&mut self, elapsed: u64, remaining: u64, translations: &Translations) {
        self.last_check = translations.format("time_ago", "{time} ago", "time", &format_age(elapsed));
        self.next_check = format_seconds(remaining);
    }

    pub fn set_live_mode_countdown(&mut self, remaining: Option<u64>, translations: &Translations) {
        self.live_mode_countdown = remaining.map(|secs| {
            translations.format(
                "live_mode_countdown",
                "Auto-disable in: {time}",
                "time",
                &format_seconds(secs),
            )
        });
    }
}
