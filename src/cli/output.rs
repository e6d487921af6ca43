//! Output formatting helpers for CLI commands

use crate::client::ConnectionState;
use crate::dashboard::{
    render_status, HistoryChart, HistoryEntry, Page, ServerState, StatusClass, StatusView,
    TriState,
};
use crate::i18n::Translations;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// Colored badge text for a status view
pub fn status_badge(view: &StatusView) -> String {
    match view.class {
        StatusClass::Online => view.text.green().bold().to_string(),
        StatusClass::Offline => view.text.red().to_string(),
        StatusClass::Unknown => view.text.dimmed().to_string(),
    }
}

/// Get status icon for a tri-state value
pub fn status_icon(value: TriState) -> &'static str {
    match value {
        TriState::True => "●",
        TriState::False => "○",
        TriState::Unknown => "?",
    }
}

fn switch(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn connection_text(state: ConnectionState) -> String {
    match state {
        ConnectionState::Connecting => "connecting".yellow().to_string(),
        ConnectionState::Open => "connected".green().to_string(),
        ConnectionState::ClosedPendingRetry { attempts } => {
            format!("reconnecting ({})", attempts).yellow().to_string()
        }
        ConnectionState::Closed => "disconnected".red().to_string(),
    }
}

/// Format a state push as a table, with row labels in the loaded language
pub fn format_state_table(state: &ServerState, translations: &Translations) -> String {
    let youtube = render_status(state.youtube_is_live, translations);
    let obs = render_status(state.obs_is_streaming, translations);
    let mut labels = Page::default();
    labels.translate_labels(translations);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Setting", "Value"]);

    let row = |key: &str, value: String| vec![Cell::new(labels.label(key)), Cell::new(value)];

    table.add_row(row(
        "youtube_status_label",
        format!(
            "{} {}",
            status_icon(state.youtube_is_live),
            status_badge(&youtube)
        ),
    ));
    table.add_row(row(
        "obs_status_label",
        format!(
            "{} {}",
            status_icon(state.obs_is_streaming),
            status_badge(&obs)
        ),
    ));
    table.add_row(row("check_interval_label", state.check_interval.to_string()));
    table.add_row(row("live_mode_label", switch(state.live_mode).to_string()));
    table.add_row(row(
        "live_mode_timeout_label",
        state.live_mode_timeout.to_string(),
    ));
    table.add_row(row(
        "youtube_enabled_label",
        switch(state.youtube_enabled).to_string(),
    ));
    table.add_row(row("obs_enabled_label", switch(state.obs_enabled).to_string()));
    table.add_row(row(
        "last_check_label",
        state
            .last_check_timestamp
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "-".to_string()),
    ));
    if let Some(end) = state.live_mode_end_timestamp {
        table.add_row(row("live_mode_end_label", end.to_rfc3339()));
    }

    table.to_string()
}

/// Format a state push as JSON
pub fn format_state_json(state: &ServerState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "state": state }))
}

/// Format history entries as JSON
pub fn format_history_json(entries: &[HistoryEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "history": entries }))
}

/// Render one full dashboard frame.
pub fn format_dashboard(page: &Page, chart: Option<&HistoryChart>, width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}  [{}]\n\n",
        page.label("title").bold(),
        connection_text(page.connection)
    ));

    out.push_str(&format!(
        "  {:<24} {}\n",
        page.label("youtube_status_label"),
        status_badge(&page.youtube_status)
    ));
    out.push_str(&format!(
        "  {:<24} {}\n\n",
        page.label("obs_status_label"),
        status_badge(&page.obs_status)
    ));

    let controls = &page.controls;
    out.push_str(&format!(
        "  {:<24} {}  ({})\n",
        page.label("check_interval_label"),
        controls.check_interval,
        page.effective_interval
    ));
    out.push_str(&format!(
        "  {:<24} {}\n",
        page.label("live_mode_label"),
        switch(controls.live_mode)
    ));
    if let Some(countdown) = &page.live_mode_countdown {
        out.push_str(&format!("  {:<24} {}\n", "", countdown.cyan()));
    }
    out.push_str(&format!(
        "  {:<24} {}\n",
        page.label("live_mode_timeout_label"),
        controls.live_mode_timeout
    ));
    out.push_str(&format!(
        "  {:<24} {}\n",
        page.label("youtube_enabled_label"),
        switch(controls.youtube_enabled)
    ));
    let obs = if controls.obs_locked {
        format!("{} (locked)", switch(controls.obs_enabled)).dimmed().to_string()
    } else {
        switch(controls.obs_enabled).to_string()
    };
    out.push_str(&format!("  {:<24} {}\n\n", page.label("obs_enabled_label"), obs));

    out.push_str(&format!(
        "  {:<24} {}\n",
        page.label("last_check_label"),
        page.last_check
    ));
    out.push_str(&format!(
        "  {:<24} {}\n",
        page.label("next_check_label"),
        page.next_check
    ));
    if page.saving {
        out.push_str(&format!("\n  {}\n", page.label("saving_label").yellow()));
    }

    out.push_str(&format!("\n{}\n", page.label("history_label").bold()));
    match chart {
        Some(chart) => out.push_str(&chart.render(width)),
        None => out.push_str("  ...\n"),
    }
    out
}
