//! Wire types shared with the watchdog backend

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A status that is either known to be on, known to be off, or not known.
///
/// The backend sends booleans, but older pushes and hand-edited states carry
/// `"true"`/`"false"` strings or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriState {
    True,
    False,
    #[default]
    Unknown,
}

impl TriState {
    /// Interpret an arbitrary JSON value.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(true) => TriState::True,
            serde_json::Value::Bool(false) => TriState::False,
            serde_json::Value::String(s) if s == "true" => TriState::True,
            serde_json::Value::String(s) if s == "false" => TriState::False,
            _ => TriState::Unknown,
        }
    }

    /// Value plotted in the history chart; unknown counts as off.
    pub fn series_value(self) -> u8 {
        match self {
            TriState::True => 1,
            TriState::False | TriState::Unknown => 0,
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value {
            TriState::True
        } else {
            TriState::False
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        value.map(TriState::from).unwrap_or(TriState::Unknown)
    }
}

impl Serialize for TriState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TriState::True => serializer.serialize_bool(true),
            TriState::False => serializer.serialize_bool(false),
            TriState::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for TriState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(TriState::from_json(&value))
    }
}

/// Parse an ISO datetime as sent by the backend.
///
/// RFC 3339 values keep their offset; naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
    }
}

/// Full state pushed by the backend over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerState {
    pub youtube_is_live: TriState,
    pub obs_is_streaming: TriState,
    /// Base polling interval in seconds
    pub check_interval: u64,
    pub live_mode: bool,
    /// Seconds before live mode switches itself off
    pub live_mode_timeout: u64,
    pub obs_enabled: bool,
    pub youtube_enabled: bool,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_check_timestamp: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub live_mode_end_timestamp: Option<DateTime<Utc>>,
}

impl Default for ServerState {
    fn default() -> Self {
        Self {
            youtube_is_live: TriState::Unknown,
            obs_is_streaming: TriState::Unknown,
            check_interval: 900,
            live_mode: false,
            live_mode_timeout: 3600,
            obs_enabled: true,
            youtube_enabled: true,
            last_check_timestamp: None,
            live_mode_end_timestamp: None,
        }
    }
}

impl ServerState {
    /// Parse a pushed frame and enforce the OBS/YouTube dependency.
    pub fn from_frame(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<ServerState>(frame).map(ServerState::normalized)
    }

    /// OBS control is meaningless while YouTube checks are off.
    pub fn normalized(mut self) -> Self {
        if !self.youtube_enabled {
            self.obs_enabled = false;
        }
        self
    }
}

/// One row of the backend's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub last_check_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub youtube_is_live: TriState,
    #[serde(default, alias = "obs_is_streaming")]
    pub obs_streaming: TriState,
}

/// Sparse patch of the user-editable fields.
///
/// Only the fields that are set are serialized; the backend merges them
/// into its state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_mode_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obs_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_enabled: Option<bool>,
}

impl ClientEdit {
    pub fn check_interval(seconds: u64) -> Self {
        Self {
            check_interval: Some(seconds),
            ..Default::default()
        }
    }

    pub fn live_mode(enabled: bool) -> Self {
        Self {
            live_mode: Some(enabled),
            ..Default::default()
        }
    }

    pub fn live_mode_timeout(seconds: u64) -> Self {
        Self {
            live_mode_timeout: Some(seconds),
            ..Default::default()
        }
    }

    pub fn obs_enabled(enabled: bool) -> Self {
        Self {
            obs_enabled: Some(enabled),
            ..Default::default()
        }
    }

    pub fn youtube_enabled(enabled: bool) -> Self {
        Self {
            youtube_enabled: Some(enabled),
            ..Default::default()
        }
    }

    /// Names of the fields this patch carries.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.check_interval.is_some() {
            fields.push("check_interval");
        }
        if self.live_mode.is_some() {
            fields.push("live_mode");
        }
        if self.live_mode_timeout.is_some() {
            fields.push("live_mode_timeout");
        }
        if self.obs_enabled.is_some() {
            fields.push("obs_enabled");
        }
        if self.youtube_enabled.is_some() {
            fields.push("youtube_enabled");
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Serialize to the text frame sent over the socket.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
