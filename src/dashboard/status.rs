//! Tri-state status rendering

use super::types::TriState;
use crate::i18n::Translations;
use serde::Serialize;

/// Visual class of a status badge. Exactly one applies to any input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Online,
    Offline,
    Unknown,
}

impl StatusClass {
    pub fn from_tristate(value: TriState) -> Self {
        match value {
            TriState::True => StatusClass::Online,
            TriState::False => StatusClass::Offline,
            TriState::Unknown => StatusClass::Unknown,
        }
    }

    /// Translation key for the badge text
    pub fn translation_key(self) -> &'static str {
        match self {
            StatusClass::Online => "status_online",
            StatusClass::Offline => "status_offline",
            StatusClass::Unknown => "status_unknown",
        }
    }

    /// Text shown when the key is not translated
    pub fn fallback_text(self) -> &'static str {
        match self {
            StatusClass::Online => "Online",
            StatusClass::Offline => "Offline",
            StatusClass::Unknown => "Unknown",
        }
    }
}

/// Rendered badge. Keeps the raw value so it can be re-rendered after a
/// language change without a new push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub raw: TriState,
    pub class: StatusClass,
    pub text: String,
}

impl Default for StatusView {
    fn default() -> Self {
        render_status(TriState::Unknown, &Translations::default())
    }
}

/// Map a tri-state value to its badge.
pub fn render_status(value: TriState, translations: &Translations) -> StatusView {
    let class = StatusClass::from_tristate(value);
    StatusView {
        raw: value,
        class,
        text: translations.text_or(class.translation_key(), class.fallback_text()),
    }
}

impl StatusView {
    /// Re-render from the stored raw value with another translation table.
    pub fn retranslate(&self, translations: &Translations) -> StatusView {
        render_status(self.raw, translations)
    }
}
