//! Localization configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Display language settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Language used when nothing has been persisted yet
    pub default_language: String,
    /// File that remembers the last selected language
    pub state_file: PathBuf,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            state_file: PathBuf::from("streamdash-state.json"),
        }
    }
}
