//! Localization: translation tables and the persisted language choice
//!
//! Translations are flat key→string maps served by the backend at
//! `/locales/{lang}.json`. Lookups treat an empty string the same as a
//! missing key so a partially translated locale falls back to English text.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing the persisted language.
#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid state file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid language code: '{0}'")]
    InvalidCode(String),
}

/// Translation table for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translations {
    language: String,
    entries: HashMap<String, String>,
}

impl Translations {
    /// Table with no entries; every lookup falls back.
    pub fn empty(language: &str) -> Self {
        Self {
            language: language.to_string(),
            entries: HashMap::new(),
        }
    }

    pub fn new(language: &str, entries: HashMap<String, String>) -> Self {
        Self {
            language: language.to_string(),
            entries,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Translated text for `key`, if present and non-empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Translated text for `key`, or `fallback`.
    pub fn text_or(&self, key: &str, fallback: &str) -> String {
        self.get(key).unwrap_or(fallback).to_string()
    }

    /// Translated template for `key` (or `fallback`) with `{placeholder}` replaced.
    pub fn format(&self, key: &str, fallback: &str, placeholder: &str, value: &str) -> String {
        self.get(key)
            .unwrap_or(fallback)
            .replace(&format!("{{{}}}", placeholder), value)
    }
}

/// A language code is used in a URL path, so keep it to `[A-Za-z0-9_-]`.
pub fn validate_language_code(code: &str) -> Result<(), LocaleError> {
    let valid = !code.is_empty()
        && code.len() <= 16
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(LocaleError::InvalidCode(code.to_string()))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

/// Remembers the last selected language between runs.
#[derive(Debug, Clone)]
pub struct LanguageStore {
    path: PathBuf,
}

impl LanguageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored language, if any. Unreadable state is logged and ignored.
    pub fn load(&self) -> Option<String> {
        if !self.path.exists() {
            return None;
        }
        let result = std::fs::read_to_string(&self.path)
            .map_err(LocaleError::from)
            .and_then(|content| {
                serde_json::from_str::<PersistedState>(&content).map_err(LocaleError::from)
            });
        match result {
            Ok(state) => state.language.filter(|l| validate_language_code(l).is_ok()),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable language state");
                None
            }
        }
    }

    /// Stored language, or `default` when nothing usable is stored.
    pub fn resolve(&self, default: &str) -> String {
        self.load().unwrap_or_else(|| default.to_string())
    }

    pub fn save(&self, language: &str) -> Result<(), LocaleError> {
        validate_language_code(language)?;
        let state = PersistedState {
            language: Some(language.to_string()),
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&state)?)?;
        tracing::debug!(path = %self.path.display(), language, "Persisted language");
        Ok(())
    }
}
