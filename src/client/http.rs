//! REST calls against the watchdog backend.

use super::error::ApiError;
use crate::config::ServerConfig;
use crate::dashboard::types::HistoryEntry;
use crate::i18n::{validate_language_code, Translations};
use std::collections::HashMap;
use std::time::Duration;

/// Thin wrapper around `reqwest` for the one-shot endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
}

impl ApiClient {
    /// Create a client with a per-request timeout taken from the config.
    pub fn new(config: &ServerConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| ApiError::Setup(e.to_string()))?;
        Ok(Self::with_client(config, client))
    }

    /// Create a client with a custom HTTP client (for testing).
    pub fn with_client(config: &ServerConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: config.trimmed_base_url().to_string(),
            timeout_seconds: config.request_timeout_seconds,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /api/check-now`. The resulting state arrives over the socket.
    pub async fn check_now(&self) -> Result<(), ApiError> {
        let url = format!("{}/api/check-now", self.base_url);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        if !response.status().is_success() {
            return Err(ApiError::HttpError(response.status().as_u16()));
        }
        tracing::debug!(status = %response.status(), "Check-now accepted");
        Ok(())
    }

    /// `GET /api/history`, oldest entry first.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let url = format!("{}/api/history", self.base_url);
        let body = self.get_text(&url).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::ParseError(e.to_string()))
    }

    /// `GET /locales/{lang}.json`. Non-string values in the map are skipped.
    pub async fn locale(&self, language: &str) -> Result<Translations, ApiError> {
        validate_language_code(language).map_err(|e| ApiError::ParseError(e.to_string()))?;

        let url = format!("{}/locales/{}.json", self.base_url, language);
        let body = self.get_text(&url).await?;
        let raw: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| ApiError::ParseError(e.to_string()))?;

        let entries: HashMap<String, String> = raw
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(s) => Some((key, s)),
                _ => None,
            })
            .collect();
        Ok(Translations::new(language, entries))
    }

    async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        if !response.status().is_success() {
            return Err(ApiError::HttpError(response.status().as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| ApiError::ParseError(e.to_string()))
    }

    /// Classify reqwest error into ApiError.
    fn classify_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout_seconds)
        } else {
            ApiError::ConnectionFailed(e.to_string())
        }
    }
}
