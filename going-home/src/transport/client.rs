//! Journey API HTTP client.

use serde_json::Value;
use tracing::info;

use crate::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

use super::ConnectionSource;
use super::error::TransportError;

/// How much of an undecodable body to keep for error messages.
const BODY_SNIPPET_CHARS: usize = 500;

/// Configuration for the journey API client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL for the API (defaults to transport.opendata.ch)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TransportConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Journey API client.
#[derive(Debug, Clone)]
pub struct TransportClient {
    http: reqwest::Client,
    base_url: String,
}

impl TransportClient {
    /// Create a new client with the given configuration.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the connections endpoint.
    pub fn connections_url(&self) -> String {
        format!("{}/connections", self.base_url)
    }
}

impl ConnectionSource for TransportClient {
    async fn connections(&self, from: &str, to: &str) -> Result<Value, TransportError> {
        let url = self.connections_url();
        info!(%url, from, to, "fetching connections");

        let response = self
            .http
            .get(&url)
            .query(&[("from", from), ("to", to)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        decode_body(&body)
    }
}

/// Parse a response body, which must be a JSON object.
pub(super) fn decode_body(body: &str) -> Result<Value, TransportError> {
    let snippet = || Some(body.chars().take(BODY_SNIPPET_CHARS).collect());

    let value: Value = serde_json::from_str(body).map_err(|e| TransportError::Decode {
        message: e.to_string(),
        body: snippet(),
    })?;

    if !value.is_object() {
        return Err(TransportError::Decode {
            message: "expected a JSON object".to_string(),
            body: snippet(),
        });
    }

    Ok(value)
}
