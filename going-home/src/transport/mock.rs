//! Mock journey API client for running without network access.
//!
//! Serves a single canned response (usually loaded from a JSON file) for
//! every query, and counts how often it was asked.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tracing::debug;

use super::ConnectionSource;
use super::client::decode_body;
use super::error::TransportError;

/// Mock client that answers every query with the same response.
#[derive(Debug, Clone)]
pub struct MockTransportClient {
    /// The canned response, or `None` to simulate an unavailable API.
    response: Option<Arc<Value>>,
    requests: Arc<AtomicUsize>,
}

impl MockTransportClient {
    /// Serve `response` for every query.
    pub fn new(response: Value) -> Self {
        Self {
            response: Some(Arc::new(response)),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Load the canned response from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path).map_err(|e| {
            TransportError::MockData(format!("failed to read {}: {e}", path.display()))
        })?;
        let response = decode_body(&body)?;
        Ok(Self::new(response))
    }

    /// A client whose every query fails with a 503.
    pub fn unavailable() -> Self {
        Self {
            response: None,
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of queries answered so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl ConnectionSource for MockTransportClient {
    async fn connections(&self, from: &str, to: &str) -> Result<Value, TransportError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        debug!(from, to, "serving mock connections");

        match &self.response {
            Some(response) => Ok(response.as_ref().clone()),
            None => Err(TransportError::Api {
                status: 503,
                message: "mock API unavailable".to_string(),
            }),
        }
    }
}
