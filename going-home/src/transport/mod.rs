//! Client for the public-transport journey API (transport.opendata.ch).
//!
//! The API is queried with `GET <base>/connections?from=..&to=..` and
//! answers with a JSON object whose optional `connections` array lists
//! journeys in departure order. Responses are kept as raw JSON so they can
//! be cached and echoed verbatim; [`types`] provides the typed view used to
//! pick the next connection.

use serde_json::Value;

mod client;
mod error;
mod mock;
pub mod types;

pub use client::{TransportClient, TransportConfig};
pub use error::TransportError;
pub use mock::MockTransportClient;
pub use types::{Checkpoint, Connection, Section};

/// Anything that can answer a connection query with a raw API response.
pub trait ConnectionSource {
    /// Look up connections from `from` to `to`.
    fn connections(
        &self,
        from: &str,
        to: &str,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}
