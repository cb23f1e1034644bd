//! The fetch/cache/derive pipeline.
//!
//! [`TransitFetcher::run`] is the single entry point used by every front
//! end: it loads the cached snapshot, refetches it from the journey API when
//! it is stale, and derives the next connection that can still be caught.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Timelike};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheSnapshot, ConnectionCache};
use crate::config::{LocationRole, Locations, Settings};
use crate::render::{render_arduino_header, render_delay_line, render_header, render_time_line};
use crate::transport::{Connection, ConnectionSource, TransportError};

/// Error reported when the payload carries no connection list.
pub const NO_CONNECTIONS: &str = "No connections found";

/// Hour of day from which the commute runs from work to home.
const AFTERNOON_HOUR: u32 = 12;

/// Origin and destination for a query, chosen by time of day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Direction {
    pub start: String,
    pub target: String,
    /// Role of the origin; shown to the user as "Start from <role>".
    pub start_role: LocationRole,
}

/// What the front ends render.
///
/// Either `error` is set and nothing else, or `error` is `None` and the
/// remaining fields describe the next usable connection (all empty apart
/// from `full_payload` when no connection can still be caught).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DerivedResult {
    pub header: Option<String>,
    #[serde(rename = "arduino")]
    pub arduino_header: Option<String>,
    #[serde(rename = "delay")]
    pub delay_summary: Option<String>,
    #[serde(rename = "details")]
    pub detail_lines: Vec<String>,
    pub error: Option<String>,
    #[serde(rename = "all")]
    pub full_payload: Option<Value>,
}

impl DerivedResult {
    /// An error-only result.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Seconds since the Unix epoch, with millisecond precision.
pub fn epoch_secs(now: &DateTime<FixedOffset>) -> f64 {
    now.timestamp_millis() as f64 / 1000.0
}

/// Decides when to query the journey API and what to make of the answer.
pub struct TransitFetcher<S> {
    source: S,
    cache: ConnectionCache,
    locations: Locations,
    refresh_interval: Duration,
}

impl<S: ConnectionSource> TransitFetcher<S> {
    pub fn new(source: S, settings: &Settings) -> Self {
        Self {
            source,
            cache: ConnectionCache::new(&settings.cache_path),
            locations: settings.locations.clone(),
            refresh_interval: settings.refresh_interval,
        }
    }

    /// Mornings go from home to work, afternoons and evenings back home.
    pub fn choose_direction(&self, now: &DateTime<FixedOffset>) -> Direction {
        let start_role = if now.hour() < AFTERNOON_HOUR {
            LocationRole::Home
        } else {
            LocationRole::Work
        };

        Direction {
            start: self.locations.get(start_role).to_string(),
            target: self.locations.get(start_role.opposite()).to_string(),
            start_role,
        }
    }

    /// Query the journey API once for `direction`.
    pub async fn fetch(&self, direction: &Direction) -> Result<Value, TransportError> {
        self.source
            .connections(&direction.start, &direction.target)
            .await
    }

    /// The current snapshot, refetched first if the cached one is stale.
    ///
    /// An unreadable cache is treated as absent. A failure to persist a
    /// fresh snapshot is logged; the fresh data is still returned.
    pub async fn get_data(
        &self,
        now: &DateTime<FixedOffset>,
    ) -> Result<CacheSnapshot, TransportError> {
        let now_secs = epoch_secs(now);

        let snapshot = match self.cache.load() {
            Ok(loaded) => loaded.into_snapshot(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable cache");
                CacheSnapshot::default()
            }
        };

        if !snapshot.is_stale(now_secs, self.refresh_interval) {
            info!("using cached data");
            return Ok(snapshot);
        }

        info!(
            last_fetch = snapshot.last_fetch_secs,
            "last check too old, fetching data"
        );
        let direction = self.choose_direction(now);
        let data = self.fetch(&direction).await?;

        let fresh = CacheSnapshot {
            last_fetch_secs: now_secs,
            start_location: direction.start_role,
            data,
        };
        if let Err(e) = self.cache.store(&fresh) {
            warn!(error = %e, "failed to store cache");
        }

        Ok(fresh)
    }

    /// Fetch if needed, then derive. Fetch failures become an error result.
    pub async fn run(&self, now: &DateTime<FixedOffset>) -> DerivedResult {
        debug!("run called");
        match self.get_data(now).await {
            Ok(snapshot) => derive_next(&snapshot, epoch_secs(now)),
            Err(e) => {
                error!(error = %e, "failed to fetch connections");
                DerivedResult::failure(format!("Failed to fetch connections: {e}"))
            }
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &ConnectionCache {
        &self.cache
    }
}

/// Pick the first connection in `snapshot` that departs at least one
/// second after `now_secs` and describe it.
///
/// The API lists connections in departure order, so the first match is
/// the soonest.
pub fn derive_next(snapshot: &CacheSnapshot, now_secs: f64) -> DerivedResult {
    let Some(connections) = snapshot.data.get("connections").filter(|c| !c.is_null()) else {
        return DerivedResult::failure(NO_CONNECTIONS);
    };
    let Some(entries) = connections.as_array() else {
        return DerivedResult::failure(format!(
            "Malformed connections: expected a list, got {connections}"
        ));
    };

    for (index, entry) in entries.iter().enumerate() {
        let connection: Connection = match serde_json::from_value(entry.clone()) {
            Ok(connection) => connection,
            Err(e) => {
                debug!(index, error = %e, "skipping undecodable connection");
                continue;
            }
        };
        let Some(departure) = connection.from.departure_timestamp else {
            continue;
        };

        // Truncates toward zero, so "0.9 s from now" counts as gone.
        let in_seconds = (departure as f64 - now_secs) as i64;
        if in_seconds < 1 {
            continue;
        }

        debug!(
            found = entries.len(),
            selected = index,
            in_seconds,
            "selected next connection"
        );
        return describe(snapshot, &connection, in_seconds as u64);
    }

    debug!(found = entries.len(), "no usable connection");
    DerivedResult {
        full_payload: Some(snapshot.data.clone()),
        ..DerivedResult::default()
    }
}

fn describe(snapshot: &CacheSnapshot, connection: &Connection, in_seconds: u64) -> DerivedResult {
    let delay = connection.from.delay_mins();
    let delayed = connection.delayed_sections();
    let delay_summary = (!delayed.is_empty()).then(|| render_delay_line(&delayed));

    let mut detail_lines: Vec<String> = delay_summary.iter().cloned().collect();
    detail_lines.push(render_time_line(
        in_seconds,
        connection.from.station_name(),
        connection.to.station_name(),
    ));

    DerivedResult {
        header: Some(render_header(snapshot.start_location, in_seconds, delay)),
        arduino_header: Some(render_arduino_header(in_seconds, delay)),
        delay_summary,
        detail_lines,
        error: None,
        full_payload: Some(snapshot.data.clone()),
    }
}

#[cfg(test)]
#[path = "fetcher_tests.rs"]
mod tests;
