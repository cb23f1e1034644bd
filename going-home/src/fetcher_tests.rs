//! Tests for direction choice, staleness-gated fetching and derivation.

use super::*;
use crate::cache::CacheLoad;
use crate::render::{Channel, render};
use crate::transport::MockTransportClient;
use chrono::TimeZone;
use serde_json::json;
use tempfile::{TempDir, tempdir};

fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2026, 10, 19, hour, minute, 0)
        .unwrap()
}

fn settings(dir: &TempDir) -> Settings {
    Settings::new(Locations::new("A", "B")).with_cache_path(dir.path().join("cache.json"))
}

fn fetcher(dir: &TempDir, source: MockTransportClient) -> TransitFetcher<MockTransportClient> {
    TransitFetcher::new(source, &settings(dir))
}

/// A connection leaving `in_secs` after `now`.
fn connection(now: &DateTime<FixedOffset>, in_secs: i64, delay: Option<i64>) -> Value {
    json!({
        "from": {
            "station": {"name": "A"},
            "departureTimestamp": now.timestamp() + in_secs,
            "delay": delay
        },
        "to": {"station": {"name": "B"}},
        "sections": []
    })
}

fn snapshot(data: Value) -> CacheSnapshot {
    CacheSnapshot {
        last_fetch_secs: 0.0,
        start_location: LocationRole::Home,
        data,
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

#[test]
fn morning_goes_to_work() {
    let dir = tempdir().unwrap();
    let fetcher = fetcher(&dir, MockTransportClient::unavailable());

    let direction = fetcher.choose_direction(&at(11, 59));
    assert_eq!(
        direction,
        Direction {
            start: "A".into(),
            target: "B".into(),
            start_role: LocationRole::Home,
        }
    );
}

#[test]
fn afternoon_goes_home() {
    let dir = tempdir().unwrap();
    let fetcher = fetcher(&dir, MockTransportClient::unavailable());

    let direction = fetcher.choose_direction(&at(13, 0));
    assert_eq!(direction.start, "B");
    assert_eq!(direction.target, "A");
    assert_eq!(direction.start_role, LocationRole::Work);
}

#[test]
fn noon_exactly_goes_home() {
    let dir = tempdir().unwrap();
    let fetcher = fetcher(&dir, MockTransportClient::unavailable());

    assert_eq!(fetcher.choose_direction(&at(12, 0)).start_role, LocationRole::Work);
    assert_eq!(fetcher.choose_direction(&at(0, 0)).start_role, LocationRole::Home);
}

#[test]
fn direction_uses_local_hour_of_the_offset() {
    let dir = tempdir().unwrap();
    let fetcher = fetcher(&dir, MockTransportClient::unavailable());

    // 11:30 UTC is 13:30 at +02:00.
    let now = FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 7, 1, 13, 30, 0)
        .unwrap();
    assert_eq!(fetcher.choose_direction(&now).start_role, LocationRole::Work);
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

#[test]
fn missing_connections_is_an_error() {
    let now = at(8, 0);
    let result = derive_next(&snapshot(json!({"errors": []})), epoch_secs(&now));

    assert_eq!(result, DerivedResult::failure(NO_CONNECTIONS));
    assert_eq!(result.header, None);
    assert!(result.detail_lines.is_empty());
    assert_eq!(result.full_payload, None);
}

#[test]
fn empty_payload_is_an_error() {
    let result = derive_next(&CacheSnapshot::default(), 0.0);
    assert_eq!(result.error.as_deref(), Some(NO_CONNECTIONS));
}

#[test]
fn skips_departed_connections() {
    let now = at(8, 0);
    let data = json!({"connections": [connection(&now, -5, None), connection(&now, 600, Some(2))]});

    let result = derive_next(&snapshot(data.clone()), epoch_secs(&now));

    assert_eq!(result.error, None);
    assert_eq!(
        result.header.as_deref(),
        Some("Start from home in 10m (Delay: 2 min)")
    );
    assert_eq!(result.arduino_header.as_deref(), Some("Start in 10m +2 min"));
    assert_eq!(result.detail_lines, vec!["In 10m from A to B".to_string()]);
    assert_eq!(result.full_payload, Some(data));
}

#[test]
fn connection_departing_within_a_second_is_skipped() {
    let now = at(8, 0);
    let data = json!({"connections": [connection(&now, 0, None), connection(&now, 1, None)]});

    let result = derive_next(&snapshot(data), epoch_secs(&now));
    assert_eq!(result.header.as_deref(), Some("Start from home in 1s."));
}

#[test]
fn first_usable_connection_wins_even_if_a_later_one_is_sooner() {
    let now = at(8, 0);
    let data = json!({"connections": [connection(&now, 900, None), connection(&now, 300, None)]});

    let result = derive_next(&snapshot(data), epoch_secs(&now));
    assert_eq!(result.header.as_deref(), Some("Start from home in 15m."));
}

#[test]
fn no_usable_connection_only_echoes_payload() {
    let now = at(8, 0);
    let data = json!({"connections": [connection(&now, -60, None)]});

    let result = derive_next(&snapshot(data.clone()), epoch_secs(&now));

    assert_eq!(
        result,
        DerivedResult {
            full_payload: Some(data),
            ..DerivedResult::default()
        }
    );
}

#[test]
fn section_delays_are_summarised() {
    let now = at(17, 0);
    let mut conn = connection(&now, 125, None);
    conn["sections"] = json!([
        {"location": {"name": "Olten"}, "arrival": {"delay": 3}},
        {"location": {"name": "Aarau"}, "arrival": {"delay": 0}},
        {"location": {"name": "Zürich HB"}, "arrival": {"delay": 1}}
    ]);
    let data = json!({"connections": [conn]});
    let mut snap = snapshot(data);
    snap.start_location = LocationRole::Work;

    let result = derive_next(&snap, epoch_secs(&now));

    assert_eq!(result.header.as_deref(), Some("Start from work in 2m 5s."));
    assert_eq!(result.delay_summary.as_deref(), Some("Olten: 3;Zürich HB: 1"));
    assert_eq!(
        result.detail_lines,
        vec![
            "Olten: 3;Zürich HB: 1".to_string(),
            "In 2m 5s from A to B".to_string()
        ]
    );
}

#[test]
fn undecodable_connections_are_skipped() {
    let now = at(8, 0);
    let data = json!({"connections": ["garbage", {"from": {}}, connection(&now, 60, None)]});

    let result = derive_next(&snapshot(data), epoch_secs(&now));
    assert_eq!(result.header.as_deref(), Some("Start from home in 1m."));
}

#[test]
fn non_list_connections_is_an_error() {
    let result = derive_next(&snapshot(json!({"connections": {"oops": 1}})), 0.0);
    assert!(result.is_error());
    assert!(result.error.unwrap().starts_with("Malformed connections"));
    assert_eq!(result.full_payload, None);
}

// ---------------------------------------------------------------------------
// Fetching and caching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stale_cache_fetches_and_stores() {
    let dir = tempdir().unwrap();
    let now = at(8, 0);
    let data = json!({"connections": [connection(&now, 120, None)]});
    let fetcher = fetcher(&dir, MockTransportClient::new(data.clone()));

    let snap = fetcher.get_data(&now).await.unwrap();

    assert_eq!(fetcher.source().request_count(), 1);
    assert_eq!(snap.data, data);
    assert_eq!(snap.start_location, LocationRole::Home);
    assert_eq!(snap.last_fetch_secs, epoch_secs(&now));
    assert_eq!(fetcher.cache().load().unwrap(), CacheLoad::Present(snap));
}

#[tokio::test]
async fn fresh_cache_is_reused() {
    let dir = tempdir().unwrap();
    let now = at(8, 0);
    let fetcher = fetcher(&dir, MockTransportClient::new(json!({"connections": []})));

    fetcher.get_data(&now).await.unwrap();
    // Same instant, and just inside the window.
    fetcher.get_data(&now).await.unwrap();
    fetcher
        .get_data(&(now + chrono::Duration::seconds(299)))
        .await
        .unwrap();
    assert_eq!(fetcher.source().request_count(), 1);

    fetcher
        .get_data(&(now + chrono::Duration::seconds(300)))
        .await
        .unwrap();
    assert_eq!(fetcher.source().request_count(), 2);
}

#[tokio::test]
async fn cached_direction_is_kept_until_stale() {
    let dir = tempdir().unwrap();
    let fetcher = fetcher(&dir, MockTransportClient::new(json!({"connections": []})));

    fetcher.get_data(&at(11, 58)).await.unwrap();
    let snap = fetcher.get_data(&at(12, 1)).await.unwrap();
    assert_eq!(snap.start_location, LocationRole::Home);

    let snap = fetcher.get_data(&at(12, 4)).await.unwrap();
    assert_eq!(snap.start_location, LocationRole::Work);
}

#[tokio::test]
async fn corrupt_cache_is_treated_as_absent() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("cache.json"), "not json").unwrap();
    let fetcher = fetcher(&dir, MockTransportClient::new(json!({"connections": []})));

    let snap = fetcher.get_data(&at(9, 0)).await.unwrap();

    assert_eq!(fetcher.source().request_count(), 1);
    assert_eq!(snap.data, json!({"connections": []}));
}

#[tokio::test]
async fn fetch_failure_propagates_from_get_data() {
    let dir = tempdir().unwrap();
    let fetcher = fetcher(&dir, MockTransportClient::unavailable());

    let err = fetcher.get_data(&at(9, 0)).await.unwrap_err();
    assert!(matches!(err, TransportError::Api { status: 503, .. }));
    assert_eq!(fetcher.cache().load().unwrap(), CacheLoad::Absent);
}

#[tokio::test]
async fn run_turns_fetch_failure_into_error_result() {
    let dir = tempdir().unwrap();
    let fetcher = fetcher(&dir, MockTransportClient::unavailable());

    let result = fetcher.run(&at(9, 0)).await;

    assert!(result.is_error());
    assert!(result.error.unwrap().starts_with("Failed to fetch connections"));
    assert_eq!(result.header, None);
    assert_eq!(result.full_payload, None);
}

#[tokio::test]
async fn run_reports_missing_connections() {
    let dir = tempdir().unwrap();
    let fetcher = fetcher(&dir, MockTransportClient::new(json!({"stations": []})));

    let result = fetcher.run(&at(9, 0)).await;
    assert_eq!(result, DerivedResult::failure(NO_CONNECTIONS));
}

#[tokio::test]
async fn end_to_end_cli_output() {
    let dir = tempdir().unwrap();
    let now = at(8, 0);
    let data = json!({"connections": [connection(&now, 120, None)]});
    let fetcher = fetcher(&dir, MockTransportClient::new(data));

    let result = fetcher.run(&now).await;
    let rendered = render(Channel::Cli, &result).unwrap();

    assert_eq!(rendered.body, "Start from home in 2m.\nIn 2m from A to B");
    assert!(!rendered.failed);
}

#[tokio::test]
async fn end_to_end_uses_cached_snapshot_later() {
    let dir = tempdir().unwrap();
    let now = at(8, 0);
    let data = json!({"connections": [connection(&now, 120, None), connection(&now, 1800, None)]});
    let fetcher = fetcher(&dir, MockTransportClient::new(data));

    fetcher.run(&now).await;
    // Three minutes later the first connection has gone.
    let result = fetcher.run(&(now + chrono::Duration::seconds(180))).await;

    assert_eq!(fetcher.source().request_count(), 1);
    assert_eq!(result.header.as_deref(), Some("Start from home in 27m."));
}
