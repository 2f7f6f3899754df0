use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::catalog::{Route, Stop};
use crate::config::EstimationConfig;
use crate::storage::{ArrivalEvent, ArrivalStore};

/// Average elapsed minutes from the route's first stop to every stop,
/// normalized so the last stop lands on `canonical_trip_minutes`.
///
/// `events` must be ordered by `(vehicle_id, timestamp)`, as
/// `ArrivalStore::events_since` returns them. Every visit to the first stop
/// re-anchors that vehicle's trip; samples outside the plausibility bounds
/// and events for stops not on the route are discarded. When no trip reached
/// the last stop the profile falls back to a linear spread over the
/// canonical duration.
pub fn scaled_averages(
    events: &[ArrivalEvent],
    stops: &[Stop],
    config: &EstimationConfig,
) -> HashMap<String, f64> {
    let mut averages = HashMap::new();
    if stops.is_empty() {
        return averages;
    }

    let first_stop_id = stops[0].id.as_str();
    let last_stop_id = stops[stops.len() - 1].id.as_str();

    let mut samples: HashMap<&str, Vec<f64>> =
        stops.iter().map(|s| (s.id.as_str(), Vec::new())).collect();

    let mut current_vehicle: Option<&str> = None;
    let mut trip_start: Option<DateTime<chrono::FixedOffset>> = None;

    for event in events {
        if current_vehicle != Some(event.vehicle_id.as_str()) {
            current_vehicle = Some(event.vehicle_id.as_str());
            trip_start = None;
        }

        let timestamp = match DateTime::parse_from_rfc3339(&event.timestamp) {
            Ok(t) => t,
            Err(_) => continue,
        };

        if event.stop_id == first_stop_id {
            trip_start = Some(timestamp);
            if let Some(first) = samples.get_mut(first_stop_id) {
                first.push(0.0);
            }
            continue;
        }

        let start = match trip_start {
            Some(s) => s,
            None => continue,
        };

        let elapsed = (timestamp - start).num_milliseconds() as f64 / 60_000.0;
        if elapsed > 0.0 && elapsed < config.max_plausible_elapsed_minutes {
            if let Some(stop_samples) = samples.get_mut(event.stop_id.as_str()) {
                stop_samples.push(elapsed);
            }
        }
    }

    for stop in stops {
        let average = match samples.get(stop.id.as_str()) {
            Some(s) if !s.is_empty() => s.iter().sum::<f64>() / s.len() as f64,
            _ => 0.0,
        };
        averages.insert(stop.id.clone(), average);
    }

    let raw_total = averages.get(last_stop_id).copied().unwrap_or(0.0);
    if raw_total == 0.0 {
        // No trip reached the last stop; spread the canonical duration
        // linearly over the stop sequence instead.
        let n = stops.len();
        for (i, stop) in stops.iter().enumerate() {
            let fraction = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            averages.insert(stop.id.clone(), fraction * config.canonical_trip_minutes);
        }
    } else {
        let scale = config.canonical_trip_minutes / raw_total;
        for value in averages.values_mut() {
            *value *= scale;
        }
    }

    averages
}

/// Load the route's arrival history over the configured window and compute
/// its scaled profile. Storage failures degrade to an empty profile so ETA
/// queries keep working off the physical projection alone.
pub async fn route_averages(
    store: &ArrivalStore,
    route: &Route,
    config: &EstimationConfig,
) -> HashMap<String, f64> {
    let since = (Utc::now() - Duration::days(config.history_window_days)).to_rfc3339();
    match store.events_since(&route.id, &since).await {
        Ok(events) => scaled_averages(&events, &route.stops, config),
        Err(e) => {
            warn!(route_id = %route.id, error = %e, "Failed to load arrival history; using empty profile");
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    fn make_stop(id: &str) -> Stop {
        Stop {
            id: id.to_string(),
            name: id.to_uppercase(),
            lat: 0.0,
            lon: 0.0,
            route_id: "route-1".to_string(),
        }
    }

    fn three_stops() -> Vec<Stop> {
        vec![make_stop("s1"), make_stop("s2"), make_stop("s3")]
    }

    fn make_event(vehicle_id: &str, stop_id: &str, minutes_after_base: i64) -> ArrivalEvent {
        let base = DateTime::parse_from_rfc3339("2026-08-01T07:30:00+00:00").unwrap();
        ArrivalEvent {
            vehicle_id: vehicle_id.to_string(),
            route_id: "route-1".to_string(),
            stop_id: stop_id.to_string(),
            timestamp: (base + Duration::minutes(minutes_after_base)).to_rfc3339(),
        }
    }

    fn config() -> EstimationConfig {
        EstimationConfig::default()
    }

    // --- scaled_averages tests ---

    #[test]
    fn no_events_produce_linear_fallback() {
        let averages = scaled_averages(&[], &three_stops(), &config());
        assert_eq!(averages["s1"], 0.0);
        assert_eq!(averages["s2"], 45.0);
        assert_eq!(averages["s3"], 90.0);
    }

    #[test]
    fn single_trip_is_scaled_to_canonical_duration() {
        let events = vec![
            make_event("BUS-101", "s1", 0),
            make_event("BUS-101", "s2", 10),
            make_event("BUS-101", "s3", 30),
        ];
        let averages = scaled_averages(&events, &three_stops(), &config());
        assert_eq!(averages["s1"], 0.0);
        assert!((averages["s2"] - 30.0).abs() < 1e-9);
        assert!((averages["s3"] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn implausible_samples_are_discarded() {
        let stops = vec![make_stop("s1"), make_stop("s2")];
        let events = vec![
            make_event("BUS-101", "s1", 0),
            // Same timestamp as the anchor: elapsed 0 is not a valid sample.
            make_event("BUS-101", "s2", 0),
            // Beyond the plausibility bound.
            make_event("BUS-101", "s2", 130),
        ];
        let averages = scaled_averages(&events, &stops, &config());
        // Both samples discarded, so the last stop has no data and the
        // linear fallback kicks in.
        assert_eq!(averages["s1"], 0.0);
        assert_eq!(averages["s2"], 90.0);
    }

    #[test]
    fn events_for_unknown_stops_are_ignored() {
        let stops = vec![make_stop("s1"), make_stop("s2")];
        let events = vec![
            make_event("BUS-101", "s1", 0),
            make_event("BUS-101", "ghost-stop", 5),
            make_event("BUS-101", "s2", 10),
        ];
        let averages = scaled_averages(&events, &stops, &config());
        assert_eq!(averages.len(), 2);
        assert!((averages["s2"] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn revisiting_the_first_stop_reanchors_the_trip() {
        let stops = vec![make_stop("s1"), make_stop("s2")];
        let events = vec![
            make_event("BUS-101", "s1", 0),
            make_event("BUS-101", "s2", 10),
            // Second loop: anchor moves to minute 60.
            make_event("BUS-101", "s1", 60),
            make_event("BUS-101", "s2", 70),
        ];
        let averages = scaled_averages(&events, &stops, &config());
        // Both loops yield a 10-minute sample; scaled 90 / 10 = 9.
        assert_eq!(averages["s1"], 0.0);
        assert!((averages["s2"] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn vehicles_without_an_anchor_contribute_nothing() {
        let events = vec![
            // BUS-077 never hits the first stop, so its events are noise.
            make_event("BUS-077", "s2", 5),
            make_event("BUS-077", "s3", 12),
            make_event("BUS-101", "s1", 0),
            make_event("BUS-101", "s2", 10),
            make_event("BUS-101", "s3", 30),
        ];
        let averages = scaled_averages(&events, &three_stops(), &config());
        assert!((averages["s2"] - 30.0).abs() < 1e-9);
        assert!((averages["s3"] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn empty_stop_list_yields_empty_profile() {
        let events = vec![make_event("BUS-101", "s1", 0)];
        assert!(scaled_averages(&events, &[], &config()).is_empty());
    }

    // --- route_averages tests ---

    #[tokio::test]
    async fn storage_failure_degrades_to_empty_profile() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        let store = ArrivalStore::new(pool.clone());
        pool.close().await;

        let route = Route {
            id: "route-1".to_string(),
            name: "Test Route".to_string(),
            path: vec![],
            stops: three_stops(),
        };
        let averages = route_averages(&store, &route, &config()).await;
        assert!(averages.is_empty());
    }

    #[tokio::test]
    async fn stored_events_feed_the_profile() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        let store = ArrivalStore::new(pool);

        let now = Utc::now();
        for (stop_id, offset) in [("s1", 0), ("s2", 10), ("s3", 30)] {
            store
                .append(&ArrivalEvent {
                    vehicle_id: "BUS-101".to_string(),
                    route_id: "route-1".to_string(),
                    stop_id: stop_id.to_string(),
                    timestamp: (now - Duration::minutes(40 - offset)).to_rfc3339(),
                })
                .await
                .unwrap();
        }

        let route = Route {
            id: "route-1".to_string(),
            name: "Test Route".to_string(),
            path: vec![],
            stops: three_stops(),
        };
        let averages = route_averages(&store, &route, &config()).await;
        assert!((averages["s3"] - 90.0).abs() < 1e-9);
        assert!((averages["s2"] - 30.0).abs() < 1e-9);
    }
}
