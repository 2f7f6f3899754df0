use std::collections::HashMap;

use crate::catalog::Stop;
use crate::config::EstimationConfig;

use super::geo;

/// Project arrival minutes for every stop ahead of the vehicle on the route
/// path, from accumulated polyline distance over effective speed.
///
/// Reported speeds at or below `min_live_speed_kmh` (including 0 and NaN)
/// are replaced with `fallback_speed_kmh` so a vehicle idling at a red
/// light still gets plausible projections.
pub fn project(
    path: &[[f64; 2]],
    stops: &[Stop],
    lat: f64,
    lon: f64,
    speed_kmh: f64,
    config: &EstimationConfig,
) -> HashMap<String, i64> {
    let mut etas = HashMap::new();
    if path.is_empty() || stops.is_empty() {
        return etas;
    }

    let current = match geo::nearest_index(path, lat, lon) {
        Some(i) => i,
        None => return etas,
    };

    let effective_kmh = if speed_kmh > config.min_live_speed_kmh {
        speed_kmh
    } else {
        config.fallback_speed_kmh
    };
    let meters_per_minute = effective_kmh * 1000.0 / 60.0;

    // Snap each stop to its path vertex once, up front.
    let stop_vertices: Vec<(usize, &Stop)> = stops
        .iter()
        .filter_map(|stop| geo::nearest_index(path, stop.lat, stop.lon).map(|i| (i, stop)))
        .collect();

    let mut accumulated = 0.0;
    for i in current..path.len() - 1 {
        accumulated += geo::distance_meters(
            path[i][0],
            path[i][1],
            path[i + 1][0],
            path[i + 1][1],
        );

        for (vertex, stop) in &stop_vertices {
            if *vertex == i + 1 && !etas.contains_key(&stop.id) {
                etas.insert(stop.id.clone(), (accumulated / meters_per_minute).round() as i64);
            }
        }
    }

    etas
}

#[cfg(test)]
mod tests {
    use super::*;

    // Vertices 0.01 degrees of longitude apart on the equator are about
    // 1112 m apart, so the expected minutes below are stable.
    fn straight_path() -> Vec<[f64; 2]> {
        vec![[0.0, 0.0], [0.0, 0.01], [0.0, 0.02], [0.0, 0.03]]
    }

    fn make_stop(id: &str, lat: f64, lon: f64) -> Stop {
        Stop {
            id: id.to_string(),
            name: id.to_uppercase(),
            lat,
            lon,
            route_id: "route-1".to_string(),
        }
    }

    fn stops_on_path() -> Vec<Stop> {
        vec![
            make_stop("s1", 0.0, 0.01),
            make_stop("s2", 0.0, 0.02),
            make_stop("s3", 0.0, 0.03),
        ]
    }

    fn config() -> EstimationConfig {
        EstimationConfig::default()
    }

    #[test]
    fn projects_minutes_for_stops_ahead() {
        // 60 km/h = 1000 m/min, segments ~1112 m.
        let etas = project(&straight_path(), &stops_on_path(), 0.0, 0.0, 60.0, &config());
        assert_eq!(etas.get("s1"), Some(&1));
        assert_eq!(etas.get("s2"), Some(&2));
        assert_eq!(etas.get("s3"), Some(&3));
    }

    #[test]
    fn stops_at_or_behind_vehicle_are_omitted() {
        let etas = project(&straight_path(), &stops_on_path(), 0.0, 0.02, 60.0, &config());
        assert!(!etas.contains_key("s1"));
        assert!(!etas.contains_key("s2"));
        assert_eq!(etas.get("s3"), Some(&1));
    }

    #[test]
    fn vehicle_at_final_vertex_yields_empty_map() {
        let etas = project(&straight_path(), &stops_on_path(), 0.0, 0.03, 60.0, &config());
        assert!(etas.is_empty());
    }

    #[test]
    fn empty_path_or_stops_yield_empty_map() {
        assert!(project(&[], &stops_on_path(), 0.0, 0.0, 40.0, &config()).is_empty());
        assert!(project(&straight_path(), &[], 0.0, 0.0, 40.0, &config()).is_empty());
    }

    #[test]
    fn slow_or_stopped_vehicle_uses_fallback_speed() {
        // 30 km/h = 500 m/min, so s2 at ~2224 m rounds to 4 minutes.
        let stopped = project(&straight_path(), &stops_on_path(), 0.0, 0.0, 0.0, &config());
        assert_eq!(stopped.get("s2"), Some(&4));

        let crawling = project(&straight_path(), &stops_on_path(), 0.0, 0.0, 5.0, &config());
        assert_eq!(crawling, stopped);
    }

    #[test]
    fn non_finite_speed_uses_fallback_speed() {
        let etas = project(&straight_path(), &stops_on_path(), 0.0, 0.0, f64::NAN, &config());
        assert_eq!(etas.get("s1"), Some(&2));
    }
}
