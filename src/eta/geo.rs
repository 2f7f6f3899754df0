const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two WGS84 points.
///
/// Identical coordinate pairs short-circuit to exactly 0.0 so callers can
/// rely on bitwise-zero for "same point" without floating-point residue.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if lat1 == lat2 && lon1 == lon2 {
        return 0.0;
    }

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Index of the path vertex closest to the given point.
///
/// A vertex snap, not a nearest-point-on-segment projection; it assumes the
/// path is sampled densely enough that the nearest vertex is a fair proxy.
/// Returns `None` for an empty path. Ties keep the earliest vertex, which
/// matters on looped paths where a coordinate can repeat.
pub fn nearest_index(path: &[[f64; 2]], lat: f64, lon: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (i, vertex) in path.iter().enumerate() {
        let dist = distance_meters(lat, lon, vertex[0], vertex[1]);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((i, dist)),
        }
    }

    best.map(|(i, _)| i)
}
