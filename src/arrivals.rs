use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::catalog::Route;
use crate::config::EstimationConfig;
use crate::eta::geo;
use crate::storage::{ArrivalEvent, ArrivalStore};

/// Detects stop arrivals in accepted position updates and appends them to
/// the event store.
pub struct ArrivalRecorder {
    store: ArrivalStore,
    radius_meters: f64,
    debounce_minutes: i64,
}

impl ArrivalRecorder {
    pub fn new(store: ArrivalStore, config: &EstimationConfig) -> Self {
        Self {
            store,
            radius_meters: config.arrival_radius_meters,
            debounce_minutes: config.arrival_debounce_minutes,
        }
    }

    /// Record an arrival for every stop the vehicle is within the arrival
    /// radius of, unless the same (vehicle, stop) pair already produced one
    /// inside the debounce window.
    ///
    /// The existence check and the insert are not atomic; concurrent updates
    /// for one vehicle can occasionally double-record, which the averaging
    /// tolerates. Storage errors are logged and swallowed so a position
    /// update never fails on recording.
    pub async fn observe(&self, vehicle_id: &str, route: &Route, lat: f64, lon: f64) {
        for stop in &route.stops {
            let distance = geo::distance_meters(lat, lon, stop.lat, stop.lon);
            if distance >= self.radius_meters {
                continue;
            }

            let since = (Utc::now() - Duration::minutes(self.debounce_minutes)).to_rfc3339();
            match self.store.recent_exists(vehicle_id, &stop.id, &since).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        vehicle_id = %vehicle_id,
                        stop_id = %stop.id,
                        error = %e,
                        "Arrival dedup check failed; skipping record"
                    );
                    continue;
                }
            }

            let event = ArrivalEvent {
                vehicle_id: vehicle_id.to_string(),
                route_id: route.id.clone(),
                stop_id: stop.id.clone(),
                timestamp: Utc::now().to_rfc3339(),
            };
            match self.store.append(&event).await {
                Ok(()) => {
                    info!(vehicle_id = %vehicle_id, stop = %stop.name, stop_id = %stop.id, "Recorded stop arrival");
                }
                Err(e) => {
                    warn!(
                        vehicle_id = %vehicle_id,
                        stop_id = %stop.id,
                        error = %e,
                        "Failed to record stop arrival"
                    );
                }
            }
        }
    }
}
