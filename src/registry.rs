use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

/// Last known state of a tracked vehicle
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VehicleState {
    /// Stable vehicle identifier, e.g. "BUS-101"
    pub vehicle_id: String,
    /// Route the vehicle is serving
    pub route_id: String,
    pub lat: f64,
    pub lon: f64,
    /// Reported speed in km/h
    pub speed_kmh: f64,
    /// Free-form status label; derived from speed unless the reporter sent one
    pub status: String,
    /// Name of the stop the reporter believes is next
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_stop: Option<String>,
    /// When this state was last overwritten (RFC 3339)
    pub last_updated: String,
}

/// Status label derived from reported speed when the reporter sends none.
pub fn derive_status(speed_kmh: f64) -> &'static str {
    if speed_kmh >= 20.0 {
        "Moving"
    } else if speed_kmh > 0.0 {
        "In Traffic"
    } else {
        "Stopped"
    }
}

/// In-memory vehicle state store, keyed by vehicle id.
///
/// Updates overwrite wholesale: the newest accepted report wins, with no
/// versioning or merging. Constructed once in `main` and shared via `Arc`.
pub struct VehicleRegistry {
    vehicles: RwLock<HashMap<String, VehicleState>>,
}

impl VehicleRegistry {
    pub fn new() -> Self {
        Self {
            vehicles: RwLock::new(HashMap::new()),
        }
    }

    /// Overwrite the state for a vehicle and stamp it with the current time.
    /// Returns the stored state.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        vehicle_id: &str,
        route_id: &str,
        lat: f64,
        lon: f64,
        speed_kmh: f64,
        status: Option<String>,
        next_stop: Option<String>,
    ) -> VehicleState {
        let state = VehicleState {
            vehicle_id: vehicle_id.to_string(),
            route_id: route_id.to_string(),
            lat,
            lon,
            speed_kmh,
            status: status.unwrap_or_else(|| derive_status(speed_kmh).to_string()),
            next_stop,
            last_updated: Utc::now().to_rfc3339(),
        };

        let mut vehicles = self.vehicles.write().await;
        vehicles.insert(vehicle_id.to_string(), state.clone());
        state
    }

    pub async fn get(&self, vehicle_id: &str) -> Option<VehicleState> {
        self.vehicles.read().await.get(vehicle_id).cloned()
    }

    /// Snapshot of every tracked vehicle, sorted by vehicle id for stable
    /// output.
    pub async fn all(&self) -> Vec<VehicleState> {
        let vehicles = self.vehicles.read().await;
        let mut states: Vec<VehicleState> = vehicles.values().cloned().collect();
        states.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        states
    }

    pub async fn count(&self) -> usize {
        self.vehicles.read().await.len()
    }
}

impl Default for VehicleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
