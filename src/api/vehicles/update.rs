use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use super::VehiclesState;
use crate::api::ErrorResponse;
use crate::registry::VehicleState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LocationUpdate {
    /// Stable vehicle identifier, e.g. "BUS-101"
    pub vehicle_id: String,
    pub lat: f64,
    pub lon: f64,
    /// Reported speed in km/h
    pub speed_kmh: f64,
    /// Route the vehicle is serving; the configured default when omitted
    pub route_id: Option<String>,
    /// Status label stored verbatim; derived from speed when omitted
    pub status: Option<String>,
    /// Name of the stop the reporter believes is next
    pub next_stop: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationUpdateResponse {
    pub message: String,
    /// The state as stored
    pub vehicle: VehicleState,
}

/// Ingest a vehicle position report
#[utoipa::path(
    post,
    path = "/api/vehicles/location",
    request_body = LocationUpdate,
    responses(
        (status = 200, description = "State stored for the vehicle", body = LocationUpdateResponse),
        (status = 400, description = "Invalid report", body = ErrorResponse)
    ),
    tag = "vehicles"
)]
pub async fn update_location(
    State(state): State<VehiclesState>,
    Json(update): Json<LocationUpdate>,
) -> Result<Json<LocationUpdateResponse>, (StatusCode, Json<ErrorResponse>)> {
    if update.vehicle_id.trim().is_empty() {
        return Err(bad_request("vehicle_id must not be empty"));
    }
    if !update.lat.is_finite() || !update.lon.is_finite() {
        return Err(bad_request("lat and lon must be finite numbers"));
    }
    if !update.speed_kmh.is_finite() || update.speed_kmh < 0.0 {
        return Err(bad_request("speed_kmh must be a finite, non-negative number"));
    }

    let route_id = update
        .route_id
        .clone()
        .unwrap_or_else(|| state.default_route_id.clone());
    let route = match state.catalog.get(&route_id) {
        Some(r) => r,
        None => return Err(bad_request(format!("Unknown route: {route_id}"))),
    };

    let vehicle = state
        .registry
        .update(
            &update.vehicle_id,
            &route_id,
            update.lat,
            update.lon,
            update.speed_kmh,
            update.status,
            update.next_stop,
        )
        .await;
    debug!(
        vehicle_id = %vehicle.vehicle_id,
        route_id = %route_id,
        speed_kmh = vehicle.speed_kmh,
        "Stored position update"
    );

    state
        .recorder
        .observe(&update.vehicle_id, route, update.lat, update.lon)
        .await;

    Ok(Json(LocationUpdateResponse {
        message: "Location updated successfully".to_string(),
        vehicle,
    }))
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
