use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::VehiclesState;

#[derive(Debug, Serialize, ToSchema)]
pub struct VehicleStatusResponse {
    pub status: String,
    /// Stop name, or "Unknown" when the reporter never sent one
    pub next_stop: String,
}

/// Not-found body still carries the UNKNOWN defaults so clients can render
/// it without special-casing.
#[derive(Debug, Serialize, ToSchema)]
pub struct VehicleStatusNotFound {
    pub error: String,
    pub status: String,
    pub next_stop: String,
}

/// Get a vehicle's status and next stop
#[utoipa::path(
    get,
    path = "/api/vehicles/{vehicle_id}/status",
    params(
        ("vehicle_id" = String, Path, description = "Vehicle identifier")
    ),
    responses(
        (status = 200, description = "Current status", body = VehicleStatusResponse),
        (status = 404, description = "Vehicle not tracked", body = VehicleStatusNotFound)
    ),
    tag = "vehicles"
)]
pub async fn get_vehicle_status(
    State(state): State<VehiclesState>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<VehicleStatusResponse>, (StatusCode, Json<VehicleStatusNotFound>)> {
    match state.registry.get(&vehicle_id).await {
        Some(vehicle) => Ok(Json(VehicleStatusResponse {
            status: vehicle.status,
            next_stop: vehicle.next_stop.unwrap_or_else(|| "Unknown".to_string()),
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(VehicleStatusNotFound {
                error: format!("Vehicle not found: {vehicle_id}"),
                status: "UNKNOWN".to_string(),
                next_stop: "Unknown".to_string(),
            }),
        )),
    }
}
