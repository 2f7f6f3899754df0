use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::VehiclesState;
use crate::api::ErrorResponse;
use crate::eta::{blend, history, physical};
use crate::registry::VehicleState;

#[derive(Debug, Deserialize)]
pub struct ListVehiclesQuery {
    pub route_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackedVehicle {
    pub vehicle: VehicleState,
    /// Blended minutes to arrival keyed by stop id, upcoming stops only;
    /// empty when the vehicle's route is not in the catalog
    pub etas: HashMap<String, i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VehicleListResponse {
    pub vehicles: Vec<TrackedVehicle>,
    /// When this snapshot was computed (RFC 3339)
    pub timestamp: String,
}

/// List tracked vehicles with blended ETAs
#[utoipa::path(
    get,
    path = "/api/vehicles",
    params(
        ("route_id" = Option<String>, Query, description = "Only vehicles on this route")
    ),
    responses(
        (status = 200, description = "Tracked vehicles with ETAs", body = VehicleListResponse),
        (status = 404, description = "Unknown route filter", body = ErrorResponse)
    ),
    tag = "vehicles"
)]
pub async fn list_vehicles(
    State(state): State<VehiclesState>,
    Query(query): Query<ListVehiclesQuery>,
) -> Result<Json<VehicleListResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Some(route_id) = &query.route_id {
        if state.catalog.get(route_id).is_none() {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Route not found: {route_id}"),
                }),
            ));
        }
    }

    let mut states = state.registry.all().await;
    if let Some(route_id) = &query.route_id {
        states.retain(|v| v.route_id == *route_id);
    }

    // One historical profile per distinct route, fetched concurrently.
    let store = &state.store;
    let estimation = &state.estimation;
    let route_ids: HashSet<&str> = states.iter().map(|v| v.route_id.as_str()).collect();
    let profile_futures: Vec<_> = route_ids
        .into_iter()
        .filter_map(|route_id| state.catalog.get(route_id))
        .map(|route| async move {
            let profile = history::route_averages(store, route, estimation).await;
            (route.id.clone(), profile)
        })
        .collect();
    let profiles: HashMap<String, HashMap<String, f64>> =
        join_all(profile_futures).await.into_iter().collect();

    let empty_profile = HashMap::new();
    let vehicles = states
        .into_iter()
        .map(|vehicle| {
            let etas = match state.catalog.get(&vehicle.route_id) {
                Some(route) => {
                    let projected = physical::project(
                        &route.path,
                        &route.stops,
                        vehicle.lat,
                        vehicle.lon,
                        vehicle.speed_kmh,
                        estimation,
                    );
                    let profile = profiles.get(&route.id).unwrap_or(&empty_profile);
                    blend::blend(&projected, profile)
                }
                None => HashMap::new(),
            };
            TrackedVehicle { vehicle, etas }
        })
        .collect();

    Ok(Json(VehicleListResponse {
        vehicles,
        timestamp: Utc::now().to_rfc3339(),
    }))
}
