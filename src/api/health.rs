use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::RouteCatalog;
use crate::registry::VehicleRegistry;
use crate::storage::ArrivalStore;

#[derive(Clone)]
pub struct HealthState {
    pub catalog: Arc<RouteCatalog>,
    pub registry: Arc<VehicleRegistry>,
    pub store: ArrivalStore,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Whether the service is running
    pub healthy: bool,
    /// Number of configured routes
    pub route_count: usize,
    /// Number of configured stops across all routes
    pub stop_count: usize,
    /// Number of vehicles with stored state
    pub tracked_vehicle_count: usize,
    /// Number of stored arrival events; null when the store is unreachable
    pub arrival_event_count: Option<i64>,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    let arrival_event_count = state.store.count().await.ok();

    Json(HealthResponse {
        healthy: true,
        route_count: state.catalog.route_count(),
        stop_count: state.catalog.stop_count(),
        tracked_vehicle_count: state.registry.count().await,
        arrival_event_count,
    })
}

pub fn router(
    catalog: Arc<RouteCatalog>,
    registry: Arc<VehicleRegistry>,
    store: ArrivalStore,
) -> Router {
    let state = HealthState {
        catalog,
        registry,
        store,
    };
    Router::new().route("/", get(health_check)).with_state(state)
}
