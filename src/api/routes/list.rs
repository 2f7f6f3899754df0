use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::RoutesState;
use crate::api::ErrorResponse;
use crate::catalog::{Route, Stop};

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteSummary {
    pub id: String,
    pub name: String,
    pub stop_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteListResponse {
    pub routes: Vec<RouteSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteStopsResponse {
    pub route_id: String,
    /// Stops in travel order
    pub stops: Vec<Stop>,
}

/// List all configured routes
#[utoipa::path(
    get,
    path = "/api/routes",
    responses(
        (status = 200, description = "Configured routes", body = RouteListResponse)
    ),
    tag = "routes"
)]
pub async fn list_routes(State(state): State<RoutesState>) -> Json<RouteListResponse> {
    let routes = state
        .catalog
        .routes()
        .iter()
        .map(|r| RouteSummary {
            id: r.id.clone(),
            name: r.name.clone(),
            stop_count: r.stops.len(),
        })
        .collect();
    Json(RouteListResponse { routes })
}

/// Get one route with its polyline and ordered stops
#[utoipa::path(
    get,
    path = "/api/routes/{route_id}",
    params(
        ("route_id" = String, Path, description = "Route identifier")
    ),
    responses(
        (status = 200, description = "Route detail", body = Route),
        (status = 404, description = "Route not found", body = ErrorResponse)
    ),
    tag = "routes"
)]
pub async fn get_route(
    State(state): State<RoutesState>,
    Path(route_id): Path<String>,
) -> Result<Json<Route>, (StatusCode, Json<ErrorResponse>)> {
    state.catalog.get(&route_id).map(|r| Json(r.clone())).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Route not found: {route_id}"),
            }),
        )
    })
}

/// Get a route's stops in travel order
#[utoipa::path(
    get,
    path = "/api/routes/{route_id}/stops",
    params(
        ("route_id" = String, Path, description = "Route identifier")
    ),
    responses(
        (status = 200, description = "Stops in travel order", body = RouteStopsResponse),
        (status = 404, description = "Route not found", body = ErrorResponse)
    ),
    tag = "routes"
)]
pub async fn get_route_stops(
    State(state): State<RoutesState>,
    Path(route_id): Path<String>,
) -> Result<Json<RouteStopsResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.catalog.get(&route_id) {
        Some(route) => Ok(Json(RouteStopsResponse {
            route_id: route.id.clone(),
            stops: route.stops.clone(),
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Route not found: {route_id}"),
            }),
        )),
    }
}
