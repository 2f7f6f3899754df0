use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::ErrorResponse;
use crate::catalog::RouteCatalog;
use crate::config::EstimationConfig;
use crate::eta::history;
use crate::storage::ArrivalStore;

#[derive(Clone)]
pub struct AnalyticsState {
    pub catalog: Arc<RouteCatalog>,
    pub store: ArrivalStore,
    pub estimation: EstimationConfig,
    pub default_route_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ArrivalTimesQuery {
    pub route_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StopArrivalTime {
    pub stop_id: String,
    pub stop_name: String,
    /// Average arrival wall-clock time, e.g. "8:05 AM"
    pub average_arrival_time: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArrivalTimesResponse {
    pub route_id: String,
    pub data: Vec<StopArrivalTime>,
}

/// Render an offset from the canonical trip start as a 12-hour clock time.
fn clock_time(base: NaiveDateTime, minutes_from_start: f64) -> String {
    let projected = base + Duration::seconds((minutes_from_start * 60.0).round() as i64);
    projected.format("%-I:%M %p").to_string()
}

/// Average arrival clock time per stop
#[utoipa::path(
    get,
    path = "/api/analytics/arrival-times",
    params(
        ("route_id" = Option<String>, Query, description = "Route to report on; the configured default when omitted")
    ),
    responses(
        (status = 200, description = "Average arrival time at each stop, in travel order", body = ArrivalTimesResponse),
        (status = 404, description = "Route not found", body = ErrorResponse)
    ),
    tag = "analytics"
)]
pub async fn get_arrival_times(
    State(state): State<AnalyticsState>,
    Query(query): Query<ArrivalTimesQuery>,
) -> Result<Json<ArrivalTimesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let route_id = query
        .route_id
        .unwrap_or_else(|| state.default_route_id.clone());
    let route = match state.catalog.get(&route_id) {
        Some(r) => r,
        None => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Route not found: {route_id}"),
                }),
            ))
        }
    };

    let averages = history::route_averages(&state.store, route, &state.estimation).await;

    let tz = state.estimation.parsed_timezone();
    let today = Utc::now().with_timezone(&tz).date_naive();
    let base = today.and_time(state.estimation.trip_start());

    let data = route
        .stops
        .iter()
        .map(|stop| StopArrivalTime {
            stop_id: stop.id.clone(),
            stop_name: stop.name.clone(),
            average_arrival_time: clock_time(base, averages.get(&stop.id).copied().unwrap_or(0.0)),
        })
        .collect();

    Ok(Json(ArrivalTimesResponse { route_id, data }))
}

pub fn router(
    catalog: Arc<RouteCatalog>,
    store: ArrivalStore,
    estimation: EstimationConfig,
    default_route_id: String,
) -> Router {
    let state = AnalyticsState {
        catalog,
        store,
        estimation,
        default_route_id,
    };
    Router::new()
        .route("/arrival-times", get(get_arrival_times))
        .with_state(state)
}
