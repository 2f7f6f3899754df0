mod list;
mod status;
mod update;

pub use list::*;
pub use status::*;
pub use update::*;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::arrivals::ArrivalRecorder;
use crate::catalog::RouteCatalog;
use crate::config::EstimationConfig;
use crate::registry::VehicleRegistry;
use crate::storage::ArrivalStore;

#[derive(Clone)]
pub struct VehiclesState {
    pub catalog: Arc<RouteCatalog>,
    pub registry: Arc<VehicleRegistry>,
    pub store: ArrivalStore,
    pub recorder: Arc<ArrivalRecorder>,
    pub estimation: EstimationConfig,
    pub default_route_id: String,
}

pub fn router(
    catalog: Arc<RouteCatalog>,
    registry: Arc<VehicleRegistry>,
    store: ArrivalStore,
    estimation: EstimationConfig,
    default_route_id: String,
) -> Router {
    let recorder = Arc::new(ArrivalRecorder::new(store.clone(), &estimation));
    let state = VehiclesState {
        catalog,
        registry,
        store,
        recorder,
        estimation,
        default_route_id,
    };
    Router::new()
        .route("/", get(list_vehicles))
        .route("/location", post(update_location))
        .route("/{vehicle_id}/status", get(get_vehicle_status))
        .with_state(state)
}
