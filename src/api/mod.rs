pub mod analytics;
pub mod error;
pub mod health;
pub mod routes;
pub mod vehicles;

pub use error::ErrorResponse;

use std::sync::Arc;

use axum::Router;

use crate::catalog::RouteCatalog;
use crate::config::EstimationConfig;
use crate::registry::VehicleRegistry;
use crate::storage::ArrivalStore;

pub fn router(
    catalog: Arc<RouteCatalog>,
    registry: Arc<VehicleRegistry>,
    store: ArrivalStore,
    estimation: EstimationConfig,
    default_route_id: String,
) -> Router {
    Router::new()
        .nest(
            "/vehicles",
            vehicles::router(
                catalog.clone(),
                registry.clone(),
                store.clone(),
                estimation.clone(),
                default_route_id.clone(),
            ),
        )
        .nest("/routes", routes::router(catalog.clone()))
        .nest(
            "/analytics",
            analytics::router(catalog.clone(), store.clone(), estimation, default_route_id),
        )
        .nest("/health", health::router(catalog, registry, store))
}
