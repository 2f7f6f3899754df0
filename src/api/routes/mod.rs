mod list;

pub use list::*;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::catalog::RouteCatalog;

#[derive(Clone)]
pub struct RoutesState {
    pub catalog: Arc<RouteCatalog>,
}

pub fn router(catalog: Arc<RouteCatalog>) -> Router {
    let state = RoutesState { catalog };
    Router::new()
        .route("/", get(list_routes))
        .route("/{route_id}", get(get_route))
        .route("/{route_id}/stops", get(get_route_stops))
        .with_state(state)
}
