use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::config::RouteConfig;
use crate::eta::geo;

/// A stop on a route
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Stop {
    /// Stable stop identifier, e.g. "stop-3"
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Route this stop belongs to
    pub route_id: String,
}

/// A route with its polyline and stops in travel order
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Route {
    pub id: String,
    pub name: String,
    /// Polyline as [lat, lon] vertices in travel order
    #[schema(value_type = Vec<Vec<f64>>)]
    pub path: Vec<[f64; 2]>,
    /// Stops sorted by their position along the path
    pub stops: Vec<Stop>,
}

/// Immutable reference data loaded once at startup and shared with handlers.
pub struct RouteCatalog {
    routes: Vec<Route>,
    by_id: HashMap<String, usize>,
}

impl RouteCatalog {
    /// Build the catalog, sorting each route's stops into travel order by
    /// the path vertex they snap to. Stops that cannot be projected (empty
    /// path) keep their configured order.
    pub fn from_config(route_configs: &[RouteConfig]) -> Self {
        let mut routes = Vec::with_capacity(route_configs.len());
        let mut by_id = HashMap::new();

        for rc in route_configs {
            let mut stops: Vec<Stop> = rc
                .stops
                .iter()
                .map(|s| Stop {
                    id: s.id.clone(),
                    name: s.name.clone(),
                    lat: s.lat,
                    lon: s.lon,
                    route_id: rc.id.clone(),
                })
                .collect();

            stops.sort_by_key(|s| {
                geo::nearest_index(&rc.path, s.lat, s.lon).unwrap_or(usize::MAX)
            });

            by_id.insert(rc.id.clone(), routes.len());
            routes.push(Route {
                id: rc.id.clone(),
                name: rc.name.clone(),
                path: rc.path.clone(),
                stops,
            });
        }

        Self { routes, by_id }
    }

    pub fn get(&self, route_id: &str) -> Option<&Route> {
        self.by_id.get(route_id).map(|&i| &self.routes[i])
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn stop_count(&self) -> usize {
        self.routes.iter().map(|r| r.stops.len()).sum()
    }
}
