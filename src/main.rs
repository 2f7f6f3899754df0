pub mod api;
mod arrivals;
mod catalog;
mod config;
mod eta;
mod registry;
mod storage;

use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::SqlitePool;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use catalog::RouteCatalog;
use config::Config;
use registry::VehicleRegistry;
use storage::ArrivalStore;

#[derive(OpenApi)]
#[openapi(
    info(title = "NextStop Live Bus API", version = "0.1.0"),
    paths(
        api::vehicles::update_location,
        api::vehicles::list_vehicles,
        api::vehicles::get_vehicle_status,
        api::routes::list_routes,
        api::routes::get_route,
        api::routes::get_route_stops,
        api::analytics::get_arrival_times,
        api::health::health_check,
    ),
    components(schemas(
        api::ErrorResponse,
        api::vehicles::LocationUpdate,
        api::vehicles::LocationUpdateResponse,
        api::vehicles::TrackedVehicle,
        api::vehicles::VehicleListResponse,
        api::vehicles::VehicleStatusResponse,
        api::vehicles::VehicleStatusNotFound,
        api::routes::RouteSummary,
        api::routes::RouteListResponse,
        api::routes::RouteStopsResponse,
        api::analytics::StopArrivalTime,
        api::analytics::ArrivalTimesResponse,
        api::health::HealthResponse,
        catalog::Route,
        catalog::Stop,
        registry::VehicleState,
    )),
    tags(
        (name = "vehicles", description = "Live vehicle tracking and ETA endpoints"),
        (name = "routes", description = "Route and stop catalog endpoints"),
        (name = "analytics", description = "Historical arrival analytics"),
        (name = "health", description = "Service health check")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info,sqlx=warn".into()),
        )
        .init();

    // Load config
    let config = Config::load("config.yaml").expect("Failed to load config");
    config.validate().expect("Invalid configuration");
    tracing::info!(routes = config.routes.len(), "Loaded configuration");

    // Build CORS layer based on config
    let cors_layer = if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode explicitly enabled (all origins allowed) - DO NOT USE IN PRODUCTION");
        CorsLayer::permissive()
    } else if !config.cors_origins.is_empty() {
        tracing::info!(origins = ?config.cors_origins, "CORS: Restricting to configured origins");
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    } else {
        panic!("CORS configuration error: Either set 'cors_origins' with allowed origins, or set 'cors_permissive: true' for development");
    };

    // Initialize SQLite database
    let cwd = std::env::current_dir().expect("Failed to get current directory");
    tracing::info!("Current working directory: {}", cwd.display());
    let db_path = cwd.join("database");
    if let Err(e) = std::fs::create_dir_all(&db_path) {
        tracing::warn!("Could not create database directory: {}", e);
    }
    let db_file = db_path.join("data.db");
    tracing::info!("Database path: {}, exists: {}", db_file.display(), db_file.exists());
    let db_url = format!("sqlite:{}?mode=rwc", db_file.display());
    let pool = SqlitePool::connect(&db_url)
        .await
        .expect("Failed to connect to SQLite database");

    // Run migrations
    let migrator = sqlx::migrate!("./migrations");
    tracing::info!(migrations = migrator.migrations.len(), "Found migrations");
    migrator
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Database migrations completed");

    // Build shared state
    let catalog = Arc::new(RouteCatalog::from_config(&config.routes));
    let registry = Arc::new(VehicleRegistry::new());
    let store = ArrivalStore::new(pool);
    tracing::info!(
        routes = catalog.route_count(),
        stops = catalog.stop_count(),
        "Route catalog ready"
    );

    // Build the app
    let app = Router::new()
        .route("/", get(root))
        .nest(
            "/api",
            api::router(
                catalog,
                registry,
                store,
                config.estimation.clone(),
                config.default_route_id.clone(),
            ),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind to port 3000");

    tracing::info!("Server running on http://localhost:3000");
    tracing::info!("Swagger UI: http://localhost:3000/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}

async fn root() -> &'static str {
    "NextStop Live Bus API"
}
