//! Synthetic vehicle feeder.
//!
//! Walks a configured route polyline and reports positions to a running
//! API instance, pausing briefly at stops the way a real bus would. Useful
//! for demos and for seeding arrival history during development.

use std::time::{Duration, Instant};

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "simulate")]
#[command(about = "Feeds synthetic bus positions to a NextStop API instance")]
struct Args {
    /// Path to the route configuration file
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Location ingestion endpoint
    #[arg(long, default_value = "http://localhost:3000/api/vehicles/location")]
    api_url: String,

    /// Route to simulate; the configured default when omitted
    #[arg(long)]
    route: Option<String>,

    /// Vehicle id to report as
    #[arg(long, default_value = "BUS-101")]
    vehicle_id: String,

    /// Milliseconds between position reports
    #[arg(long, default_value = "2000")]
    interval_ms: u64,
}

#[derive(Debug, Deserialize)]
struct SimConfig {
    default_route_id: String,
    routes: Vec<SimRoute>,
}

#[derive(Debug, Deserialize)]
struct SimRoute {
    id: String,
    path: Vec<[f64; 2]>,
    stops: Vec<SimStop>,
}

#[derive(Debug, Deserialize)]
struct SimStop {
    name: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
struct LocationReport<'a> {
    vehicle_id: &'a str,
    route_id: &'a str,
    lat: f64,
    lon: f64,
    speed_kmh: f64,
    status: &'a str,
    next_stop: &'a str,
}

/// Fraction of the current segment covered per tick.
const STEP_PER_TICK: f64 = 0.05;
/// Dwell time when the simulated bus reaches a stop.
const STOP_PAUSE: Duration = Duration::from_secs(5);
/// Radius within which the bus is considered to have reached a stop.
const STOP_RADIUS_METERS: f64 = 30.0;

fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * 6_371_000.0 * a.sqrt().asin()
}

struct Report {
    lat: f64,
    lon: f64,
    speed_kmh: f64,
    status: &'static str,
    next_stop: String,
}

struct Simulation<'a> {
    route: &'a SimRoute,
    segment: usize,
    progress: f64,
    paused_until: Option<Instant>,
    last_stop_name: String,
}

impl<'a> Simulation<'a> {
    fn new(route: &'a SimRoute) -> Self {
        Self {
            route,
            segment: 0,
            progress: 0.0,
            paused_until: None,
            last_stop_name: String::new(),
        }
    }

    fn closest_stop(&self, lat: f64, lon: f64) -> String {
        let mut best: Option<(&SimStop, f64)> = None;
        for stop in &self.route.stops {
            let dist = distance_meters(lat, lon, stop.lat, stop.lon);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((stop, dist)),
            }
        }
        match best {
            Some((stop, _)) => stop.name.clone(),
            None => "Unknown".to_string(),
        }
    }

    /// Advance one tick and produce the position to report.
    fn tick(&mut self) -> Report {
        if let Some(until) = self.paused_until {
            if Instant::now() < until {
                // Dwelling at a stop: keep reporting the segment start.
                let [lat, lon] = self.route.path[self.segment];
                return Report {
                    lat,
                    lon,
                    speed_kmh: 0.0,
                    status: "STOPPED",
                    next_stop: self.closest_stop(lat, lon),
                };
            }
            self.paused_until = None;
            info!("Resuming movement");
        }

        let start = self.route.path[self.segment];
        let end = self.route.path[(self.segment + 1) % self.route.path.len()];
        let lat = start[0] + (end[0] - start[0]) * self.progress;
        let lon = start[1] + (end[1] - start[1]) * self.progress;

        for stop in &self.route.stops {
            let dist = distance_meters(lat, lon, stop.lat, stop.lon);
            // Pause once per visit; last_stop_name keeps us from re-stopping
            // on the next tick while still inside the radius.
            if dist < STOP_RADIUS_METERS && self.last_stop_name != stop.name {
                info!(stop = %stop.name, "Stopping at stop");
                self.paused_until = Some(Instant::now() + STOP_PAUSE);
                self.last_stop_name = stop.name.clone();
                return Report {
                    lat: stop.lat,
                    lon: stop.lon,
                    speed_kmh: 0.0,
                    status: "STOPPED",
                    next_stop: stop.name.clone(),
                };
            }
        }

        // Slow down through the middle of each segment.
        let speed_kmh = if self.progress > 0.4 && self.progress < 0.6 {
            25.0
        } else {
            45.0
        };
        let next_stop = self.closest_stop(lat, lon);

        self.progress += STEP_PER_TICK;
        if self.progress >= 1.0 {
            self.progress = 0.0;
            self.segment = (self.segment + 1) % self.route.path.len();
        }

        Report {
            lat,
            lon,
            speed_kmh,
            status: "MOVING",
            next_stop,
        }
    }
}

async fn send(client: &reqwest::Client, url: &str, report: LocationReport<'_>) {
    match client.post(url).json(&report).send().await {
        Ok(resp) if resp.status().is_success() => {
            debug!(status = %resp.status(), lat = report.lat, lon = report.lon, "Reported position");
        }
        Ok(resp) => {
            warn!(status = %resp.status(), "API rejected position report");
        }
        Err(e) => {
            warn!(error = %e, "Failed to reach API");
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.config).expect("Failed to read config file");
    let config: SimConfig = serde_yaml::from_str(&raw).expect("Failed to parse config file");

    let route_id = args
        .route
        .clone()
        .unwrap_or_else(|| config.default_route_id.clone());
    let route = config
        .routes
        .iter()
        .find(|r| r.id == route_id)
        .unwrap_or_else(|| panic!("Route not found in config: {route_id}"));
    if route.path.len() < 2 {
        panic!("Route {route_id} needs at least two path vertices");
    }

    info!(
        vehicle_id = %args.vehicle_id,
        route_id = %route.id,
        vertices = route.path.len(),
        stops = route.stops.len(),
        "Starting bus simulation"
    );

    let client = reqwest::Client::new();
    let mut sim = Simulation::new(route);
    let mut interval = tokio::time::interval(Duration::from_millis(args.interval_ms));

    loop {
        interval.tick().await;
        let report = sim.tick();
        send(
            &client,
            &args.api_url,
            LocationReport {
                vehicle_id: &args.vehicle_id,
                route_id: &route.id,
                lat: report.lat,
                lon: report.lon,
                speed_kmh: report.speed_kmh,
                status: report.status,
                next_stop: &report.next_stop,
            },
        )
        .await;
    }
}
