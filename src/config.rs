use chrono::NaiveTime;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub routes: Vec<RouteConfig>,
    /// Route used when an ingestion payload or analytics query omits one
    pub default_route_id: String,
    /// Allowed CORS origins. Required unless cors_permissive is true.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Explicitly allow all origins (development only). Defaults to false.
    #[serde(default)]
    pub cors_permissive: bool,
    /// ETA estimation tuning
    #[serde(default)]
    pub estimation: EstimationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub id: String,
    pub name: String,
    /// Route polyline as [lat, lon] vertices in travel order
    pub path: Vec<[f64; 2]>,
    pub stops: Vec<StopConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopConfig {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Tuning knobs for ETA estimation and arrival recording
#[derive(Debug, Clone, Deserialize)]
pub struct EstimationConfig {
    /// Speed reports at or below this are treated as unreliable (km/h, default: 5)
    #[serde(default = "EstimationConfig::default_min_live_speed_kmh")]
    pub min_live_speed_kmh: f64,
    /// Substitute speed applied to unreliable reports (km/h, default: 30)
    #[serde(default = "EstimationConfig::default_fallback_speed_kmh")]
    pub fallback_speed_kmh: f64,
    /// Rolling window of arrival history considered (default: 15 days)
    #[serde(default = "EstimationConfig::default_history_window_days")]
    pub history_window_days: i64,
    /// End-to-end trip duration historical averages are normalized to (default: 90)
    #[serde(default = "EstimationConfig::default_canonical_trip_minutes")]
    pub canonical_trip_minutes: f64,
    /// Elapsed-minute samples at or above this are discarded as implausible (default: 120)
    #[serde(default = "EstimationConfig::default_max_plausible_elapsed_minutes")]
    pub max_plausible_elapsed_minutes: f64,
    /// Distance within which a vehicle counts as arrived at a stop (meters, default: 50)
    #[serde(default = "EstimationConfig::default_arrival_radius_meters")]
    pub arrival_radius_meters: f64,
    /// Minimum gap between recorded arrivals of one vehicle at one stop (default: 2 minutes)
    #[serde(default = "EstimationConfig::default_arrival_debounce_minutes")]
    pub arrival_debounce_minutes: i64,
    /// Local wall-clock time the canonical first trip departs, "HH:MM" (default: "07:30")
    #[serde(default = "EstimationConfig::default_trip_start_time")]
    pub trip_start_time: String,
    /// IANA timezone arrival clock times are rendered in (default: "Asia/Karachi")
    #[serde(default = "EstimationConfig::default_timezone")]
    pub timezone: String,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            min_live_speed_kmh: Self::default_min_live_speed_kmh(),
            fallback_speed_kmh: Self::default_fallback_speed_kmh(),
            history_window_days: Self::default_history_window_days(),
            canonical_trip_minutes: Self::default_canonical_trip_minutes(),
            max_plausible_elapsed_minutes: Self::default_max_plausible_elapsed_minutes(),
            arrival_radius_meters: Self::default_arrival_radius_meters(),
            arrival_debounce_minutes: Self::default_arrival_debounce_minutes(),
            trip_start_time: Self::default_trip_start_time(),
            timezone: Self::default_timezone(),
        }
    }
}

impl EstimationConfig {
    fn default_min_live_speed_kmh() -> f64 {
        5.0
    }
    fn default_fallback_speed_kmh() -> f64 {
        30.0
    }
    fn default_history_window_days() -> i64 {
        15
    }
    fn default_canonical_trip_minutes() -> f64 {
        90.0
    }
    fn default_max_plausible_elapsed_minutes() -> f64 {
        120.0
    }
    fn default_arrival_radius_meters() -> f64 {
        50.0
    }
    fn default_arrival_debounce_minutes() -> i64 {
        2
    }
    fn default_trip_start_time() -> String {
        "07:30".to_string()
    }
    fn default_timezone() -> String {
        "Asia/Karachi".to_string()
    }

    pub fn parsed_timezone(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::Asia::Karachi)
    }

    pub fn trip_start(&self) -> NaiveTime {
        NaiveTime::parse_from_str(&self.trip_start_time, "%H:%M")
            .unwrap_or_else(|_| NaiveTime::from_hms_opt(7, 30, 0).unwrap_or_default())
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Reject configurations the service cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.routes.is_empty() {
            return Err(ConfigError::Invalid("at least one route is required".into()));
        }
        if !self.routes.iter().any(|r| r.id == self.default_route_id) {
            return Err(ConfigError::Invalid(format!(
                "default_route_id '{}' does not match any configured route",
                self.default_route_id
            )));
        }
        for route in &self.routes {
            let mut seen = std::collections::HashSet::new();
            for stop in &route.stops {
                if !seen.insert(stop.id.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "route '{}' has duplicate stop id '{}'",
                        route.id, stop.id
                    )));
                }
            }
        }
        if self.estimation.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "unknown timezone '{}'",
                self.estimation.timezone
            )));
        }
        if NaiveTime::parse_from_str(&self.estimation.trip_start_time, "%H:%M").is_err() {
            return Err(ConfigError::Invalid(format!(
                "trip_start_time '{}' is not HH:MM",
                self.estimation.trip_start_time
            )));
        }
        if self.estimation.fallback_speed_kmh <= 0.0 {
            return Err(ConfigError::Invalid(
                "fallback_speed_kmh must be positive".into(),
            ));
        }
        if self.estimation.canonical_trip_minutes <= 0.0 {
            return Err(ConfigError::Invalid(
                "canonical_trip_minutes must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
default_route_id: route-1
cors_permissive: true
routes:
  - id: route-1
    name: Test Route
    path:
      - [0.0, 0.0]
      - [0.0, 0.01]
    stops:
      - id: stop-1
        name: First
        lat: 0.0
        lon: 0.0
"#
    }

    #[test]
    fn minimal_config_gets_estimation_defaults() {
        let config: Config = serde_yaml::from_str(minimal_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.estimation.arrival_radius_meters, 50.0);
        assert_eq!(config.estimation.arrival_debounce_minutes, 2);
        assert_eq!(config.estimation.history_window_days, 15);
        assert_eq!(config.estimation.canonical_trip_minutes, 90.0);
        assert_eq!(config.estimation.trip_start(), NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    }

    #[test]
    fn unknown_default_route_fails_validation() {
        let mut config: Config = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.default_route_id = "route-9".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn duplicate_stop_ids_fail_validation() {
        let mut config: Config = serde_yaml::from_str(minimal_yaml()).unwrap();
        let duplicate = config.routes[0].stops[0].clone();
        config.routes[0].stops.push(duplicate);
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_timezone_fails_validation() {
        let mut config: Config = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.estimation.timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_trip_start_falls_back_to_default() {
        let estimation = EstimationConfig {
            trip_start_time: "late morning".to_string(),
            ..EstimationConfig::default()
        };
        assert_eq!(estimation.trip_start(), NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    }
}
