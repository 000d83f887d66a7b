//! Environment-driven configuration.

use crate::aggregate::DEFAULT_ROLLING_WINDOW;
use crate::playback::BASE_INTERVAL_MS;

#[derive(Debug, Clone)]
pub struct Config {
    pub case_csv: String,
    pub features_json: Option<String>,
    pub base_interval_ms: u64,
    pub speed: f64,
    pub rolling_window: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            case_csv: std::env::var("CASE_CSV").unwrap_or_else(|_| "./us-counties.csv".to_string()),
            features_json: std::env::var("FEATURES_JSON").ok(),
            base_interval_ms: std::env::var("BASE_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(BASE_INTERVAL_MS),
            speed: std::env::var("SPEED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0),
            rolling_window: std::env::var("ROLLING_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ROLLING_WINDOW),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            case_csv: "./us-counties.csv".to_string(),
            features_json: None,
            base_interval_ms: BASE_INTERVAL_MS,
            speed: 1.0,
            rolling_window: DEFAULT_ROLLING_WINDOW,
        }
    }
}
