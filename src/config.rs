use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub track: TrackConfig,
    /// When set, the monitor binary starts a trip with this vehicle.
    #[serde(default)]
    pub vehicle: Option<VehicleConfig>,
}

/// Live position feed endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// WebSocket URL of the position-updates endpoint.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackConfig {
    /// Path to the track definition document.
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleConfig {
    pub id: i64,
    #[serde(default)]
    pub label: Option<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}
