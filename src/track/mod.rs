//! Static track model: the rail path as an ordered polyline plus its fixed
//! points of interest, both precomputed at load time.

pub mod error;
pub mod geometry;
mod loader;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::TrackError;
pub use geometry::{haversine_distance, percent_to_distance, GeoPoint, TrackGeometry};

/// Kind of a fixed feature on the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiType {
    Generic,
    LevelCrossing,
    LesserLevelCrossing,
    Picnic,
    TrackEnd,
    TurningPoint,
}

/// A fixed feature on the track, placed by projection at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointOfInterest {
    pub poi_type: PoiType,
    pub name: Option<String>,
    pub position: GeoPoint,
    /// Progress along the track in `[0, 100]`.
    pub percentage_position: f64,
}

/// Initial map viewport carried by the track definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartConfiguration {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
}

/// A fully loaded track: geometry, POIs and display metadata.
///
/// Owned by the loading side and shared read-only with the trip engine.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub geometry: TrackGeometry,
    /// Sorted by percentage position.
    pub points_of_interest: Vec<PointOfInterest>,
    pub start: StartConfiguration,
}

impl Track {
    /// Load a track definition document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TrackError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        loader::from_json_str(&content)
    }

    /// Parse a track definition document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, TrackError> {
        loader::from_json_str(json)
    }
}
