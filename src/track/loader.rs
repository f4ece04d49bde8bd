//! Parsing of the static track definition document.
//!
//! The document carries an ordered `[lng, lat]` coordinate list describing
//! the path plus a marker list with string type tags. It is loaded once at
//! process start and never re-fetched.

use serde::Deserialize;

use super::error::TrackError;
use super::geometry::{GeoPoint, TrackGeometry};
use super::{PoiType, PointOfInterest, StartConfiguration, Track};

#[derive(Debug, Deserialize)]
struct TrackDocument {
    id: String,
    name: String,
    map: MapSection,
    tracks: Vec<TrackEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapSection {
    start_configuration: StartConfiguration,
}

#[derive(Debug, Deserialize)]
struct TrackEntry {
    data: LineString,
    markers: MarkerSection,
}

#[derive(Debug, Deserialize)]
struct LineString {
    /// `[lng, lat]` pairs, insertion order = path order.
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct MarkerSection {
    data: Vec<Marker>,
}

#[derive(Debug, Deserialize)]
struct Marker {
    name: String,
    #[serde(rename = "type")]
    marker_type: String,
    position: MarkerPosition,
    #[serde(default)]
    extra: Option<MarkerExtra>,
}

#[derive(Debug, Deserialize)]
struct MarkerPosition {
    coordinates: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkerExtra {
    #[serde(default)]
    is_turning_point: Option<bool>,
}

impl Marker {
    fn poi_type(&self) -> PoiType {
        if let Some(extra) = &self.extra {
            if extra.is_turning_point == Some(true) {
                return PoiType::TurningPoint;
            }
        }
        match self.marker_type.as_str() {
            "crossing" => PoiType::LevelCrossing,
            "minor-crossing" => PoiType::LesserLevelCrossing,
            "picnic" => PoiType::Picnic,
            "end-of-the-line" => PoiType::TrackEnd,
            // "halt", "generic" and anything unrecognized
            _ => PoiType::Generic,
        }
    }
}

/// Parse a track definition document into a [`Track`].
///
/// Uses the first entry of the document's track list, computes cumulative
/// distances, projects every marker onto the polyline, and sorts the
/// resulting POIs by percentage position.
pub fn from_json_str(json: &str) -> Result<Track, TrackError> {
    let document: TrackDocument = serde_json::from_str(json)?;
    let entry = document
        .tracks
        .into_iter()
        .next()
        .ok_or(TrackError::EmptyTrackList)?;

    let points = entry
        .data
        .coordinates
        .iter()
        .map(|&[lng, lat]| GeoPoint::new(lat, lng))
        .collect();
    let geometry = TrackGeometry::new(points)?;

    let mut points_of_interest: Vec<PointOfInterest> = entry
        .markers
        .data
        .iter()
        .map(|marker| {
            let [lng, lat] = marker.position.coordinates;
            let position = GeoPoint::new(lat, lng);
            PointOfInterest {
                poi_type: marker.poi_type(),
                name: Some(marker.name.clone()),
                position,
                percentage_position: geometry.project(position),
            }
        })
        .collect();
    points_of_interest
        .sort_by(|a, b| a.percentage_position.total_cmp(&b.percentage_position));

    Ok(Track {
        id: document.id,
        name: document.name,
        geometry,
        points_of_interest,
        start: document.map.start_configuration,
    })
}
