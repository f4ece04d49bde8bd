use serde::{Deserialize, Serialize};

use super::error::TrackError;

/// Mean Earth radius in meters, as used by the positioning service.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance between two points in meters (haversine formula).
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Convert a percentage delta along a track into meters.
pub fn percent_to_distance(track_length_m: f64, percentage_delta: f64) -> f64 {
    track_length_m * percentage_delta / 100.0
}

/// The rail path as an ordered polyline with cumulative-distance lookup.
///
/// Built once at load time and never mutated. The cumulative distances run
/// parallel to the points (`cumulative[0] == 0`, monotonically non-decreasing)
/// so any point on a segment maps to a distance from the track start, and from
/// there to a percentage position.
#[derive(Debug, Clone)]
pub struct TrackGeometry {
    points: Vec<GeoPoint>,
    cumulative: Vec<f64>,
    total_length: f64,
}

impl TrackGeometry {
    /// Build the geometry from an ordered point list (insertion order = path
    /// order). Fails when fewer than two points are given or when all points
    /// coincide, so every constructed geometry has a positive length and
    /// [`project`](Self::project) always yields a finite percentage.
    pub fn new(points: Vec<GeoPoint>) -> Result<Self, TrackError> {
        if points.len() < 2 {
            return Err(TrackError::TooFewPoints(points.len()));
        }

        let mut cumulative = Vec::with_capacity(points.len());
        cumulative.push(0.0);
        let mut total_length = 0.0;
        for i in 1..points.len() {
            total_length += haversine_distance(points[i - 1], points[i]);
            cumulative.push(total_length);
        }
        if total_length == 0.0 {
            return Err(TrackError::ZeroLengthTrack);
        }

        Ok(Self {
            points,
            cumulative,
            total_length,
        })
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Total track length in meters.
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Project a point onto the track and return its percentage position
    /// in `[0, 100]`.
    ///
    /// Scans every segment, projects the point onto it (clamped to the
    /// segment, not the infinite line) and keeps the segment with the minimum
    /// great-circle distance. Exact ties go to the first segment in scan
    /// order. O(n) over the segment count, which is fine at this track's
    /// scale.
    pub fn project(&self, point: GeoPoint) -> f64 {
        let mut best_distance = f64::INFINITY;
        let mut best_along = 0.0;

        for i in 0..self.points.len() - 1 {
            let a = self.points[i];
            let b = self.points[i + 1];

            // Parametric projection in coordinate space, clamped to [0, 1].
            let dx = b.lng - a.lng;
            let dy = b.lat - a.lat;
            let len_sq = dx * dx + dy * dy;
            let t = if len_sq > 0.0 {
                (((point.lng - a.lng) * dx + (point.lat - a.lat) * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };

            let projected = GeoPoint::new(a.lat + t * dy, a.lng + t * dx);
            let distance = haversine_distance(point, projected);
            if distance < best_distance {
                best_distance = distance;
                best_along = self.cumulative[i] + haversine_distance(a, projected);
            }
        }

        best_along / self.total_length * 100.0
    }
}
