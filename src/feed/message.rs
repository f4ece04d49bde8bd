use serde::{Deserialize, Serialize};

/// A single vehicle position report from the positioning service.
///
/// Everything beyond the first four fields is optional on the wire; trackers
/// without a GPS fix omit the raw coordinates entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    /// Report time as an RFC 3339 string. Kept verbatim; processing order is
    /// arrival order, not report order.
    pub timestamp: String,
    /// Vehicle id. Positive ids are assigned vehicles, negative ids are
    /// trackers without an assignment.
    pub vehicle: i64,
    /// Relative position along the track, `0.0..=1.0`.
    pub position: f64,
    /// Track id the position refers to.
    pub track: String,
    /// Heading in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    /// Speed in km/h.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// True when the vehicle is reported off the track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offtrack: Option<bool>,
}
