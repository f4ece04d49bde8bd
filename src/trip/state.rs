use serde::Serialize;

/// Derived warning distances in meters, `None` when no candidate exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WarningDistances {
    /// Closest other vehicle, either direction.
    pub next_vehicle: Option<f64>,
    /// Closest vehicle flagged as heading toward the user.
    pub next_vehicle_heading_towards: Option<f64>,
    /// Closest level crossing in the direction of travel.
    pub next_level_crossing: Option<f64>,
}

/// The engine's session data. `Default` is the documented initial
/// configuration; stopping a trip restores it in full — a partial reset is
/// not permitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripState {
    pub is_active: bool,
    /// The vehicle the user has claimed for this trip.
    pub vehicle_id: Option<i64>,
    pub vehicle_label: Option<String>,
    /// Distance travelled in meters. Monotonically non-decreasing for the
    /// session — distance travelled, not net displacement.
    pub distance_travelled: f64,
    /// Current speed in km/h.
    pub speed: f64,
    /// Current heading in degrees.
    pub heading: f64,
    /// Latest percentage-position sample, `[0, 100]`.
    pub percentage_position: Option<f64>,
    /// The sample before the latest one.
    pub last_percentage_position: Option<f64>,
    /// Direction of travel. Sticky: retains its last known value while
    /// consecutive samples are equal.
    pub direction_increasing: Option<bool>,
    pub warnings: WarningDistances,
}
