//! Display formatting helpers for readouts.

/// Format a distance in meters: plain meters below one kilometer, tenths of
/// a kilometer above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.round() as i64)
    } else {
        format!("{} km", (meters / 100.0).round() / 10.0)
    }
}

/// Round a speed for display; values below 1 km/h show as 0.
pub fn format_speed(kmh: f64) -> i64 {
    if kmh < 1.0 {
        0
    } else {
        kmh.round() as i64
    }
}
