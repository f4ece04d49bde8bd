//! Warning thresholds and the single-banner selection rule.

use serde::Serialize;

use super::state::WarningDistances;

/// An oncoming vehicle warns at this distance or less.
pub const ONCOMING_VEHICLE_WARNING_DISTANCE_M: f64 = 200.0;
/// Any nearby vehicle warns at this distance or less, regardless of heading.
pub const NEARBY_VEHICLE_WARNING_DISTANCE_M: f64 = 10.0;
/// An upcoming level crossing warns at this distance or less.
pub const LEVEL_CROSSING_WARNING_DISTANCE_M: f64 = 200.0;
/// Vehicle warnings are suppressed below this speed to avoid false alarms
/// while parked next to another vehicle. Crossing warnings are not gated.
pub const MIN_SPEED_FOR_VEHICLE_WARNING_KMH: f64 = 10.0;

/// The one warning surfaced for the current evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActiveWarning {
    OncomingVehicle { distance_m: f64 },
    LevelCrossing { distance_m: f64 },
    NearbyVehicle { distance_m: f64 },
}

/// Pick at most one warning from the derived distances.
///
/// With both an oncoming vehicle and a crossing in range of consideration,
/// the oncoming vehicle takes priority only when it is strictly closer than
/// the crossing and the speed gate is satisfied; otherwise the crossing is
/// shown if within its threshold. Single candidates are evaluated against
/// their own threshold and gate. Failing all of that, the plain
/// nearby-vehicle check runs last. No queuing or stacking.
pub fn select_warning(warnings: &WarningDistances, speed_kmh: f64) -> Option<ActiveWarning> {
    let is_moving = speed_kmh >= MIN_SPEED_FOR_VEHICLE_WARNING_KMH;

    match (warnings.next_vehicle_heading_towards, warnings.next_level_crossing) {
        (Some(oncoming), Some(crossing)) => {
            if is_moving && oncoming <= ONCOMING_VEHICLE_WARNING_DISTANCE_M && oncoming < crossing {
                return Some(ActiveWarning::OncomingVehicle {
                    distance_m: oncoming,
                });
            }
            if crossing <= LEVEL_CROSSING_WARNING_DISTANCE_M {
                return Some(ActiveWarning::LevelCrossing {
                    distance_m: crossing,
                });
            }
        }
        (Some(oncoming), None) => {
            if is_moving && oncoming <= ONCOMING_VEHICLE_WARNING_DISTANCE_M {
                return Some(ActiveWarning::OncomingVehicle {
                    distance_m: oncoming,
                });
            }
        }
        (None, Some(crossing)) => {
            if crossing <= LEVEL_CROSSING_WARNING_DISTANCE_M {
                return Some(ActiveWarning::LevelCrossing {
                    distance_m: crossing,
                });
            }
        }
        (None, None) => {}
    }

    match warnings.next_vehicle {
        Some(nearby) if is_moving && nearby <= NEARBY_VEHICLE_WARNING_DISTANCE_M => {
            Some(ActiveWarning::NearbyVehicle { distance_m: nearby })
        }
        _ => None,
    }
}
