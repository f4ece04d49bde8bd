//! Nearest-candidate searches along the track, measured in percentage
//! positions.
//!
//! Both searches share the same directional rules: with a known direction of
//! travel only candidates on that side of the current position survive; with
//! an unknown direction both sides are searched. Among survivors the closest
//! by absolute percentage distance wins, and the first minimal candidate in
//! scan order takes exact ties.

use crate::registry::VehicleState;
use crate::track::{PoiType, PointOfInterest};

fn is_ahead(candidate: f64, current: f64, direction_increasing: Option<bool>) -> bool {
    match direction_increasing {
        Some(true) => candidate >= current,
        Some(false) => candidate <= current,
        None => true,
    }
}

/// Find the next POI of the given type from the current position.
///
/// Returns `None` when the current position is unknown or no POI survives
/// the filters.
pub fn next_poi_of_type(
    pois: &[PointOfInterest],
    current: Option<f64>,
    poi_type: PoiType,
    direction_increasing: Option<bool>,
) -> Option<&PointOfInterest> {
    let current = current?;
    let mut best: Option<&PointOfInterest> = None;
    let mut best_distance = f64::INFINITY;

    for poi in pois.iter().filter(|poi| poi.poi_type == poi_type) {
        if !is_ahead(poi.percentage_position, current, direction_increasing) {
            continue;
        }
        let distance = (poi.percentage_position - current).abs();
        if distance < best_distance {
            best_distance = distance;
            best = Some(poi);
        }
    }
    best
}

/// Find the next vehicle from the current position.
///
/// The user's own vehicle is excluded via `exclude_vehicle_id`. With
/// `heading_towards_user` set, only vehicles whose derived flag matches
/// survive — an unknown flag never matches.
pub fn next_vehicle(
    vehicles: &[VehicleState],
    current: Option<f64>,
    direction_increasing: Option<bool>,
    heading_towards_user: Option<bool>,
    exclude_vehicle_id: Option<i64>,
) -> Option<&VehicleState> {
    let current = current?;
    let mut best: Option<&VehicleState> = None;
    let mut best_distance = f64::INFINITY;

    for vehicle in vehicles {
        if Some(vehicle.id) == exclude_vehicle_id {
            continue;
        }
        if let Some(wanted) = heading_towards_user {
            if vehicle.heading_towards_user != Some(wanted) {
                continue;
            }
        }
        if !is_ahead(vehicle.percentage_position, current, direction_increasing) {
            continue;
        }
        let distance = (vehicle.percentage_position - current).abs();
        if distance < best_distance {
            best_distance = distance;
            best = Some(vehicle);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::GeoPoint;
    use chrono::Utc;

    fn poi(poi_type: PoiType, percentage: f64) -> PointOfInterest {
        PointOfInterest {
            poi_type,
            name: None,
            position: GeoPoint::new(54.2, 10.55),
            percentage_position: percentage,
        }
    }

    fn vehicle(id: i64, percentage: f64) -> VehicleState {
        VehicleState {
            id,
            position: GeoPoint::new(54.2, 10.55),
            percentage_position: percentage,
            heading: None,
            heading_towards_user: None,
            label: None,
            last_updated: Utc::now(),
        }
    }

    fn oncoming(id: i64, percentage: f64) -> VehicleState {
        VehicleState {
            heading_towards_user: Some(true),
            ..vehicle(id, percentage)
        }
    }

    #[test]
    fn poi_search_respects_direction() {
        let pois = vec![
            poi(PoiType::LevelCrossing, 20.0),
            poi(PoiType::LevelCrossing, 60.0),
        ];
        let ahead = next_poi_of_type(&pois, Some(40.0), PoiType::LevelCrossing, Some(true));
        assert_eq!(ahead.unwrap().percentage_position, 60.0);
        let behind = next_poi_of_type(&pois, Some(40.0), PoiType::LevelCrossing, Some(false));
        assert_eq!(behind.unwrap().percentage_position, 20.0);
    }

    #[test]
    fn poi_search_with_unknown_direction_looks_both_ways() {
        let pois = vec![
            poi(PoiType::LevelCrossing, 35.0),
            poi(PoiType::LevelCrossing, 60.0),
        ];
        let closest = next_poi_of_type(&pois, Some(40.0), PoiType::LevelCrossing, None);
        assert_eq!(closest.unwrap().percentage_position, 35.0);
    }

    #[test]
    fn poi_search_filters_by_type() {
        let pois = vec![
            poi(PoiType::Picnic, 41.0),
            poi(PoiType::LevelCrossing, 60.0),
        ];
        let found = next_poi_of_type(&pois, Some(40.0), PoiType::LevelCrossing, Some(true));
        assert_eq!(found.unwrap().percentage_position, 60.0);
    }

    #[test]
    fn poi_search_without_position_or_survivors() {
        let pois = vec![poi(PoiType::LevelCrossing, 20.0)];
        assert!(next_poi_of_type(&pois, None, PoiType::LevelCrossing, Some(true)).is_none());
        assert!(next_poi_of_type(&pois, Some(40.0), PoiType::LevelCrossing, Some(true)).is_none());
        assert!(next_poi_of_type(&[], Some(40.0), PoiType::LevelCrossing, None).is_none());
    }

    #[test]
    fn poi_ties_go_to_the_first_candidate_in_scan_order() {
        let mut first = poi(PoiType::LevelCrossing, 50.0);
        first.name = Some("first".into());
        let mut second = poi(PoiType::LevelCrossing, 30.0);
        second.name = Some("second".into());
        // Both 10 percentage points away from 40.
        let pois = [first, second];
        let found = next_poi_of_type(&pois, Some(40.0), PoiType::LevelCrossing, None);
        assert_eq!(found.unwrap().name.as_deref(), Some("first"));
    }

    #[test]
    fn own_vehicle_is_never_returned() {
        let vehicles = vec![vehicle(5, 41.0), vehicle(6, 70.0)];
        let found = next_vehicle(&vehicles, Some(40.0), None, None, Some(5));
        assert_eq!(found.unwrap().id, 6);
        // Even when it is the only vehicle.
        let only_own = vec![vehicle(5, 41.0)];
        assert!(next_vehicle(&only_own, Some(40.0), None, None, Some(5)).is_none());
    }

    #[test]
    fn vehicle_search_with_unknown_direction_returns_closest_either_side() {
        let vehicles = vec![vehicle(1, 10.0), vehicle(2, 45.0), vehicle(3, 80.0)];
        let found = next_vehicle(&vehicles, Some(40.0), None, None, None);
        assert_eq!(found.unwrap().id, 2);
    }

    #[test]
    fn vehicle_search_heading_towards_filter() {
        let vehicles = vec![vehicle(1, 45.0), oncoming(2, 60.0)];
        let found = next_vehicle(&vehicles, Some(40.0), Some(true), Some(true), None);
        assert_eq!(found.unwrap().id, 2);
        // Unknown flag never matches the filter.
        let unknown_only = vec![vehicle(1, 45.0)];
        assert!(next_vehicle(&unknown_only, Some(40.0), Some(true), Some(true), None).is_none());
    }

    #[test]
    fn vehicle_search_directional_filter() {
        let vehicles = vec![vehicle(1, 30.0), vehicle(2, 55.0)];
        let increasing = next_vehicle(&vehicles, Some(40.0), Some(true), None, None);
        assert_eq!(increasing.unwrap().id, 2);
        let decreasing = next_vehicle(&vehicles, Some(40.0), Some(false), None, None);
        assert_eq!(decreasing.unwrap().id, 1);
    }
}
