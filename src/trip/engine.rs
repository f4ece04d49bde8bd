//! The stateful trip engine: consumes percentage-position samples and motion
//! readings, maintains [`TripState`] across updates, and derives the warning
//! distances from the vehicle registry and the track's POIs.

use std::sync::Arc;

use crate::registry::VehicleRegistry;
use crate::track::{percent_to_distance, PoiType, Track};

use super::search;
use super::state::{TripState, WarningDistances};

pub struct TripEngine {
    track: Arc<Track>,
    state: TripState,
}

impl TripEngine {
    pub fn new(track: Arc<Track>) -> Self {
        Self {
            track,
            state: TripState::default(),
        }
    }

    pub fn state(&self) -> &TripState {
        &self.state
    }

    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    /// Claim a vehicle and activate the trip. Accumulated state is kept —
    /// resuming reuses prior distance unless the trip is explicitly reset.
    pub fn start(&mut self, vehicle_id: i64, label: Option<String>) {
        self.state.vehicle_id = Some(vehicle_id);
        self.state.vehicle_label = label;
        self.state.is_active = true;
    }

    /// End the trip and restore the entire state to its initial
    /// configuration in one step.
    pub fn stop(&mut self) {
        self.state = TripState::default();
    }

    pub fn reset(&mut self) {
        self.stop();
    }

    /// Reassign which vehicle counts as the user's own, mid-trip, without
    /// stopping the trip or resetting distance and warnings.
    pub fn set_current_vehicle(&mut self, vehicle_id: Option<i64>, label: Option<String>) {
        self.state.vehicle_id = vehicle_id;
        self.state.vehicle_label = label;
    }

    /// Update speed (km/h) and heading (degrees) from whichever source
    /// reported them last.
    pub fn record_motion(&mut self, speed_kmh: Option<f64>, heading: Option<f64>) {
        if let Some(speed) = speed_kmh {
            self.state.speed = speed;
        }
        if let Some(heading) = heading {
            self.state.heading = heading;
        }
    }

    /// Feed a new percentage-position sample.
    ///
    /// Infers the direction of travel (sticky: only updated when consecutive
    /// samples differ), and while the trip is active accumulates the absolute
    /// distance delta and re-derives the warning distances against the
    /// registry. A sample of exactly zero is a real sample, not an absent
    /// one.
    pub fn record_position_sample(&mut self, percentage: f64, registry: &VehicleRegistry) {
        let previous = self.state.percentage_position;
        self.state.last_percentage_position = previous;
        self.state.percentage_position = Some(percentage);

        if let Some(prev) = previous {
            if prev != percentage {
                self.state.direction_increasing = Some(percentage > prev);
            }
        }

        if !self.state.is_active {
            return;
        }

        if let Some(prev) = previous {
            let delta = (percentage - prev).abs();
            self.state.distance_travelled +=
                percent_to_distance(self.track.geometry.total_length(), delta);
        }

        self.state.warnings = self.derive_warnings(percentage, registry);
    }

    /// Pure derivation of the three warning distances for a position.
    fn derive_warnings(&self, current: f64, registry: &VehicleRegistry) -> WarningDistances {
        let total_length = self.track.geometry.total_length();
        let direction = self.state.direction_increasing;
        let own_id = self.state.vehicle_id;
        let to_meters =
            |candidate_pct: f64| percent_to_distance(total_length, (candidate_pct - current).abs());

        let next_level_crossing = search::next_poi_of_type(
            &self.track.points_of_interest,
            Some(current),
            PoiType::LevelCrossing,
            direction,
        )
        .map(|poi| to_meters(poi.percentage_position));

        // Closest other vehicle in either direction, regardless of heading.
        let next_vehicle = search::next_vehicle(registry.all(), Some(current), None, None, own_id)
            .map(|v| to_meters(v.percentage_position));

        let next_vehicle_heading_towards =
            search::next_vehicle(registry.all(), Some(current), direction, Some(true), own_id)
                .map(|v| to_meters(v.percentage_position));

        WarningDistances {
            next_vehicle,
            next_vehicle_heading_towards,
            next_level_crossing,
        }
    }
}
