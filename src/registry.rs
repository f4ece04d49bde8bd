//! In-memory registry of the latest known state per vehicle.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::track::GeoPoint;

/// Latest known state of a tracked vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleState {
    pub id: i64,
    /// Raw coordinates. Defaults to (0, 0) when the report omitted them.
    pub position: GeoPoint,
    /// Progress along the track in `[0, 100]`.
    pub percentage_position: f64,
    /// Heading in degrees, when reported.
    pub heading: Option<f64>,
    /// Whether the vehicle is moving in the direction that would bring it
    /// toward the user. Derived from successive reports; `None` until a
    /// trend is known.
    pub heading_towards_user: Option<bool>,
    pub label: Option<String>,
    /// Arrival time of the report that produced this entry.
    pub last_updated: DateTime<Utc>,
}

/// Mapping from vehicle id to its latest state, insertion-ordered.
///
/// The most recently processed report for an id always wins (replace-by-id,
/// not a field merge); there is no timestamp reconciliation, so processing
/// order is arrival order. Entries are never evicted — they live for the
/// lifetime of the trip screen.
#[derive(Debug, Default)]
pub struct VehicleRegistry {
    vehicles: Vec<VehicleState>,
}

impl VehicleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert on first sighting, otherwise overwrite the whole entry.
    pub fn upsert(&mut self, state: VehicleState) {
        match self.vehicles.iter_mut().find(|v| v.id == state.id) {
            Some(existing) => *existing = state,
            None => self.vehicles.push(state),
        }
    }

    pub fn query(&self, id: i64) -> Option<&VehicleState> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    /// All known vehicles in insertion order.
    pub fn all(&self) -> &[VehicleState] {
        &self.vehicles
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}
