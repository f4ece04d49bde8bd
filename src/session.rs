//! The trip session: a single run-to-completion event loop over feed
//! messages, GPS fixes and trip commands.
//!
//! All engine computation happens on this one task; every event is processed
//! fully before the next one, so no locking is needed anywhere in the core.
//! After every processed event a fresh snapshot is published for the UI
//! layer.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, warn};

use crate::feed::{FeedClient, PositionUpdate};
use crate::registry::{VehicleRegistry, VehicleState};
use crate::track::{GeoPoint, Track};
use crate::trip::{select_warning, ActiveWarning, TripEngine};

/// A fix from the device location service. Speed is km/h, heading degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub position: GeoPoint,
    pub speed_kmh: Option<f64>,
    pub heading: Option<f64>,
}

/// Everything the UI layer needs to render one frame, re-published after
/// every processed event.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TripSnapshot {
    pub trip: crate::trip::TripState,
    pub vehicles: Vec<VehicleState>,
    /// The single warning to surface, already prioritized.
    pub active_warning: Option<ActiveWarning>,
}

/// Trip lifecycle commands, delivered through the same event loop as the
/// position sources.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    StartTrip {
        vehicle_id: i64,
        label: Option<String>,
    },
    StopTrip,
    SetCurrentVehicle {
        vehicle_id: Option<i64>,
        label: Option<String>,
    },
}

/// Cloneable handle for feeding and observing a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands_tx: mpsc::Sender<SessionCommand>,
    gps_tx: mpsc::Sender<GpsFix>,
    snapshot_rx: watch::Receiver<TripSnapshot>,
}

impl SessionHandle {
    pub async fn start_trip(&self, vehicle_id: i64, label: Option<String>) {
        let _ = self
            .commands_tx
            .send(SessionCommand::StartTrip { vehicle_id, label })
            .await;
    }

    pub async fn stop_trip(&self) {
        let _ = self.commands_tx.send(SessionCommand::StopTrip).await;
    }

    pub async fn set_current_vehicle(&self, vehicle_id: Option<i64>, label: Option<String>) {
        let _ = self
            .commands_tx
            .send(SessionCommand::SetCurrentVehicle { vehicle_id, label })
            .await;
    }

    pub async fn send_gps_fix(&self, fix: GpsFix) {
        let _ = self.gps_tx.send(fix).await;
    }

    /// Watch the published snapshots.
    pub fn snapshots(&self) -> watch::Receiver<TripSnapshot> {
        self.snapshot_rx.clone()
    }
}

/// Owns the engine, the vehicle registry and the event sources for one
/// active trip screen.
pub struct TripSession {
    engine: TripEngine,
    registry: VehicleRegistry,
    updates_rx: broadcast::Receiver<PositionUpdate>,
    gps_rx: mpsc::Receiver<GpsFix>,
    commands_rx: mpsc::Receiver<SessionCommand>,
    snapshot_tx: watch::Sender<TripSnapshot>,
}

impl TripSession {
    pub fn new(track: Arc<Track>, feed: &FeedClient) -> (Self, SessionHandle) {
        let (commands_tx, commands_rx) = mpsc::channel(16);
        let (gps_tx, gps_rx) = mpsc::channel(64);
        let (snapshot_tx, snapshot_rx) = watch::channel(TripSnapshot::default());

        let session = Self {
            engine: TripEngine::new(track),
            registry: VehicleRegistry::new(),
            updates_rx: feed.subscribe(),
            gps_rx,
            commands_rx,
            snapshot_tx,
        };
        let handle = SessionHandle {
            commands_tx,
            gps_tx,
            snapshot_rx,
        };
        (session, handle)
    }

    /// Process events until the feed client goes away.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                result = self.updates_rx.recv() => match result {
                    Ok(update) => self.handle_feed_update(update),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Trip session lagged behind the position feed");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some(fix) = self.gps_rx.recv() => self.handle_gps_fix(fix),
                Some(command) = self.commands_rx.recv() => self.handle_command(command),
            }
        }
    }

    fn handle_feed_update(&mut self, update: PositionUpdate) {
        // Wire position is a 0–1 fraction.
        let percentage = update.position * 100.0;
        let previous = self.registry.query(update.vehicle).cloned();
        let heading_towards_user = self.derive_heading_towards_user(percentage, previous.as_ref());

        self.registry.upsert(VehicleState {
            id: update.vehicle,
            position: GeoPoint::new(
                update.latitude.unwrap_or(0.0),
                update.longitude.unwrap_or(0.0),
            ),
            percentage_position: percentage,
            heading: update.heading,
            heading_towards_user,
            label: update.label.clone(),
            last_updated: Utc::now(),
        });

        if self.engine.state().vehicle_id == Some(update.vehicle) {
            self.engine.record_motion(update.speed, update.heading);
            self.engine.record_position_sample(percentage, &self.registry);
        }

        self.publish();
    }

    fn handle_gps_fix(&mut self, fix: GpsFix) {
        debug!(
            lat = fix.position.lat,
            lng = fix.position.lng,
            speed_kmh = fix.speed_kmh,
            "GPS fix"
        );
        self.engine.record_motion(fix.speed_kmh, fix.heading);
        self.publish();
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::StartTrip { vehicle_id, label } => {
                self.engine.start(vehicle_id, label);
            }
            SessionCommand::StopTrip => self.engine.stop(),
            SessionCommand::SetCurrentVehicle { vehicle_id, label } => {
                self.engine.set_current_vehicle(vehicle_id, label);
            }
        }
        self.publish();
    }

    /// Whether a vehicle's movement trend points toward the user's current
    /// position. Unknown until the user's position and the vehicle's trend
    /// are both known; retained while a vehicle stands still.
    fn derive_heading_towards_user(
        &self,
        new_percentage: f64,
        previous: Option<&VehicleState>,
    ) -> Option<bool> {
        let own = self.engine.state().percentage_position?;
        let previous = previous?;
        if new_percentage == previous.percentage_position {
            return previous.heading_towards_user;
        }
        let increasing = new_percentage > previous.percentage_position;
        if own > new_percentage {
            Some(increasing)
        } else if own < new_percentage {
            Some(!increasing)
        } else {
            // Exactly alongside: the distance cannot shrink further.
            Some(false)
        }
    }

    fn publish(&self) {
        let trip = self.engine.state().clone();
        let active_warning = select_warning(&trip.warnings, trip.speed);
        self.snapshot_tx.send_replace(TripSnapshot {
            trip,
            vehicles: self.registry.all().to_vec(),
            active_warning,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{PoiType, PointOfInterest, StartConfiguration, TrackGeometry};

    fn test_track(pois: Vec<PointOfInterest>) -> Arc<Track> {
        let geometry = TrackGeometry::new(vec![
            GeoPoint::new(54.17, 10.55),
            GeoPoint::new(54.18, 10.55),
            GeoPoint::new(54.19, 10.55),
        ])
        .unwrap();
        Arc::new(Track {
            id: "test".into(),
            name: "Test".into(),
            geometry,
            points_of_interest: pois,
            start: StartConfiguration {
                latitude: 54.17,
                longitude: 10.55,
                zoom: 14.0,
            },
        })
    }

    fn crossing_at(percentage: f64) -> PointOfInterest {
        PointOfInterest {
            poi_type: PoiType::LevelCrossing,
            name: None,
            position: GeoPoint::new(54.18, 10.55),
            percentage_position: percentage,
        }
    }

    fn report(vehicle: i64, position: f64) -> PositionUpdate {
        PositionUpdate {
            timestamp: "2026-05-04T12:00:00Z".into(),
            vehicle,
            position,
            track: "test".into(),
            heading: None,
            speed: None,
            latitude: None,
            longitude: None,
            label: None,
            offtrack: None,
        }
    }

    fn new_session(track: Arc<Track>) -> (TripSession, SessionHandle, FeedClient) {
        let feed = FeedClient::new("ws://unused.invalid");
        let (session, handle) = TripSession::new(track, &feed);
        (session, handle, feed)
    }

    #[test]
    fn feed_updates_replace_registry_entries_by_id() {
        let (mut session, _handle, _feed) = new_session(test_track(vec![]));

        let mut first = report(3, 0.2);
        first.latitude = Some(54.1);
        first.longitude = Some(10.5);
        session.handle_feed_update(first);

        let mut second = report(3, 0.21);
        second.latitude = Some(54.2);
        second.longitude = Some(10.6);
        session.handle_feed_update(second);

        let state = session.registry.query(3).unwrap();
        assert_eq!(state.position, GeoPoint::new(54.2, 10.6));
        assert_eq!(session.registry.len(), 1);
    }

    #[test]
    fn missing_coordinates_fall_back_to_zero() {
        let (mut session, _handle, _feed) = new_session(test_track(vec![]));
        session.handle_feed_update(report(9, 0.4));
        let state = session.registry.query(9).unwrap();
        assert_eq!(state.position, GeoPoint::new(0.0, 0.0));
    }

    #[test]
    fn own_vehicle_reports_drive_the_engine() {
        let (mut session, _handle, _feed) = new_session(test_track(vec![]));
        session.handle_command(SessionCommand::StartTrip {
            vehicle_id: 7,
            label: Some("Draisine 7".into()),
        });

        let mut first = report(7, 0.40);
        first.speed = Some(12.0);
        session.handle_feed_update(first);
        session.handle_feed_update(report(7, 0.42));

        let snapshot = session.snapshot_tx.borrow().clone();
        assert_eq!(snapshot.trip.percentage_position, Some(42.0));
        assert_eq!(snapshot.trip.direction_increasing, Some(true));
        assert_eq!(snapshot.trip.speed, 12.0);
        assert!(snapshot.trip.distance_travelled > 0.0);
    }

    #[test]
    fn other_vehicle_reports_do_not_move_the_trip() {
        let (mut session, _handle, _feed) = new_session(test_track(vec![]));
        session.handle_command(SessionCommand::StartTrip {
            vehicle_id: 7,
            label: None,
        });
        session.handle_feed_update(report(3, 0.5));
        assert_eq!(session.engine.state().percentage_position, None);
        assert_eq!(session.engine.state().distance_travelled, 0.0);
    }

    #[test]
    fn heading_towards_user_is_derived_from_successive_reports() {
        let (mut session, _handle, _feed) = new_session(test_track(vec![]));
        session.handle_command(SessionCommand::StartTrip {
            vehicle_id: 7,
            label: None,
        });
        session.handle_feed_update(report(7, 0.40));

        // Approaching from ahead: 0.60 then 0.55.
        session.handle_feed_update(report(3, 0.60));
        assert_eq!(session.registry.query(3).unwrap().heading_towards_user, None);
        session.handle_feed_update(report(3, 0.55));
        assert_eq!(
            session.registry.query(3).unwrap().heading_towards_user,
            Some(true)
        );

        // Standing still keeps the known trend.
        session.handle_feed_update(report(3, 0.55));
        assert_eq!(
            session.registry.query(3).unwrap().heading_towards_user,
            Some(true)
        );

        // Moving away again flips it.
        session.handle_feed_update(report(3, 0.70));
        assert_eq!(
            session.registry.query(3).unwrap().heading_towards_user,
            Some(false)
        );
    }

    #[test]
    fn oncoming_warning_outranks_farther_crossing_at_speed() {
        let track = test_track(vec![]);
        let total = track.geometry.total_length();
        let own_pct = 40.0;
        let crossing_pct = own_pct + 150.0 / total * 100.0;
        let oncoming_start = own_pct + 130.0 / total * 100.0;
        let oncoming_pct = own_pct + 100.0 / total * 100.0;

        let track = test_track(vec![crossing_at(crossing_pct)]);
        let (mut session, _handle, _feed) = new_session(track);
        session.handle_command(SessionCommand::StartTrip {
            vehicle_id: 7,
            label: None,
        });

        // Two own samples at 20 km/h establish position and direction.
        let mut own = report(7, (own_pct - 1.0) / 100.0);
        own.speed = Some(20.0);
        session.handle_feed_update(own);
        // Oncoming vehicle ahead, trending toward the user.
        session.handle_feed_update(report(3, oncoming_start / 100.0));
        session.handle_feed_update(report(3, oncoming_pct / 100.0));
        let mut own = report(7, own_pct / 100.0);
        own.speed = Some(20.0);
        session.handle_feed_update(own);

        let snapshot = session.snapshot_tx.borrow().clone();
        match snapshot.active_warning {
            Some(ActiveWarning::OncomingVehicle { distance_m }) => {
                assert!((distance_m - 100.0).abs() < 1.0, "got {distance_m}");
            }
            other => panic!("expected oncoming warning, got {other:?}"),
        }

        // Same setup below the speed gate: the crossing wins.
        let mut slow = report(7, own_pct / 100.0);
        slow.speed = Some(5.0);
        session.handle_feed_update(slow);
        let snapshot = session.snapshot_tx.borrow().clone();
        match snapshot.active_warning {
            Some(ActiveWarning::LevelCrossing { distance_m }) => {
                assert!((distance_m - 150.0).abs() < 1.0, "got {distance_m}");
            }
            other => panic!("expected crossing warning, got {other:?}"),
        }
    }

    #[test]
    fn gps_fixes_update_motion_only() {
        let (mut session, _handle, _feed) = new_session(test_track(vec![]));
        session.handle_command(SessionCommand::StartTrip {
            vehicle_id: 7,
            label: None,
        });
        session.handle_gps_fix(GpsFix {
            position: GeoPoint::new(54.18, 10.55),
            speed_kmh: Some(16.0),
            heading: Some(270.0),
        });
        assert_eq!(session.engine.state().speed, 16.0);
        assert_eq!(session.engine.state().heading, 270.0);
        assert_eq!(session.engine.state().percentage_position, None);
    }

    #[test]
    fn stop_command_publishes_the_initial_trip_state() {
        let (mut session, _handle, _feed) = new_session(test_track(vec![]));
        session.handle_command(SessionCommand::StartTrip {
            vehicle_id: 7,
            label: Some("X".into()),
        });
        let mut own = report(7, 0.4);
        own.speed = Some(20.0);
        session.handle_feed_update(own);
        session.handle_feed_update(report(7, 0.45));

        session.handle_command(SessionCommand::StopTrip);
        let snapshot = session.snapshot_tx.borrow().clone();
        assert_eq!(snapshot.trip, crate::trip::TripState::default());
        assert_eq!(snapshot.active_warning, None);
        // The registry keeps its entries for the screen lifetime.
        assert_eq!(snapshot.vehicles.len(), 1);
    }

    #[tokio::test]
    async fn run_loop_processes_commands_and_publishes() {
        let (session, handle, _feed) = new_session(test_track(vec![]));
        let mut snapshots = handle.snapshots();
        tokio::spawn(session.run());

        handle.start_trip(7, Some("Draisine 7".into())).await;
        tokio::time::timeout(std::time::Duration::from_secs(5), snapshots.changed())
            .await
            .expect("no snapshot published")
            .unwrap();
        let snapshot = snapshots.borrow_and_update().clone();
        assert!(snapshot.trip.is_active);
        assert_eq!(snapshot.trip.vehicle_id, Some(7));
    }
}
