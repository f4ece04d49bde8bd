//! Headless trip monitor: connects to the live position feed, runs a trip
//! session against the configured track and logs derived state.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use railtrail_core::config::Config;
use railtrail_core::feed::FeedClient;
use railtrail_core::session::TripSession;
use railtrail_core::track::Track;
use railtrail_core::util::{format_distance, format_speed};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tokio_tungstenite=warn,tungstenite=warn".into()),
        )
        .init();

    // Load config
    let config = Config::load("config.yaml").expect("Failed to load config");

    // Load the static track definition
    let track = Arc::new(Track::load(&config.track.file).expect("Failed to load track definition"));
    tracing::info!(
        track = %track.name,
        length_m = track.geometry.total_length().round(),
        pois = track.points_of_interest.len(),
        "Loaded track"
    );

    // Feed client and session
    let feed = FeedClient::new(config.feed.url.clone());
    let (session, handle) = TripSession::new(track, &feed);
    tokio::spawn(session.run());
    feed.connect();

    if let Some(vehicle) = &config.vehicle {
        handle.start_trip(vehicle.id, vehicle.label.clone()).await;
        tracing::info!(vehicle = vehicle.id, "Trip started");
    }

    // Log snapshots until ctrl-c
    let mut snapshots = handle.snapshots();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                tracing::info!(
                    vehicles = snapshot.vehicles.len(),
                    distance = %format_distance(snapshot.trip.distance_travelled),
                    speed_kmh = format_speed(snapshot.trip.speed),
                    "Trip state updated"
                );
                if let Some(warning) = &snapshot.active_warning {
                    tracing::warn!(warning = ?warning, "Warning active");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                feed.disconnect().await;
                break;
            }
        }
    }
}
