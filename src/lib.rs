//! Core engine of the rail-trail trip companion: track geometry, the live
//! position feed client, the vehicle registry and the trip-state engine.
//! The UI layer consumes snapshots published by [`session::TripSession`].

pub mod config;
pub mod feed;
pub mod registry;
pub mod session;
pub mod track;
pub mod trip;
pub mod util;
