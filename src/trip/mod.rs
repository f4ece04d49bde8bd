//! The live trip-state engine: direction inference, distance accumulation
//! and proximity warnings derived from position samples.

pub mod engine;
pub mod search;
pub mod state;
pub mod warnings;

pub use engine::TripEngine;
pub use state::{TripState, WarningDistances};
pub use warnings::{select_warning, ActiveWarning};
