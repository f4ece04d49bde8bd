pub mod client;
pub mod message;

pub use client::{ConnectionState, FeedClient};
pub use message::PositionUpdate;
