//! Statistics snapshots

pub mod metrics;

pub use metrics::{RoomStats, SessionStats};
