//! Session records

use std::time::{Duration, Instant};

/// Unique identifier for a connection's session
///
/// Allocated monotonically by the listener, so an id never repeats within
/// a server's lifetime.
pub type SessionId = u64;

/// A live session as tracked by the registry
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session ID
    pub id: SessionId,

    /// Display name resolved at connect, immutable afterwards
    pub display_name: String,

    /// When the session was registered
    pub connected_at: Instant,
}

impl Session {
    /// Create a new session record
    pub fn new(id: SessionId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            connected_at: Instant::now(),
        }
    }

    /// Time since the session registered
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
