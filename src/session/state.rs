//! Session state machine
//!
//! Tracks one connection from accept to teardown.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::registry::SessionId;
use crate::stats::SessionStats;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// TCP connected, waiting for the connect event
    Connecting,
    /// Credential resolved, not yet registered in the room
    Authenticated,
    /// Registered in the room, exchanging events
    Active,
    /// Torn down (terminal)
    Disconnected,
}

/// Complete per-connection state
#[derive(Debug)]
pub struct SessionState {
    /// Unique session ID
    pub id: SessionId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: SessionPhase,

    /// Connection start time
    pub connected_at: Instant,

    /// Display name, set when authentication succeeds
    pub display_name: Option<String>,

    /// Inbound events processed
    pub events_in: u64,

    /// Outbound events written
    pub events_out: u64,

    /// Outbound events dropped by overflow skips
    pub events_dropped: u64,
}

impl SessionState {
    /// Create state for a newly accepted connection
    pub fn new(id: SessionId, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            phase: SessionPhase::Connecting,
            connected_at: Instant::now(),
            display_name: None,
            events_in: 0,
            events_out: 0,
            events_dropped: 0,
        }
    }

    /// Record a successful credential resolution
    pub fn authenticate(&mut self, display_name: impl Into<String>) {
        if self.phase == SessionPhase::Connecting {
            self.display_name = Some(display_name.into());
            self.phase = SessionPhase::Authenticated;
        }
    }

    /// Record registration in the room
    pub fn activate(&mut self) {
        if self.phase == SessionPhase::Authenticated {
            self.phase = SessionPhase::Active;
        }
    }

    /// Record teardown; terminal from any phase
    ///
    /// An authentication failure lands here straight from `Connecting`,
    /// without the session ever becoming active.
    pub fn disconnect(&mut self) {
        self.phase = SessionPhase::Disconnected;
    }

    /// Record an inbound event
    pub fn mark_inbound(&mut self) {
        self.events_in += 1;
    }

    /// Record an outbound event write
    pub fn mark_outbound(&mut self) {
        self.events_out += 1;
    }

    /// Record events skipped by an overflow recovery
    pub fn mark_dropped(&mut self, missed: u64) {
        self.events_dropped += missed;
    }

    /// Whether the session is registered and exchanging events
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Connection duration so far
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Display name, or a placeholder before authentication
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("<unauthenticated>")
    }

    /// Snapshot the session's counters
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            events_in: self.events_in,
            events_out: self.events_out,
            events_dropped: self.events_dropped,
            duration: self.duration(),
        }
    }
}
