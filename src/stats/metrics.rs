//! Statistics for the room and its sessions

use std::time::Duration;

/// Room-wide statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct RoomStats {
    /// Currently registered sessions
    pub live_sessions: usize,
    /// Highest concurrent session count observed
    pub peak_sessions: usize,
    /// Sessions ever registered
    pub total_registered: u64,
    /// Chat messages routed
    pub messages_routed: u64,
    /// Typing indicator updates applied
    pub feedback_updates: u64,
}

impl RoomStats {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-session statistics, captured at teardown
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Inbound events processed
    pub events_in: u64,
    /// Outbound events written
    pub events_out: u64,
    /// Outbound events dropped by overflow skips
    pub events_dropped: u64,
    /// Connection duration
    pub duration: Duration,
}

impl SessionStats {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_stats_new() {
        let stats = RoomStats::new();
        assert_eq!(stats.live_sessions, 0);
        assert_eq!(stats.peak_sessions, 0);
        assert_eq!(stats.total_registered, 0);
        assert_eq!(stats.messages_routed, 0);
        assert_eq!(stats.feedback_updates, 0);
    }

    #[test]
    fn test_session_stats_new() {
        let stats = SessionStats::new();
        assert_eq!(stats.events_in, 0);
        assert_eq!(stats.events_out, 0);
        assert_eq!(stats.events_dropped, 0);
        assert_eq!(stats.duration, Duration::ZERO);
    }
}
