//! Room registry implementation
//!
//! The single serialization point for the chat room. The session map, the
//! shared typing slot, and the broadcast sender live behind one mutex, so
//! every mutation and the event it emits are observed by all sessions in
//! the same total order.

use std::collections::HashMap;

use tokio::sync::{broadcast, Mutex};

use crate::protocol::{ChatMessage, ServerEvent};
use crate::stats::RoomStats;

use super::config::RegistryConfig;
use super::delivery::Delivery;
use super::session::{Session, SessionId};

/// Handle returned by a successful registration
pub struct Registration {
    /// The stored session record
    pub session: Session,

    /// Receiver for deliveries addressed to this session
    ///
    /// Subscribed before the join's presence event is sent, so the first
    /// delivery a joiner observes is its own `clients-total`.
    pub events: broadcast::Receiver<Delivery>,

    /// Presence count at the instant of registration
    pub total: usize,
}

/// Shared room state, guarded by the registry mutex
struct RoomState {
    /// Live sessions keyed by id
    sessions: HashMap<SessionId, Session>,

    /// Latest typing indicator text (empty = cleared)
    typing: String,

    /// Broadcast sender for fan-out to connection tasks
    tx: broadcast::Sender<Delivery>,

    /// Sessions ever registered
    total_registered: u64,

    /// Highest concurrent session count observed
    peak_sessions: usize,

    /// Chat messages routed
    messages_routed: u64,

    /// Typing indicator updates applied
    feedback_updates: u64,
}

impl RoomState {
    /// Send a delivery to all current receivers
    ///
    /// Returns the number of receivers, or 0 when the room is empty.
    fn send(&self, delivery: Delivery) -> usize {
        self.tx.send(delivery).unwrap_or(0)
    }
}

/// Central registry for the chat room
///
/// Owns the live-session set, the presence count derived from it, and the
/// typing indicator slot. Events emitted by an operation are sent while
/// the lock is held, which pins the order every receiver observes to the
/// order of registry mutations.
pub struct RoomRegistry {
    state: Mutex<RoomState>,
    config: RegistryConfig,
}

impl RoomRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        // A zero capacity would panic in broadcast::channel
        let (tx, _) = broadcast::channel(config.event_buffer.max(1));

        Self {
            state: Mutex::new(RoomState {
                sessions: HashMap::new(),
                typing: String::new(),
                tx,
                total_registered: 0,
                peak_sessions: 0,
                messages_routed: 0,
                feedback_updates: 0,
            }),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a session and announce the new presence count
    ///
    /// The `clients-total` event goes to every live session including the
    /// joiner, whose receiver is subscribed before the event is sent.
    pub async fn register(&self, id: SessionId, display_name: impl Into<String>) -> Registration {
        let mut state = self.state.lock().await;

        let session = Session::new(id, display_name);
        state.sessions.insert(id, session.clone());
        state.total_registered += 1;
        if state.sessions.len() > state.peak_sessions {
            state.peak_sessions = state.sessions.len();
        }

        let events = state.tx.subscribe();
        let total = state.sessions.len();
        state.send(Delivery::to_everyone(ServerEvent::ClientsTotal { total }));

        tracing::info!(
            session_id = id,
            name = %session.display_name,
            total = total,
            "Session registered"
        );

        Registration {
            session,
            events,
            total,
        }
    }

    /// Unregister a session and announce the new presence count
    ///
    /// Idempotent: an id that is not registered is a no-op that emits
    /// nothing, so racing teardown paths cannot double-count.
    pub async fn unregister(&self, id: SessionId) {
        let mut state = self.state.lock().await;

        let session = match state.sessions.remove(&id) {
            Some(session) => session,
            None => return,
        };

        let total = state.sessions.len();
        state.send(Delivery::to_everyone(ServerEvent::ClientsTotal { total }));

        tracing::info!(
            session_id = id,
            name = %session.display_name,
            duration_ms = session.duration().as_millis() as u64,
            total = total,
            "Session unregistered"
        );
    }

    /// Broadcast a chat message to every session except the origin
    ///
    /// Fire and forget: sessions registered at this instant receive the
    /// message exactly once, later joiners never do, and there is no
    /// acknowledgment or retry.
    pub async fn broadcast_message(&self, origin: SessionId, message: ChatMessage) {
        let mut state = self.state.lock().await;

        state.messages_routed += 1;
        let receivers = state.send(Delivery::all_but(origin, ServerEvent::ChatMessage(message)));

        tracing::debug!(
            session_id = origin,
            receivers = receivers,
            "Chat message routed"
        );
    }

    /// Overwrite the typing indicator and notify every session except the origin
    ///
    /// Last writer wins; an empty string clears the indicator. Earlier
    /// writers get no notification that they were overwritten.
    pub async fn set_feedback(&self, origin: SessionId, feedback: impl Into<String>) {
        let mut state = self.state.lock().await;

        let feedback = feedback.into();
        state.typing = feedback.clone();
        state.feedback_updates += 1;
        state.send(Delivery::all_but(origin, ServerEvent::Feedback { feedback }));
    }

    /// Current typing indicator text
    pub async fn feedback(&self) -> String {
        self.state.lock().await.typing.clone()
    }

    /// Current number of live sessions
    pub async fn count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    /// Look up a session by id
    pub async fn session(&self, id: SessionId) -> Option<Session> {
        self.state.lock().await.sessions.get(&id).cloned()
    }

    /// Snapshot of all live sessions, in no particular order
    pub async fn sessions(&self) -> Vec<Session> {
        self.state.lock().await.sessions.values().cloned().collect()
    }

    /// Snapshot of room statistics
    pub async fn stats(&self) -> RoomStats {
        let state = self.state.lock().await;

        RoomStats {
            live_sessions: state.sessions.len(),
            peak_sessions: state.peak_sessions,
            total_registered: state.total_registered,
            messages_routed: state.messages_routed,
            feedback_updates: state.feedback_updates,
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::registry::delivery::Scope;

    fn chat(name: &str, text: &str) -> ChatMessage {
        ChatMessage::new(name, text, "2026-05-01T10:00:00Z")
    }

    #[tokio::test]
    async fn test_register_updates_count() {
        let registry = RoomRegistry::new();

        let a = registry.register(1, "Alice").await;
        assert_eq!(a.total, 1);
        assert_eq!(registry.count().await, 1);

        let b = registry.register(2, "Bob").await;
        assert_eq!(b.total, 2);
        assert_eq!(registry.count().await, 2);

        assert_eq!(registry.session(1).await.unwrap().display_name, "Alice");
        assert_eq!(registry.session(2).await.unwrap().display_name, "Bob");
        assert_eq!(registry.sessions().await.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_independent_sessions() {
        let registry = RoomRegistry::new();

        registry.register(1, "Alice").await;
        registry.register(2, "Alice").await;
        assert_eq!(registry.count().await, 2);

        // Tearing one down leaves the other untouched
        registry.unregister(1).await;
        assert_eq!(registry.count().await, 1);
        assert_eq!(registry.session(2).await.unwrap().display_name, "Alice");
    }

    #[tokio::test]
    async fn test_session_duration_tracks_uptime() {
        let registry = RoomRegistry::new();
        registry.register(1, "Alice").await;

        let session = registry.session(1).await.unwrap();
        let early = session.duration();
        std::thread::sleep(Duration::from_millis(5));

        assert!(session.duration() >= early + Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_zero_event_buffer_still_delivers() {
        // A hand-built config can carry the zero the builder refuses
        let config = RegistryConfig {
            event_buffer: 0,
            ..RegistryConfig::default()
        };
        let registry = RoomRegistry::with_config(config);

        let mut a = registry.register(1, "Alice").await;
        let delivery = a.events.recv().await.unwrap();
        assert_eq!(delivery.event, ServerEvent::ClientsTotal { total: 1 });
    }

    #[tokio::test]
    async fn test_joiner_observes_own_total() {
        let registry = RoomRegistry::new();

        let mut a = registry.register(1, "Alice").await;
        let first = a.events.recv().await.unwrap();
        assert_eq!(first.event, ServerEvent::ClientsTotal { total: 1 });

        let mut b = registry.register(2, "Bob").await;
        let a_sees = a.events.recv().await.unwrap();
        let b_sees = b.events.recv().await.unwrap();
        assert_eq!(a_sees.event, ServerEvent::ClientsTotal { total: 2 });
        assert_eq!(b_sees.event, ServerEvent::ClientsTotal { total: 2 });
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = RoomRegistry::new();

        let mut a = registry.register(1, "Alice").await;
        registry.register(2, "Bob").await;

        // Drain the two presence events from A's perspective
        a.events.recv().await.unwrap();
        a.events.recv().await.unwrap();

        registry.unregister(2).await;
        registry.unregister(2).await;

        let leave = a.events.recv().await.unwrap();
        assert_eq!(leave.event, ServerEvent::ClientsTotal { total: 1 });

        // The second unregister emitted nothing
        assert!(matches!(a.events.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_message_scoped_to_all_but_origin() {
        let registry = RoomRegistry::new();

        let a = registry.register(1, "Alice").await;
        let mut b = registry.register(2, "Bob").await;

        // Skip B's own join announcement
        b.events.recv().await.unwrap();

        registry.broadcast_message(a.session.id, chat("Alice", "hi")).await;

        let delivery = b.events.recv().await.unwrap();
        assert_eq!(delivery.scope, Scope::AllBut(1));
        assert!(delivery.is_for(2));
        assert!(!delivery.is_for(1));
        assert_eq!(delivery.event, ServerEvent::ChatMessage(chat("Alice", "hi")));
    }

    #[tokio::test]
    async fn test_late_joiner_misses_earlier_messages() {
        let registry = RoomRegistry::new();

        registry.register(1, "Alice").await;
        registry.broadcast_message(1, chat("Alice", "before")).await;

        let mut c = registry.register(3, "Carol").await;

        // The only delivery C can observe is its own join announcement
        let first = c.events.recv().await.unwrap();
        assert_eq!(first.event, ServerEvent::ClientsTotal { total: 2 });
        assert!(matches!(c.events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_messages_ordered_per_recipient() {
        let registry = RoomRegistry::new();

        registry.register(1, "Alice").await;
        let mut b = registry.register(2, "Bob").await;
        b.events.recv().await.unwrap();

        for i in 0..5 {
            registry
                .broadcast_message(1, chat("Alice", &format!("m{}", i)))
                .await;
        }

        for i in 0..5 {
            let delivery = b.events.recv().await.unwrap();
            assert_eq!(
                delivery.event,
                ServerEvent::ChatMessage(chat("Alice", &format!("m{}", i)))
            );
        }
    }

    #[tokio::test]
    async fn test_feedback_last_writer_wins() {
        let registry = RoomRegistry::new();

        registry.register(1, "Alice").await;
        registry.register(2, "Bob").await;

        registry.set_feedback(1, "Alice is typing...").await;
        registry.set_feedback(2, "Bob is typing...").await;
        assert_eq!(registry.feedback().await, "Bob is typing...");

        registry.set_feedback(2, "").await;
        assert_eq!(registry.feedback().await, "");
    }

    #[tokio::test]
    async fn test_feedback_survives_disconnect() {
        let registry = RoomRegistry::new();

        registry.register(1, "Alice").await;
        registry.register(2, "Bob").await;

        registry.set_feedback(1, "Alice is typing...").await;
        registry.unregister(2).await;

        assert_eq!(registry.feedback().await, "Alice is typing...");
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let registry = RoomRegistry::new();

        registry.register(1, "Alice").await;
        registry.register(2, "Bob").await;
        registry.unregister(2).await;
        registry.broadcast_message(1, chat("Alice", "one")).await;
        registry.broadcast_message(1, chat("Alice", "two")).await;
        registry.set_feedback(1, "typing").await;

        let stats = registry.stats().await;
        assert_eq!(stats.live_sessions, 1);
        assert_eq!(stats.peak_sessions, 2);
        assert_eq!(stats.total_registered, 2);
        assert_eq!(stats.messages_routed, 2);
        assert_eq!(stats.feedback_updates, 1);
    }
}
