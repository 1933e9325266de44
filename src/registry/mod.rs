//! Session registry and broadcast routing
//!
//! One room, one lock. The registry owns the live-session set (the source
//! of truth for the presence count), the shared typing slot, and the
//! broadcast channel that fans events out to every connection task.
//!
//! # Architecture
//!
//! ```text
//!                     Arc<RoomRegistry>
//!                ┌──────────────────────────┐
//!                │ Mutex<RoomState> {       │
//!                │   sessions: HashMap,     │
//!                │   typing: String,        │
//!                │   tx: broadcast::Tx,     │
//!                │ }                        │
//!                └────────────┬─────────────┘
//!                             │
//!            ┌────────────────┼────────────────┐
//!            ▼                ▼                ▼
//!       [conn task]      [conn task]      [conn task]
//!       events.recv()    events.recv()    events.recv()
//!            │                │                │
//!            └── is_for(id) filter ──► socket write
//! ```
//!
//! Sends happen while the lock is held, so every receiver observes
//! registry mutations and their events in one total order. Each receiver
//! consumes through its own cursor over a bounded ring; a producer never
//! waits for a slow consumer, and a consumer that falls behind sees a lag
//! that the connection task resolves per [`OverflowPolicy`].

pub mod config;
pub mod delivery;
pub mod session;
pub mod store;

pub use config::{OverflowPolicy, RegistryConfig};
pub use delivery::{Delivery, Scope};
pub use session::{Session, SessionId};
pub use store::{Registration, RoomRegistry};
