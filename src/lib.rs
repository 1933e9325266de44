//! Live chat room broker over persistent TCP connections
//!
//! Clients speak newline-delimited JSON events. A `connect` handshake
//! resolves a credential to a display name, after which chat messages and
//! typing feedback fan out to every other session in the room, and presence
//! totals fan out to everyone. Each session runs on its own task with a
//! bounded outbound queue, so one slow or broken client never stalls the
//! rest of the room.
//!
//! # Example
//!
//! ```no_run
//! use roomcast::{ChatServer, ServerConfig, StaticTokenResolver};
//!
//! #[tokio::main]
//! async fn main() -> roomcast::Result<()> {
//!     let resolver = StaticTokenResolver::new().with_token("secret", "Alice");
//!     let config = ServerConfig::with_addr("127.0.0.1:7700".parse().unwrap());
//!
//!     let server = ChatServer::bind(config, resolver).await?;
//!     server.run().await
//! }
//! ```

pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use protocol::{ChatMessage, ClientEvent, EventCodec, ServerEvent};
pub use registry::{OverflowPolicy, RegistryConfig, RoomRegistry, SessionId};
pub use server::{ChatServer, IdentityResolver, ServerConfig, StaticTokenResolver};
pub use session::{SessionPhase, SessionState};
pub use stats::{RoomStats, SessionStats};
