//! TCP server layer
//!
//! `ChatServer` owns the listening socket and spawns a `Connection` task
//! per accepted client. The connect handshake resolves a credential to a
//! display name through an `IdentityResolver` before the session joins
//! the room.

pub mod config;
pub mod connection;
pub mod identity;
pub mod listener;

pub use config::ServerConfig;
pub use connection::Connection;
pub use identity::{IdentityResolver, StaticTokenResolver};
pub use listener::ChatServer;
