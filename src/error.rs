//! Error handling for the chat broker
//!
//! Every error is handled at the boundary of the session that caused it.
//! A failure on one session never propagates to another; the rest of the
//! room observes at most a presence-count change.

use thiserror::Error;

/// Result type alias for broker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broker error types
#[derive(Error, Debug)]
pub enum Error {
    /// Credential rejected at connect; no session was created
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Read or write failure on an established session's transport
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Session fell behind its outbound event ring
    #[error("Outbound overflow: {missed} events missed")]
    Overflow { missed: u64 },

    /// Malformed wire data, or an event invalid in the current phase
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Protocol(format!("invalid JSON: {}", err))
    }
}
