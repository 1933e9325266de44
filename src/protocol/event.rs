//! Wire event types
//!
//! Every event is one JSON object tagged by an `event` field. The wire
//! names (`clients-total`, `chat-message`, `dateTime`) follow the browser
//! client's conventions, so serde attributes pin the exact spelling.

use serde::{Deserialize, Serialize};

/// A chat message as carried on the wire
///
/// `date_time` is an opaque display string stamped by the sender. The
/// broker forwards it untouched and never parses or orders by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender's display name
    pub name: String,
    /// Message body
    pub message: String,
    /// Sender-stamped timestamp string
    #[serde(rename = "dateTime")]
    pub date_time: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        date_time: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            date_time: date_time.into(),
        }
    }
}

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Handshake; must be the first event on a new connection
    Connect {
        /// Bearer credential for the identity resolver
        token: String,
    },
    /// Send a chat message to the room
    Message(ChatMessage),
    /// Update the shared typing indicator (empty string clears it)
    Feedback {
        /// Typing-status text
        feedback: String,
    },
}

impl ClientEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Connect { .. } => "connect",
            ClientEvent::Message(_) => "message",
            ClientEvent::Feedback { .. } => "feedback",
        }
    }
}

/// Events sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Presence count update, sent on every join and leave
    ClientsTotal {
        /// Number of currently registered sessions
        total: usize,
    },
    /// A chat message from another session
    ChatMessage(ChatMessage),
    /// Typing indicator update from another session
    Feedback {
        /// Current typing-status text
        feedback: String,
    },
}
