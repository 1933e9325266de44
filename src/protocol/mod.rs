//! Wire protocol: typed events and line framing
//!
//! The broker speaks newline-delimited JSON over a persistent connection.
//! [`event`] defines the typed events for each direction and [`codec`]
//! turns a byte stream into them.

pub mod codec;
pub mod event;

pub use codec::EventCodec;
pub use event::{ChatMessage, ClientEvent, ServerEvent};
