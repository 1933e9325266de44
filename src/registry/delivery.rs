//! Outbound delivery envelope
//!
//! Everything fanned out to sessions travels through the registry's
//! broadcast channel wrapped in a `Delivery`. The envelope carries the
//! audience scope, so each connection task filters out events that were
//! not addressed to it.

use crate::protocol::ServerEvent;

use super::session::SessionId;

/// Audience of a broadcast delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every live session
    Everyone,
    /// Every live session except the named one
    AllBut(SessionId),
}

/// An event paired with its audience
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Who should receive the event
    pub scope: Scope,
    /// The event to deliver
    pub event: ServerEvent,
}

impl Delivery {
    /// Deliver to every live session
    pub fn to_everyone(event: ServerEvent) -> Self {
        Self {
            scope: Scope::Everyone,
            event,
        }
    }

    /// Deliver to every live session except `origin`
    pub fn all_but(origin: SessionId, event: ServerEvent) -> Self {
        Self {
            scope: Scope::AllBut(origin),
            event,
        }
    }

    /// Whether this delivery should reach the given session
    pub fn is_for(&self, id: SessionId) -> bool {
        match self.scope {
            Scope::Everyone => true,
            Scope::AllBut(origin) => id != origin,
        }
    }
}
