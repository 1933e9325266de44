//! Identity resolution boundary
//!
//! The broker never checks credentials itself. Embedders supply an
//! [`IdentityResolver`], consulted exactly once per connection during the
//! connect handshake. A resolution failure refuses the connection before
//! any session state is created, so presence is never affected.

use std::collections::HashMap;
use std::future::Future;

use crate::error::{Error, Result};

/// Maps a bearer credential to a display name
///
/// Implementations are typically backed by the portal's REST API.
pub trait IdentityResolver: Send + Sync + 'static {
    /// Resolve a credential to a display name
    ///
    /// Returning an error refuses the connection.
    fn resolve(&self, credential: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Resolver backed by a fixed token table
///
/// Intended for tests and demos; every token not in the table is refused.
#[derive(Debug, Default)]
pub struct StaticTokenResolver {
    tokens: HashMap<String, String>,
}

impl StaticTokenResolver {
    /// Create an empty resolver that refuses every credential
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential and the display name it resolves to
    pub fn with_token(mut self, token: impl Into<String>, name: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), name.into());
        self
    }
}

impl IdentityResolver for StaticTokenResolver {
    async fn resolve(&self, credential: &str) -> Result<String> {
        self.tokens
            .get(credential)
            .cloned()
            .ok_or_else(|| Error::Authentication("unknown token".to_string()))
    }
}
