//! Per-connection event loop
//!
//! Each accepted socket gets one task driving `Connection::run`: a connect
//! handshake bounded by the connection timeout, then a select loop over
//! inbound bytes, outbound deliveries, and the optional idle deadline.
//! Errors tear down only this connection; the unregister on the way out is
//! unconditional and idempotent, so every teardown path produces exactly
//! one presence broadcast.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{sleep_until, timeout, Instant};

use crate::error::{Error, Result};
use crate::protocol::{ClientEvent, EventCodec, ServerEvent};
use crate::registry::{OverflowPolicy, Registration, RoomRegistry, SessionId};
use crate::server::config::ServerConfig;
use crate::server::identity::IdentityResolver;
use crate::session::SessionState;

/// One live connection's event loop
pub struct Connection<S, R> {
    reader: ReadHalf<S>,
    writer: WriteHalf<S>,
    state: SessionState,
    codec: EventCodec,
    config: ServerConfig,
    resolver: Arc<R>,
    registry: Arc<RoomRegistry>,
}

impl<S, R> Connection<S, R>
where
    S: AsyncRead + AsyncWrite,
    R: IdentityResolver,
{
    /// Create a connection handler for an accepted socket
    pub fn new(
        session_id: SessionId,
        socket: S,
        peer_addr: SocketAddr,
        config: ServerConfig,
        resolver: Arc<R>,
        registry: Arc<RoomRegistry>,
    ) -> Self {
        let (reader, writer) = tokio::io::split(socket);
        let codec = EventCodec::with_max_event_size(config.max_event_size);

        Self {
            reader,
            writer,
            state: SessionState::new(session_id, peer_addr),
            codec,
            config,
            resolver,
            registry,
        }
    }

    /// Get the session state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Drive the connection to completion
    ///
    /// Runs the connect handshake, registers the session, and serves
    /// events until the peer disconnects or a session-fatal error occurs.
    /// A session that was registered is always unregistered on the way
    /// out, whatever the exit path.
    pub async fn run(&mut self) -> Result<()> {
        let connection_timeout = self.config.connection_timeout;

        let registration = match timeout(connection_timeout, self.handshake()).await {
            Ok(Ok(registration)) => registration,
            Ok(Err(e)) => {
                self.state.disconnect();
                tracing::warn!(
                    session_id = self.state.id,
                    peer = %self.state.peer_addr,
                    error = %e,
                    "Connection refused"
                );
                return Err(e);
            }
            Err(_) => {
                self.state.disconnect();
                tracing::warn!(
                    session_id = self.state.id,
                    peer = %self.state.peer_addr,
                    "Connection refused: connect handshake timed out"
                );
                return Err(Error::Authentication(
                    "connect handshake timed out".to_string(),
                ));
            }
        };

        let result = self.serve(registration).await;

        self.registry.unregister(self.state.id).await;
        self.state.disconnect();

        let stats = self.state.stats();
        tracing::info!(
            session_id = self.state.id,
            name = %self.state.name(),
            events_in = stats.events_in,
            events_out = stats.events_out,
            events_dropped = stats.events_dropped,
            duration_ms = stats.duration.as_millis() as u64,
            "Session closed"
        );

        result
    }

    /// Read the connect event, resolve the credential, and join the room
    async fn handshake(&mut self) -> Result<Registration> {
        let event = Self::next_event(&mut self.reader, &mut self.codec)
            .await?
            .ok_or_else(|| Error::Protocol("connection closed before connect".to_string()))?;

        let token = match event {
            ClientEvent::Connect { token } => token,
            other => {
                return Err(Error::Protocol(format!(
                    "expected connect, got {}",
                    other.name()
                )));
            }
        };

        let display_name = self.resolver.resolve(&token).await?;
        self.state.authenticate(display_name);

        tracing::debug!(
            session_id = self.state.id,
            name = %self.state.name(),
            "Credential resolved"
        );

        let registration = self
            .registry
            .register(self.state.id, self.state.name())
            .await;
        self.state.activate();

        Ok(registration)
    }

    /// Serve an active session until disconnect
    async fn serve(&mut self, registration: Registration) -> Result<()> {
        let Registration {
            mut events, total, ..
        } = registration;

        tracing::debug!(session_id = self.state.id, total = total, "Session active");

        let mut idle_deadline = self.idle_deadline();

        loop {
            tokio::select! {
                inbound = Self::next_event(&mut self.reader, &mut self.codec) => {
                    match inbound? {
                        Some(event) => {
                            self.state.mark_inbound();
                            idle_deadline = self.idle_deadline();
                            self.handle_event(event).await?;
                        }
                        None => {
                            tracing::debug!(session_id = self.state.id, "Peer disconnected");
                            return Ok(());
                        }
                    }
                }
                delivery = events.recv() => {
                    match delivery {
                        Ok(delivery) => {
                            if delivery.is_for(self.state.id) {
                                self.write_event(&delivery.event).await?;
                            }
                        }
                        Err(RecvError::Lagged(missed)) => self.handle_lag(missed)?,
                        Err(RecvError::Closed) => {
                            return Err(Error::Protocol("registry channel closed".to_string()));
                        }
                    }
                }
                _ = Self::idle_wait(idle_deadline) => {
                    tracing::info!(
                        session_id = self.state.id,
                        "Idle timeout reached, closing session"
                    );
                    return Ok(());
                }
            }
        }
    }

    /// Dispatch one inbound event from an active session
    async fn handle_event(&mut self, event: ClientEvent) -> Result<()> {
        match event {
            ClientEvent::Connect { .. } => Err(Error::Protocol(
                "connect repeated on an established session".to_string(),
            )),
            ClientEvent::Message(message) => {
                self.registry
                    .broadcast_message(self.state.id, message)
                    .await;
                Ok(())
            }
            ClientEvent::Feedback { feedback } => {
                self.registry.set_feedback(self.state.id, feedback).await;
                Ok(())
            }
        }
    }

    /// Apply the overflow policy after the outbound ring lagged
    fn handle_lag(&mut self, missed: u64) -> Result<()> {
        match self.registry.config().overflow_policy {
            OverflowPolicy::Disconnect => Err(Error::Overflow { missed }),
            OverflowPolicy::DropOldest => {
                self.state.mark_dropped(missed);
                tracing::warn!(
                    session_id = self.state.id,
                    missed = missed,
                    "Outbound ring lagged, skipping missed events"
                );
                Ok(())
            }
        }
    }

    /// Encode and write one event to the peer
    async fn write_event(&mut self, event: &ServerEvent) -> Result<()> {
        let line = self.codec.encode(event)?;
        self.writer.write_all(&line).await?;
        self.state.mark_outbound();
        Ok(())
    }

    /// Read the next inbound event, or `None` on EOF
    async fn next_event(
        reader: &mut ReadHalf<S>,
        codec: &mut EventCodec,
    ) -> Result<Option<ClientEvent>> {
        loop {
            if let Some(event) = codec.decode_next()? {
                return Ok(Some(event));
            }

            let mut buf = [0u8; 4096];
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                return Ok(None);
            }
            codec.feed(&buf[..n]);
        }
    }

    fn idle_deadline(&self) -> Option<Instant> {
        self.config
            .idle_timeout
            .map(|idle_timeout| Instant::now() + idle_timeout)
    }

    async fn idle_wait(deadline: Option<Instant>) {
        match deadline {
            Some(at) => sleep_until(at).await,
            None => std::future::pending().await,
        }
    }
}
