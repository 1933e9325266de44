//! Chat server listener
//!
//! Handles the TCP accept loop and spawns one connection task per socket.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::registry::{RegistryConfig, RoomRegistry};
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::server::identity::IdentityResolver;

/// Chat room broker server
pub struct ChatServer<R: IdentityResolver> {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
    resolver: Arc<R>,
    registry: Arc<RoomRegistry>,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl<R: IdentityResolver> ChatServer<R> {
    /// Bind the listening socket with the given configuration and resolver
    pub async fn bind(config: ServerConfig, resolver: R) -> Result<Self> {
        Self::bind_with_registry_config(config, resolver, RegistryConfig::default()).await
    }

    /// Bind with custom registry configuration
    pub async fn bind_with_registry_config(
        config: ServerConfig,
        resolver: R,
        registry_config: RegistryConfig,
    ) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Ok(Self {
            listener,
            local_addr,
            config,
            resolver: Arc::new(resolver),
            registry: Arc::new(RoomRegistry::with_config(registry_config)),
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
        })
    }

    /// Get a reference to the room registry
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Get the bound address
    ///
    /// Reflects the actual port when the configuration asked for port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(addr = %self.local_addr, "Chat server listening");
        self.accept_loop().await
    }

    /// Run the server with graceful shutdown
    ///
    /// Stops accepting new connections when `shutdown` resolves. Sessions
    /// already running keep their tasks and drain on their own.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tracing::info!(addr = %self.local_addr, "Chat server listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop() => result,
        }
    }

    async fn accept_loop(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        // Generate session ID
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        // Configure socket
        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        // Spawn connection handler
        let config = self.config.clone();
        let resolver = Arc::clone(&self.resolver);
        let registry = Arc::clone(&self.registry);

        tokio::spawn(async move {
            // The permit is held for the lifetime of the connection task
            let _permit = permit;

            let mut connection =
                Connection::new(session_id, socket, peer_addr, config, resolver, registry);

            if let Err(e) = connection.run().await {
                tracing::debug!(
                    session_id = session_id,
                    error = %e,
                    "Connection error"
                );
            }

            tracing::debug!(session_id = session_id, "Connection closed");
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio_test::assert_ok;

    use super::*;
    use crate::protocol::{ChatMessage, ClientEvent, ServerEvent};
    use crate::server::identity::StaticTokenResolver;

    fn test_resolver() -> StaticTokenResolver {
        StaticTokenResolver::new()
            .with_token("tok-alice", "Alice")
            .with_token("tok-bob", "Bob")
    }

    fn test_config() -> ServerConfig {
        ServerConfig::with_addr("127.0.0.1:0".parse().unwrap())
    }

    async fn send_event(stream: &mut TcpStream, event: &ClientEvent) {
        let mut line = serde_json::to_vec(event).unwrap();
        line.push(b'\n');
        stream.write_all(&line).await.unwrap();
    }

    async fn read_server_event(stream: &mut TcpStream) -> ServerEvent {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            stream.read_exact(&mut byte).await.unwrap();
            if byte[0] == b'\n' {
                break;
            }
            line.push(byte[0]);
        }
        serde_json::from_slice(&line).unwrap()
    }

    async fn connect(stream: &mut TcpStream, token: &str) -> usize {
        send_event(
            stream,
            &ClientEvent::Connect {
                token: token.to_string(),
            },
        )
        .await;
        match read_server_event(stream).await {
            ServerEvent::ClientsTotal { total } => total,
            other => panic!("expected clients-total, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_serves_sessions_over_tcp() {
        let server = assert_ok!(ChatServer::bind(test_config(), test_resolver()).await);
        let addr = server.local_addr();
        assert_ne!(addr.port(), 0);

        let registry = Arc::clone(server.registry());
        let server = Arc::new(server);
        let server_task = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.run().await })
        };

        let mut alice = TcpStream::connect(addr).await.unwrap();
        assert_eq!(connect(&mut alice, "tok-alice").await, 1);

        let mut bob = TcpStream::connect(addr).await.unwrap();
        assert_eq!(connect(&mut bob, "tok-bob").await, 2);
        assert_eq!(
            read_server_event(&mut alice).await,
            ServerEvent::ClientsTotal { total: 2 }
        );

        let msg = ChatMessage::new("Bob", "hello over tcp", "2026-05-01T10:00:00Z");
        send_event(&mut bob, &ClientEvent::Message(msg.clone())).await;
        assert_eq!(
            read_server_event(&mut alice).await,
            ServerEvent::ChatMessage(msg)
        );

        drop(bob);
        assert_eq!(
            read_server_event(&mut alice).await,
            ServerEvent::ClientsTotal { total: 1 }
        );
        assert_eq!(registry.count().await, 1);

        server_task.abort();
    }

    #[tokio::test]
    async fn test_connection_limit_rejects_excess_sockets() {
        let config = test_config().max_connections(1);
        let server = Arc::new(ChatServer::bind(config, test_resolver()).await.unwrap());
        let addr = server.local_addr();

        let server_task = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.run().await })
        };

        let mut alice = TcpStream::connect(addr).await.unwrap();
        assert_eq!(connect(&mut alice, "tok-alice").await, 1);

        // The second socket is accepted and closed without a session
        let mut rejected = TcpStream::connect(addr).await.unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(rejected.read(&mut buf).await.unwrap(), 0);
        assert_eq!(server.registry().count().await, 1);

        server_task.abort();
    }

    #[tokio::test]
    async fn test_run_until_stops_accepting_on_shutdown() {
        let server = ChatServer::bind(test_config(), test_resolver())
            .await
            .unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server_task = tokio::spawn(async move {
            server
                .run_until(async {
                    let _ = rx.await;
                })
                .await
        });

        tx.send(()).unwrap();
        assert!(server_task.await.unwrap().is_ok());
    }
}
