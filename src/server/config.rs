//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::protocol::codec::DEFAULT_MAX_EVENT_SIZE;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Connection timeout (the connect handshake must complete within this time)
    pub connection_timeout: Duration,

    /// Idle timeout (disconnect if no inbound event arrives; `None` disables)
    pub idle_timeout: Option<Duration>,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Maximum size of a single encoded event line
    pub max_event_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7700".parse().unwrap(),
            max_connections: 0, // Unlimited
            connection_timeout: Duration::from_secs(10),
            idle_timeout: None, // The protocol has no keepalive traffic
            tcp_nodelay: true,
            max_event_size: DEFAULT_MAX_EVENT_SIZE,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set connection timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Enable the idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Set the maximum encoded event line size
    pub fn max_event_size(mut self, size: usize) -> Self {
        self.max_event_size = size;
        self
    }
}
