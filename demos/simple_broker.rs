//! Simple chat room broker example
//!
//! Run with: cargo run --example simple_broker [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_broker                    # binds to 0.0.0.0:7700
//!   cargo run --example simple_broker localhost          # binds to 127.0.0.1:7700
//!   cargo run --example simple_broker 127.0.0.1:7800     # binds to 127.0.0.1:7800
//!
//! ## Joining from a terminal
//!
//! Connect with netcat and type one JSON event per line:
//!
//!   nc localhost 7700
//!   {"event":"connect","token":"alice"}
//!   {"event":"feedback","feedback":"alice is typing..."}
//!   {"event":"message","name":"alice","message":"hello","dateTime":"2026-01-01T12:00:00Z"}
//!
//! Open a second terminal with a different token to watch messages, typing
//! feedback, and presence totals fan out.
//!
//! ## Features
//!
//! - Any non-empty token is admitted; the token doubles as the display name
//! - Presence totals go to everyone, messages and feedback skip the sender
//! - Room stats are printed every 30 seconds

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use roomcast::{ChatServer, Error, IdentityResolver, ServerConfig};

/// Resolver that admits any non-empty token and uses it as the display name
struct DemoResolver;

impl IdentityResolver for DemoResolver {
    async fn resolve(&self, credential: &str) -> roomcast::Result<String> {
        if credential.is_empty() {
            return Err(Error::Authentication("empty token".to_string()));
        }

        Ok(credential.to_string())
    }
}

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:7700
/// - "localhost:7800" -> 127.0.0.1:7800
/// - "127.0.0.1" -> 127.0.0.1:7700
/// - "0.0.0.0:7700" -> 0.0.0.0:7700
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 7700;

    // Replace "localhost" with "127.0.0.1"
    let normalized = arg.replace("localhost", "127.0.0.1");

    // Try parsing as SocketAddr first (includes port)
    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Try parsing as IP address without port
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: simple_broker [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:7700)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  simple_broker                     # binds to 0.0.0.0:7700");
    eprintln!("  simple_broker localhost           # binds to 127.0.0.1:7700");
    eprintln!("  simple_broker localhost:7800      # binds to 127.0.0.1:7800");
    eprintln!("  simple_broker 0.0.0.0:7800        # binds to 0.0.0.0:7800");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:7700".parse().unwrap(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roomcast=debug".parse()?)
                .add_directive("simple_broker=debug".parse()?),
        )
        .init();

    // Create server config with the specified bind address
    let config = ServerConfig {
        bind_addr,
        ..ServerConfig::default()
    };

    let server = ChatServer::bind(config, DemoResolver).await?;

    println!("Chat broker listening on {}", server.local_addr());
    println!();
    println!("=== Join the room ===");
    println!("  nc localhost {}", server.local_addr().port());
    println!("  {{\"event\":\"connect\",\"token\":\"alice\"}}");
    println!();
    println!("=== Then talk ===");
    println!("  {{\"event\":\"feedback\",\"feedback\":\"alice is typing...\"}}");
    println!(
        "  {{\"event\":\"message\",\"name\":\"alice\",\"message\":\"hello\",\"dateTime\":\"2026-01-01T12:00:00Z\"}}"
    );
    println!();

    // Print room stats periodically
    let registry = Arc::clone(server.registry());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        // The first tick of an interval fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let stats = registry.stats().await;
            println!(
                "Stats: live={} peak={} joined={} messages={} feedback={}",
                stats.live_sessions,
                stats.peak_sessions,
                stats.total_registered,
                stats.messages_routed,
                stats.feedback_updates,
            );
        }
    });

    // Run with Ctrl+C handling
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}
