//! Simple signaling relay example
//!
//! Run with: cargo run --example relay_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example relay_server                    # binds to 0.0.0.0:8080
//!   cargo run --example relay_server localhost          # binds to 127.0.0.1:8080
//!   cargo run --example relay_server 127.0.0.1:9000     # binds to 127.0.0.1:9000
//!
//! ## Connecting peers
//!
//! Point WebSocket clients at:
//!   ws://localhost:8080/websocket?room=demo
//!
//! A typical browser peer sends `{"type":"join"}` right after the socket
//! opens, answers the resulting offers/answers/candidates, and watches
//! for `{"type":"leave","id":N}` to tear down peer connections.
//!
//! ## Features
//!
//! - Room partitioning: peers only ever see traffic from their own room
//! - Identity stamping: the relay overwrites each frame's `id` field
//! - Backpressure: slow peers drop frames instead of stalling the room

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use signal_relay::{PeerContext, RelayHandler, ServerConfig, SignalMessage, SignalServer};

/// Handler that logs relay events and collects counters
struct LoggingHandler {
    joins: AtomicU64,
    frames: AtomicU64,
    departures: AtomicU64,
}

impl LoggingHandler {
    fn new() -> Self {
        Self {
            joins: AtomicU64::new(0),
            frames: AtomicU64::new(0),
            departures: AtomicU64::new(0),
        }
    }

    fn print_stats(&self) {
        println!(
            "Stats: joins={} frames={} departures={}",
            self.joins.load(Ordering::Relaxed),
            self.frames.load(Ordering::Relaxed),
            self.departures.load(Ordering::Relaxed),
        );
    }
}

impl RelayHandler for LoggingHandler {
    async fn on_connection(&self, ctx: &PeerContext) -> bool {
        println!("[{}] New connection from {}", ctx.id, ctx.peer_addr);
        true
    }

    async fn on_join(&self, ctx: &PeerContext) {
        self.joins.fetch_add(1, Ordering::Relaxed);
        println!("[{}] Joined room '{}'", ctx.id, ctx.room);
    }

    async fn on_message(&self, ctx: &PeerContext, message: &SignalMessage) -> bool {
        self.frames.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = ctx.id,
            room = %ctx.room,
            kind = message.kind.as_deref().unwrap_or("-"),
            to = message.to,
            "Frame"
        );

        // Forward everything; return false here to drop a frame.
        true
    }

    async fn on_disconnect(&self, ctx: &PeerContext) {
        self.departures.fetch_add(1, Ordering::Relaxed);
        println!("[{}] Disconnected", ctx.id);
        self.print_stats();
    }
}

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8080
/// - "localhost:9000" -> 127.0.0.1:9000
/// - "127.0.0.1" -> 127.0.0.1:8080
/// - "0.0.0.0:9000" -> 0.0.0.0:9000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 8080;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: relay_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:8080)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  relay_server                     # binds to 0.0.0.0:8080");
    eprintln!("  relay_server localhost           # binds to 127.0.0.1:8080");
    eprintln!("  relay_server 127.0.0.1:9000      # binds to 127.0.0.1:9000");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
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
        None => "0.0.0.0:8080".parse()?,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("signal_relay=debug".parse()?)
                .add_directive("relay_server=debug".parse()?),
        )
        .init();

    let config = ServerConfig {
        bind_addr,
        ..ServerConfig::default()
    };

    println!("Starting signaling relay on {}", config.bind_addr);
    println!();
    println!("Peers connect to: ws://{}{}?room=<name>", config.bind_addr, config.ws_path);
    println!();

    let server = Arc::new(SignalServer::new(config, LoggingHandler::new()));

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
