//! Simple hub server example with frame broadcasting
//!
//! Run with: cargo run --example simple_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_server                    # binds to 0.0.0.0:5000
//!   cargo run --example simple_server localhost          # binds to 127.0.0.1:5000
//!   cargo run --example simple_server 127.0.0.1:5001     # binds to 127.0.0.1:5001
//!
//! ## Connecting
//!
//! Any websocket client works, e.g. websocat:
//!   websocat ws://localhost:5000
//!
//! ## Subscribing (receive the periodic stream)
//!
//!   {"event": "subscribe", "payload": "stream_frames"}
//!
//! ## Requesting a single frame
//!
//!   {"event": "request_image", "payload": {"type": "request"}}
//!
//! ## Features
//!
//! - Broadcasts a fresh frame every second to `stream_frames` subscribers
//! - Direct request/response image exchange outside the periodic stream
//! - Generic data messages are printed via a custom `DataHandler`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use framecast::{ConnectionId, DataHandler, HubServer, ServerConfig};
use serde_json::Value;

/// Prints generic data messages forwarded by the router
struct PrintingDataHandler;

impl DataHandler for PrintingDataHandler {
    fn on_data(&self, id: ConnectionId, payload: &Value) {
        println!("[{}] Data message: {}", id, payload);
    }
}

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:5000
/// - "localhost:5001" -> 127.0.0.1:5001
/// - "127.0.0.1" -> 127.0.0.1:5000
/// - "0.0.0.0:5001" -> 0.0.0.0:5001
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 5000;

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
    eprintln!("Usage: simple_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:5000)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  simple_server                     # binds to 0.0.0.0:5000");
    eprintln!("  simple_server localhost           # binds to 127.0.0.1:5000");
    eprintln!("  simple_server 127.0.0.1:5001      # binds to 127.0.0.1:5001");
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
        None => "0.0.0.0:5000".parse().unwrap(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("framecast=debug".parse()?)
                .add_directive("simple_server=debug".parse()?),
        )
        .init();

    // Create server config with the specified bind address
    let config = ServerConfig {
        bind_addr,
        ..ServerConfig::default()
    };

    println!("Starting hub server on {}", config.bind_addr);
    println!();
    println!("=== Subscribe to the frame stream ===");
    println!("websocat ws://localhost:{}", config.bind_addr.port());
    println!("  {{\"event\": \"subscribe\", \"payload\": \"stream_frames\"}}");
    println!();
    println!("=== Request a single frame ===");
    println!("  {{\"event\": \"request_image\", \"payload\": {{\"type\": \"request\"}}}}");
    println!();

    // Create the server with a data handler that prints generic messages
    let server = Arc::new(HubServer::with_data_handler(
        config,
        Arc::new(PrintingDataHandler),
    ));

    // Periodic stats report
    let stats_server = Arc::clone(&server);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        loop {
            ticker.tick().await;
            let hub = stats_server.hub().stats().await;
            let broadcast = stats_server.broadcast_stats();
            println!(
                "Stats: connections={} topics={} subscriptions={} frames={} deliveries={} failures={}",
                hub.connections,
                hub.topics,
                hub.subscriptions,
                broadcast.frames_broadcast,
                broadcast.deliveries,
                broadcast.send_failures,
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
