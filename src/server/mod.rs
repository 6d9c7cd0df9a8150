//! WebSocket server binding
//!
//! This module provides:
//! - Builder-style server configuration
//! - The TCP accept loop and connection-id allocation
//! - Per-connection websocket session tasks

pub mod config;
pub mod listener;
pub(crate) mod session;

pub use config::ServerConfig;
pub use listener::HubServer;
