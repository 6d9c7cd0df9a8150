//! Connection identity and per-connection state
//!
//! This module defines the opaque connection identifier and the record the
//! hub keeps for each live session.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

/// Unique identifier for one live client session
///
/// Allocated from a process-wide counter by the listener. Never reused
/// after the connection is unregistered; a reconnecting client gets a
/// fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound-send capability for one connection
///
/// Carries envelopes already serialized to JSON; the `Arc` lets a broadcast
/// serialize once and share the text across every recipient. The session
/// task owns the receiving end and drains it into the socket, so a closed
/// channel means the session is gone.
pub type OutboundSender = mpsc::UnboundedSender<Arc<String>>;

/// Record for a single live connection, owned by the hub
pub(super) struct ConnectionEntry {
    /// When the connection was registered
    pub connected_at: DateTime<Utc>,

    /// Remote peer address (best effort, absent for in-process transports)
    pub peer_addr: Option<SocketAddr>,

    /// Handle to the connection's outbound queue
    pub sender: OutboundSender,
}

impl ConnectionEntry {
    pub(super) fn new(peer_addr: Option<SocketAddr>, sender: OutboundSender) -> Self {
        Self {
            connected_at: Utc::now(),
            peer_addr,
            sender,
        }
    }

    pub(super) fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            connected_at: self.connected_at,
            peer_addr: self.peer_addr,
        }
    }
}

/// Snapshot of connection metadata, used by diagnostics
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// When the connection was registered
    pub connected_at: DateTime<Utc>,
    /// Remote peer address, if known
    pub peer_addr: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_connection_id_serializes_transparent() {
        let id = ConnectionId(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }

    #[test]
    fn test_entry_info_snapshot() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let entry = ConnectionEntry::new(Some(addr), tx);

        let info = entry.info();
        assert_eq!(info.peer_addr, Some(addr));
        assert_eq!(info.connected_at, entry.connected_at);
    }
}
