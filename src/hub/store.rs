//! Hub state store
//!
//! The central registry of live connections and their topic memberships.
//! Both maps live behind a single lock so registry and subscription
//! mutations for a given connection are atomic with respect to each other.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::stats::HubStats;

use super::connection::{ConnectionEntry, ConnectionId, ConnectionInfo, OutboundSender};
use super::error::HubError;

struct HubState {
    /// Live connection records
    connections: HashMap<ConnectionId, ConnectionEntry>,
    /// Topic memberships, keyed like `connections`; entries are created
    /// and destroyed together with the connection record
    subscriptions: HashMap<ConnectionId, HashSet<String>>,
}

/// Shared hub state for the router and the scheduler
///
/// Thread-safe via `RwLock`. Fan-out reads (`subscribers_of`, membership
/// checks) take the read lock; only lifecycle and subscribe events write.
pub struct Hub {
    state: RwLock<HubState>,

    /// Mirrors `connections.len()` so the scheduler's per-tick emptiness
    /// check never touches the lock
    active_count: AtomicUsize,
}

impl Hub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HubState {
                connections: HashMap::new(),
                subscriptions: HashMap::new(),
            }),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Register a new connection
    ///
    /// Creates the connection record and its empty membership set in one
    /// step. Fails if the id is already present; a correct transport layer
    /// never reuses ids, but the invariant is checked regardless.
    pub async fn register(
        &self,
        id: ConnectionId,
        peer_addr: Option<SocketAddr>,
        sender: OutboundSender,
    ) -> Result<(), HubError> {
        let mut state = self.state.write().await;

        if state.connections.contains_key(&id) {
            return Err(HubError::DuplicateConnection(id));
        }

        state
            .connections
            .insert(id, ConnectionEntry::new(peer_addr, sender));
        state.subscriptions.insert(id, HashSet::new());
        self.active_count.fetch_add(1, Ordering::Relaxed);

        tracing::info!(conn = %id, peer = ?peer_addr, "Connection registered");
        Ok(())
    }

    /// Remove a connection and all of its subscription state
    ///
    /// No-op when the id is absent; disconnect events can arrive after
    /// cleanup already happened.
    pub async fn unregister(&self, id: ConnectionId) {
        let mut state = self.state.write().await;

        let removed = state.connections.remove(&id).is_some();
        let topics = state.subscriptions.remove(&id).map(|s| s.len());

        if removed {
            self.active_count.fetch_sub(1, Ordering::Relaxed);
            tracing::info!(conn = %id, topics = topics.unwrap_or(0), "Connection unregistered");
        } else {
            tracing::debug!(conn = %id, "Unregister for unknown connection ignored");
        }
    }

    /// Snapshot of all live connection ids, for diagnostics
    pub async fn connection_ids(&self) -> Vec<ConnectionId> {
        self.state.read().await.connections.keys().copied().collect()
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Metadata snapshot for one connection
    pub async fn connection_info(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.state.read().await.connections.get(&id).map(|e| e.info())
    }

    /// Add a topic to a connection's membership set
    ///
    /// Idempotent: returns `true` only when the topic was newly added.
    /// A subscribe arriving for an id that is no longer registered is
    /// dropped rather than recreating state for a dead connection.
    pub async fn subscribe(&self, id: ConnectionId, topic: &str) -> bool {
        let mut state = self.state.write().await;

        match state.subscriptions.get_mut(&id) {
            Some(topics) => {
                let added = topics.insert(topic.to_string());
                if added {
                    tracing::info!(conn = %id, topic = %topic, "Subscribed");
                } else {
                    tracing::debug!(conn = %id, topic = %topic, "Repeat subscribe ignored");
                }
                added
            }
            None => {
                tracing::debug!(conn = %id, topic = %topic, "Subscribe for unknown connection dropped");
                false
            }
        }
    }

    /// Check whether a connection is subscribed to a topic
    pub async fn is_subscribed(&self, id: ConnectionId, topic: &str) -> bool {
        self.state
            .read()
            .await
            .subscriptions
            .get(&id)
            .is_some_and(|topics| topics.contains(topic))
    }

    /// Point-in-time snapshot of every member of a topic
    ///
    /// Joint lifecycle with the connection map guarantees the snapshot
    /// never names an id whose connection record is gone.
    pub async fn members_of(&self, topic: &str) -> Vec<ConnectionId> {
        self.state
            .read()
            .await
            .subscriptions
            .iter()
            .filter(|(_, topics)| topics.contains(topic))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Snapshot of every member of a topic with its outbound queue handle
    ///
    /// The scheduler sends against this copy, so a disconnect arriving
    /// mid-fan-out only surfaces as a failed send on an already-cloned
    /// handle, never as a torn iteration.
    pub async fn subscribers_of(&self, topic: &str) -> Vec<(ConnectionId, OutboundSender)> {
        let state = self.state.read().await;
        state
            .subscriptions
            .iter()
            .filter(|(_, topics)| topics.contains(topic))
            .filter_map(|(id, _)| state.connections.get(id).map(|e| (*id, e.sender.clone())))
            .collect()
    }

    /// Remove all subscription state for a connection, keeping the
    /// connection itself registered
    pub async fn clear(&self, id: ConnectionId) {
        let mut state = self.state.write().await;
        if let Some(topics) = state.subscriptions.get_mut(&id) {
            let dropped = topics.len();
            topics.clear();
            tracing::debug!(conn = %id, dropped = dropped, "Subscriptions cleared");
        }
    }

    /// Queue a pre-serialized envelope to one connection
    pub async fn send_to(&self, id: ConnectionId, payload: Arc<String>) -> Result<(), HubError> {
        let state = self.state.read().await;
        let entry = state
            .connections
            .get(&id)
            .ok_or(HubError::ConnectionNotFound(id))?;

        entry.sender.send(payload).map_err(|_| HubError::SendFailed(id))
    }

    /// Membership statistics snapshot
    pub async fn stats(&self) -> HubStats {
        let state = self.state.read().await;
        let mut topics: HashSet<&str> = HashSet::new();
        let mut subscriptions = 0;

        for set in state.subscriptions.values() {
            subscriptions += set.len();
            topics.extend(set.iter().map(String::as_str));
        }

        HubStats {
            connections: state.connections.len(),
            topics: topics.len(),
            subscriptions,
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
