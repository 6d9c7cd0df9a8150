//! Connection and subscription hub
//!
//! The hub tracks live connections, their topic memberships, and the
//! outbound queue handle used to reach each one. It is the shared state
//! object read by the broadcast scheduler and mutated by the event router.
//!
//! # Architecture
//!
//! ```text
//!                           Arc<Hub>
//!                ┌─────────────────────────────┐
//!                │ connections: HashMap<Id,    │
//!                │   ConnectionEntry {         │
//!                │     connected_at,           │
//!                │     peer_addr,              │
//!                │     sender: mpsc::Tx,       │
//!                │   }                         │
//!                │ >                           │
//!                │ subscriptions: HashMap<Id,  │
//!                │   HashSet<topic>>           │
//!                └──────────┬──────────────────┘
//!                           │
//!            ┌──────────────┴──────────────┐
//!            ▼                             ▼
//!      [Event Router]             [Broadcast Scheduler]
//!      register / subscribe       subscribers_of(topic)
//!      send_to(id)                      │
//!            └────► per-connection queue ──► session ──► WebSocket
//! ```
//!
//! # Joint lifecycle
//!
//! Both maps sit behind a single `RwLock`. A connection's membership set is
//! created by `register` and destroyed by `unregister`, so a disconnect
//! racing a subscribe for the same id can never leave topic membership
//! behind for a connection that no longer exists, and a membership snapshot
//! can never name an id whose connection record is already gone.

pub mod connection;
pub mod error;
pub mod store;

pub use connection::{ConnectionId, ConnectionInfo, OutboundSender};
pub use error::HubError;
pub use store::Hub;
