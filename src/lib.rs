//! Real-time WebSocket pub/sub hub with periodic frame broadcast
//!
//! Clients connect over a websocket, declare interest in named topics, and
//! receive a continuous stream of server-generated frames on the well-known
//! `stream_frames` topic. A direct request/response path serves single
//! frames outside the periodic stream.
//!
//! # Architecture
//!
//! ```text
//!   WebSocket ──► session ──► EventRouter ──► Hub (connections + topics)
//!                    ▲                          │
//!                    │        subscribers_of()  │
//!                    └── outbound queue ◄── Broadcaster ◄── FrameProducer
//!                                               ▲
//!                                          tick interval
//! ```
//!
//! The hub is the single shared-state object; the router mutates it per
//! inbound event and the broadcaster reads it once per tick. Fan-out is
//! best-effort: a dead subscriber costs one failed queue push, nothing
//! more.
//!
//! # Quick start
//!
//! ```no_run
//! use framecast::{HubServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> framecast::Result<()> {
//!     let config = ServerConfig::default();
//!     let server = HubServer::new(config);
//!     server.run().await
//! }
//! ```

pub mod broadcast;
pub mod error;
pub mod frame;
pub mod hub;
pub mod protocol;
pub mod router;
pub mod server;
pub mod stats;

pub use broadcast::Broadcaster;
pub use error::{Error, Result};
pub use frame::{Frame, FrameProducer, ProduceError};
pub use hub::{ConnectionId, Hub, HubError};
pub use protocol::{ClientEvent, ServerEvent, DEFAULT_STREAM_TOPIC};
pub use router::{DataHandler, EventRouter, NullDataHandler};
pub use server::{HubServer, ServerConfig};
pub use stats::{BroadcastStats, HubStats};
