//! Wire protocol: the inbound/outbound event catalog
//!
//! Every websocket text message is one JSON envelope tagged by an `event`
//! field carrying an event-specific `payload`. Inbound shapes are lenient:
//! missing fields take documented defaults instead of failing the
//! connection.

pub mod events;

pub use events::{
    ClientEvent, FrameData, FrameEnvelope, ImageExchange, ImagePayload, ImageResponse,
    ServerEvent, SubscriptionConfirmed, TopicSpec, Welcome, DEFAULT_STREAM_TOPIC,
};
