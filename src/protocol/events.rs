//! Event envelope types
//!
//! Inbound events mirror what clients send; outbound events carry fixed
//! payload shapes. Constructors build outbound envelopes straight from
//! domain types so call sites never assemble JSON by hand.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::frame::Frame;
use crate::hub::ConnectionId;

/// Well-known topic gating the periodic frame broadcast
pub const DEFAULT_STREAM_TOPIC: &str = "stream_frames";

/// Events received from clients
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Join a topic
    Subscribe {
        #[serde(default)]
        payload: TopicSpec,
    },
    /// Request/response image exchange, or freeform feedback on the same
    /// event name
    RequestImage {
        #[serde(default)]
        payload: ImageExchange,
    },
    /// Generic structured data; recorded for diagnostics, not acted upon
    HandleData {
        #[serde(default)]
        payload: Value,
    },
}

/// Topic argument of a subscribe event
///
/// Clients send either a bare string or an object with a `topic` field; a
/// missing field defaults to the empty string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TopicSpec {
    /// `"topic_name"`
    Name(String),
    /// `{"topic": "topic_name"}`
    Fields {
        #[serde(default)]
        topic: String,
    },
}

impl TopicSpec {
    /// Extract the topic string
    pub fn into_topic(self) -> String {
        match self {
            TopicSpec::Name(name) => name,
            TopicSpec::Fields { topic } => topic,
        }
    }
}

impl Default for TopicSpec {
    fn default() -> Self {
        TopicSpec::Fields {
            topic: String::new(),
        }
    }
}

/// Payload of the bidirectional `request_image` event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageExchange {
    /// `"request"` asks for a frame, `"feedback"` carries a message
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Freeform feedback text
    #[serde(default)]
    pub message: Option<String>,
}

/// Events sent to clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Greeting sent once per connection
    Welcome { payload: Welcome },
    /// Acknowledgement of a subscribe event
    SubscriptionConfirmed { payload: SubscriptionConfirmed },
    /// Reply to a direct image request
    RequestImage { payload: ImageResponse },
    /// Periodic broadcast frame
    StreamFrames { payload: FrameEnvelope },
}

impl ServerEvent {
    /// Build the greeting for a newly registered connection
    pub fn welcome(client_id: ConnectionId) -> Self {
        ServerEvent::Welcome {
            payload: Welcome {
                message: "Connected to framecast hub".to_string(),
                server_time: chrono::Utc::now().to_rfc3339(),
                client_id,
            },
        }
    }

    /// Build a subscription acknowledgement
    pub fn subscription_confirmed(topic: impl Into<String>) -> Self {
        ServerEvent::SubscriptionConfirmed {
            payload: SubscriptionConfirmed {
                topic: topic.into(),
                status: "subscribed".to_string(),
            },
        }
    }

    /// Build the reply to a direct image request
    pub fn image_response(frame: &Frame) -> Self {
        ServerEvent::RequestImage {
            payload: ImageResponse {
                kind: "response".to_string(),
                image_data: ImagePayload::from(frame),
            },
        }
    }

    /// Build the broadcast envelope for one frame
    pub fn stream_frames(frame: &Frame) -> Self {
        ServerEvent::StreamFrames {
            payload: FrameEnvelope {
                title: "send_frames".to_string(),
                data: FrameData {
                    frame_name: frame.name.clone(),
                    frame_data: frame.data_base64(),
                },
            },
        }
    }

    /// Serialize to the shared wire form
    ///
    /// The `Arc` lets a broadcast serialize once and queue the same text to
    /// every recipient.
    pub fn encode(&self) -> Result<Arc<String>, serde_json::Error> {
        serde_json::to_string(self).map(Arc::new)
    }
}

/// `welcome` payload
#[derive(Debug, Clone, Serialize)]
pub struct Welcome {
    pub message: String,
    /// Server wall-clock time, RFC 3339
    pub server_time: String,
    pub client_id: ConnectionId,
}

/// `subscription_confirmed` payload
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionConfirmed {
    pub topic: String,
    pub status: String,
}

/// `request_image` response payload
#[derive(Debug, Clone, Serialize)]
pub struct ImageResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub image_data: ImagePayload,
}

/// External shape of one frame's content
#[derive(Debug, Clone, Serialize)]
pub struct ImagePayload {
    pub img_name: String,
    pub base_64_img: String,
    /// Generation timestamp, RFC 3339
    pub timestamp: String,
    pub width: u32,
    pub height: u32,
}

impl From<&Frame> for ImagePayload {
    fn from(frame: &Frame) -> Self {
        Self {
            img_name: frame.image_name(),
            base_64_img: frame.data_base64(),
            timestamp: frame.timestamp.to_rfc3339(),
            width: frame.width,
            height: frame.height,
        }
    }
}

/// `stream_frames` broadcast payload
#[derive(Debug, Clone, Serialize)]
pub struct FrameEnvelope {
    pub title: String,
    pub data: FrameData,
}

/// Frame content within the broadcast envelope
///
/// Dimensions and timestamp are informational and intentionally omitted
/// here; subscribers that need them use the direct request path.
#[derive(Debug, Clone, Serialize)]
pub struct FrameData {
    pub frame_name: String,
    /// Image bytes as base64 text
    pub frame_data: String,
}
