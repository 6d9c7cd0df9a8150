//! Inbound event routing
//!
//! One router instance serves every connection. Each handler is contained
//! at the dispatch boundary: malformed or unexpected input is logged and
//! dropped, never propagated, so one misbehaving client cannot affect
//! other connections or the broadcast loop.

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;

use crate::frame::FrameProducer;
use crate::hub::{ConnectionId, Hub, OutboundSender};
use crate::protocol::{ClientEvent, ImageExchange, ServerEvent, TopicSpec};

/// Longest malformed-input sample quoted in logs
const LOG_SAMPLE_CHARS: usize = 120;

/// Extension hook for generic data events
///
/// The router records generic data messages and otherwise performs no
/// state change for them; implement this to attach application behavior.
pub trait DataHandler: Send + Sync {
    /// Called once per `handle_data` event with the raw payload
    fn on_data(&self, id: ConnectionId, payload: &Value);
}

/// Default [`DataHandler`] that does nothing
#[derive(Debug, Default)]
pub struct NullDataHandler;

impl DataHandler for NullDataHandler {
    fn on_data(&self, _id: ConnectionId, _payload: &Value) {}
}

/// Dispatches inbound protocol events to hub mutations and replies
pub struct EventRouter {
    hub: Arc<Hub>,
    producer: Arc<FrameProducer>,
    data_handler: Arc<dyn DataHandler>,
}

impl EventRouter {
    /// Create a router with the default no-op data handler
    pub fn new(hub: Arc<Hub>, producer: Arc<FrameProducer>) -> Self {
        Self::with_data_handler(hub, producer, Arc::new(NullDataHandler))
    }

    /// Create a router with a custom data handler
    pub fn with_data_handler(
        hub: Arc<Hub>,
        producer: Arc<FrameProducer>,
        data_handler: Arc<dyn DataHandler>,
    ) -> Self {
        Self {
            hub,
            producer,
            data_handler,
        }
    }

    /// Handle a new transport session
    ///
    /// Registers the connection and greets it. A duplicate id is rejected
    /// and logged; the caller must then drop the session without routing a
    /// disconnect, so the original connection's state stays intact.
    pub async fn on_connect(
        &self,
        id: ConnectionId,
        peer_addr: Option<SocketAddr>,
        sender: OutboundSender,
    ) -> bool {
        if let Err(e) = self.hub.register(id, peer_addr, sender).await {
            tracing::error!(conn = %id, error = %e, "Registration rejected");
            return false;
        }

        self.send(id, &ServerEvent::welcome(id)).await;
        true
    }

    /// Handle the end of a transport session
    pub async fn on_disconnect(&self, id: ConnectionId) {
        self.hub.clear(id).await;
        self.hub.unregister(id).await;
    }

    /// Dispatch one inbound text message
    pub async fn on_message(&self, id: ConnectionId, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(ClientEvent::Subscribe { payload }) => self.handle_subscribe(id, payload).await,
            Ok(ClientEvent::RequestImage { payload }) => {
                self.handle_request_image(id, payload).await
            }
            Ok(ClientEvent::HandleData { payload }) => self.handle_data(id, payload).await,
            Err(e) => {
                let sample: String = text.chars().take(LOG_SAMPLE_CHARS).collect();
                tracing::warn!(conn = %id, error = %e, sample = %sample, "Malformed message dropped");
            }
        }
    }

    async fn handle_subscribe(&self, id: ConnectionId, spec: TopicSpec) {
        let topic = spec.into_topic();
        self.hub.subscribe(id, &topic).await;

        // Confirmation goes out on every subscribe request, repeats included
        self.send(id, &ServerEvent::subscription_confirmed(&topic)).await;
    }

    async fn handle_request_image(&self, id: ConnectionId, req: ImageExchange) {
        match req.kind.as_str() {
            "request" => match self.producer.produce() {
                Ok(frame) => {
                    tracing::debug!(conn = %id, frame = %frame.name, "Image request served");
                    self.send(id, &ServerEvent::image_response(&frame)).await;
                }
                Err(e) => {
                    tracing::warn!(conn = %id, error = %e, "Image request failed");
                }
            },
            "feedback" => {
                tracing::info!(conn = %id, message = ?req.message, "Client feedback");
            }
            other => {
                tracing::debug!(conn = %id, kind = %other, "Unrecognized image exchange");
            }
        }
    }

    async fn handle_data(&self, id: ConnectionId, payload: Value) {
        tracing::debug!(conn = %id, payload = %payload, "Data message received");
        self.data_handler.on_data(id, &payload);
    }

    /// Serialize and queue a reply to one connection
    ///
    /// Delivery failures are expected during disconnect races and only
    /// logged.
    async fn send(&self, id: ConnectionId, event: &ServerEvent) {
        let json = match event.encode() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(conn = %id, error = %e, "Failed to serialize reply");
                return;
            }
        };

        if let Err(e) = self.hub.send_to(id, json).await {
            tracing::debug!(conn = %id, error = %e, "Reply dropped");
        }
    }
}
