//! Per-connection websocket session
//!
//! Each accepted socket gets one task owning both halves of the upgraded
//! websocket: inbound frames feed the event router, and the connection's
//! outbound queue drains into the sink. The task ending, for any reason,
//! always routes a disconnect so hub state is cleaned up exactly once.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

use crate::hub::ConnectionId;
use crate::router::EventRouter;

/// Check an `Origin` header against the configured allow-list
///
/// An empty allow-list accepts any origin, including none at all.
fn origin_allowed(allowed_origins: &[String], origin: Option<&str>) -> bool {
    if allowed_origins.is_empty() {
        return true;
    }
    match origin {
        Some(origin) => allowed_origins.iter().any(|allowed| allowed == origin),
        None => false,
    }
}

/// Accept the websocket handshake and run the session to completion
pub(crate) async fn run(
    socket: TcpStream,
    peer_addr: SocketAddr,
    id: ConnectionId,
    router: Arc<EventRouter>,
    allowed_origins: Vec<String>,
) {
    let check_origin = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        let origin = req.headers().get("origin").and_then(|v| v.to_str().ok());
        if origin_allowed(&allowed_origins, origin) {
            Ok(resp)
        } else {
            tracing::warn!(
                conn = %id,
                peer = %peer_addr,
                origin = ?origin,
                "Handshake rejected: origin not allowed"
            );
            let mut reject = ErrorResponse::new(None);
            *reject.status_mut() = StatusCode::FORBIDDEN;
            Err(reject)
        }
    };

    let ws = match tokio_tungstenite::accept_hdr_async(socket, check_origin).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(conn = %id, peer = %peer_addr, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Registration also queues the welcome envelope; the loop below
    // flushes it as its first outbound send. A rejected registration must
    // not fall through to disconnect handling for the id it collided with.
    if !router.on_connect(id, Some(peer_addr), tx).await {
        return;
    }

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(json) => {
                    if let Err(e) = sink.send(Message::Text((*json).clone())).await {
                        tracing::debug!(conn = %id, error = %e, "Send failed, closing session");
                        break;
                    }
                }
                // Hub dropped the queue: connection was unregistered elsewhere
                None => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => router.on_message(id, &text).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Binary(_))) => {
                    tracing::debug!(conn = %id, "Binary message ignored");
                }
                // Ping/pong and raw frames are handled by the library
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(conn = %id, error = %e, "Receive failed");
                    break;
                }
            },
        }
    }

    router.on_disconnect(id).await;
    tracing::info!(conn = %id, peer = %peer_addr, "Session closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_allow_list_accepts_any_origin() {
        assert!(origin_allowed(&[], Some("http://localhost:3000")));
        assert!(origin_allowed(&[], None));
    }

    #[test]
    fn test_listed_origin_is_accepted() {
        let allowed = vec![
            "http://localhost:3000".to_string(),
            "https://app.example.com".to_string(),
        ];

        assert!(origin_allowed(&allowed, Some("http://localhost:3000")));
        assert!(origin_allowed(&allowed, Some("https://app.example.com")));
    }

    #[test]
    fn test_unlisted_or_missing_origin_is_rejected() {
        let allowed = vec!["http://localhost:3000".to_string()];

        assert!(!origin_allowed(&allowed, Some("https://evil.example.com")));
        assert!(!origin_allowed(&allowed, None));
    }
}
