//! Crate-level error type
//!
//! Errors surfaced by the server entry points. Per-subsystem errors
//! (`HubError`, `ProduceError`) stay contained in their modules and are
//! logged rather than propagated; only listener-level failures reach here.

use tokio_tungstenite::tungstenite;

/// Crate-level result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for server operations
#[derive(Debug)]
pub enum Error {
    /// I/O error (bind, accept, socket configuration)
    Io(std::io::Error),
    /// WebSocket handshake or protocol error
    WebSocket(tungstenite::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::WebSocket(e) => write!(f, "WebSocket error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::WebSocket(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<tungstenite::Error> for Error {
    fn from(e: tungstenite::Error) -> Self {
        Error::WebSocket(e)
    }
}
