//! Hub error types
//!
//! Error types for registry and delivery operations. All of these are
//! contained at the call site (logged, never propagated past the router or
//! scheduler).

use super::connection::ConnectionId;

/// Error type for hub operations
#[derive(Debug, Clone)]
pub enum HubError {
    /// Connection id is already registered
    DuplicateConnection(ConnectionId),
    /// Connection id is not present in the registry
    ConnectionNotFound(ConnectionId),
    /// The connection's outbound queue is closed (session has ended)
    SendFailed(ConnectionId),
}

impl std::fmt::Display for HubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HubError::DuplicateConnection(id) => {
                write!(f, "Connection already registered: {}", id)
            }
            HubError::ConnectionNotFound(id) => write!(f, "Connection not found: {}", id),
            HubError::SendFailed(id) => write!(f, "Send failed, session gone: {}", id),
        }
    }
}

impl std::error::Error for HubError {}
