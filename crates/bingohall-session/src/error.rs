//! Error types for the session layer.

use bingohall_transport::ConnectionId;

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A session is already registered for this connection.
    #[error("connection {0} already has a session")]
    AlreadyConnected(ConnectionId),

    /// No session exists for the given connection. It either never
    /// registered or has already disconnected.
    #[error("session not found for {0}")]
    NotFound(ConnectionId),
}
