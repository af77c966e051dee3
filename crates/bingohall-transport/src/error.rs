//! Error types for the transport layer.

use std::io;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listening socket could not be opened.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The peer connected but the WebSocket upgrade did not complete.
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    /// The peer did not finish the WebSocket upgrade in time.
    #[error("websocket handshake with {0} timed out")]
    HandshakeTimeout(std::net::SocketAddr),

    /// The connection was already closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
}
