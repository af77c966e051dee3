//! Session types: one live connection and the queue feeding it.

use std::time::Instant;

use bingohall_transport::ConnectionId;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Outbound queue
// ---------------------------------------------------------------------------

/// An instruction for a connection's writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// An encoded message to write to the socket.
    Frame(Vec<u8>),
    /// Close the socket once everything queued before this has been sent.
    Close,
}

/// Sending half of a connection's outbound queue.
///
/// Unbounded so that fan-out under the room lock never waits on a slow
/// client.
pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Receiving half, owned by the connection task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Creates a fresh outbound queue.
pub fn outbound_channel() -> (OutboundSender, OutboundReceiver) {
    mpsc::unbounded_channel()
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A live connection as the server sees it.
#[derive(Debug, Clone)]
pub struct Session {
    /// Which socket this is.
    pub id: ConnectionId,

    /// Where to push messages for this connection.
    pub sender: OutboundSender,

    /// When the connection registered.
    pub connected_at: Instant,
}

impl Session {
    /// Creates a session that starts now.
    pub fn new(id: ConnectionId, sender: OutboundSender) -> Self {
        Self {
            id,
            sender,
            connected_at: Instant::now(),
        }
    }

    /// Queues a frame. Returns `false` if the writer has already gone away.
    pub fn push(&self, frame: Vec<u8>) -> bool {
        self.sender.send(Outbound::Frame(frame)).is_ok()
    }
}
