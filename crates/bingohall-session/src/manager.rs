//! The session manager: the table of live connections.
//!
//! Like the rest of the server's shared state, `SessionManager` is a plain
//! `HashMap` with no locking of its own. The server wraps it in a mutex and
//! takes that lock after the room lock, never before.

use std::collections::HashMap;

use bingohall_transport::ConnectionId;

use crate::{Outbound, OutboundSender, Session, SessionError};

/// Tracks every connection that is currently open.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ send() / push_to() ... ──→ close() ──→ disconnect()
/// ```
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<ConnectionId, Session>,
}

impl SessionManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly accepted connection.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyConnected`] if `id` is already live.
    pub fn register(
        &mut self,
        id: ConnectionId,
        sender: OutboundSender,
    ) -> Result<&Session, SessionError> {
        if self.sessions.contains_key(&id) {
            return Err(SessionError::AlreadyConnected(id));
        }

        tracing::info!(%id, "session registered");
        Ok(self
            .sessions
            .entry(id)
            .or_insert_with(|| Session::new(id, sender)))
    }

    /// Forgets a connection and returns its session.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session exists.
    pub fn disconnect(&mut self, id: ConnectionId) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(&id)
            .ok_or(SessionError::NotFound(id))?;

        tracing::info!(
            %id,
            connected_for = ?session.connected_at.elapsed(),
            "session ended"
        );
        Ok(session)
    }

    /// Queues one encoded frame for a connection.
    ///
    /// A session whose writer has already exited is not an error here:
    /// the frame is dropped and the connection's own cleanup removes it.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if `id` is not registered.
    pub fn send(&self, id: ConnectionId, frame: Vec<u8>) -> Result<(), SessionError> {
        let session = self.sessions.get(&id).ok_or(SessionError::NotFound(id))?;
        if !session.push(frame) {
            tracing::debug!(%id, "outbound queue closed, frame dropped");
        }
        Ok(())
    }

    /// Queues the same frame for several connections.
    ///
    /// Connections that are no longer registered are skipped. Returns how
    /// many frames were queued.
    pub fn push_to(&self, targets: &[ConnectionId], frame: &[u8]) -> usize {
        targets
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .filter(|session| session.push(frame.to_vec()))
            .count()
    }

    /// Asks a connection's writer to close the socket.
    ///
    /// Frames queued earlier are still flushed first.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if `id` is not registered.
    pub fn close(&self, id: ConnectionId) -> Result<(), SessionError> {
        let session = self.sessions.get(&id).ok_or(SessionError::NotFound(id))?;
        // Ignored: a closed queue means the writer is already gone.
        let _ = session.sender.send(Outbound::Close);
        tracing::debug!(%id, "close requested");
        Ok(())
    }

    /// Looks up a session.
    pub fn get(&self, id: ConnectionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound_channel;

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    #[test]
    fn test_register_and_get() {
        let mut mgr = SessionManager::new();
        let (tx, _rx) = outbound_channel();

        let session = mgr.register(conn(1), tx).unwrap();
        assert_eq!(session.id, conn(1));
        assert!(mgr.contains(conn(1)));
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_register_twice_fails() {
        let mut mgr = SessionManager::new();
        let (tx, _rx) = outbound_channel();
        mgr.register(conn(1), tx.clone()).unwrap();

        let result = mgr.register(conn(1), tx);
        assert!(matches!(result, Err(SessionError::AlreadyConnected(id)) if id == conn(1)));
    }

    #[test]
    fn test_disconnect_removes_session() {
        let mut mgr = SessionManager::new();
        let (tx, _rx) = outbound_channel();
        mgr.register(conn(1), tx).unwrap();

        let session = mgr.disconnect(conn(1)).unwrap();
        assert_eq!(session.id, conn(1));
        assert!(mgr.is_empty());
        assert!(matches!(
            mgr.disconnect(conn(1)),
            Err(SessionError::NotFound(_))
        ));
    }

    #[test]
    fn test_send_queues_frame() {
        let mut mgr = SessionManager::new();
        let (tx, mut rx) = outbound_channel();
        mgr.register(conn(1), tx).unwrap();

        mgr.send(conn(1), b"hello".to_vec()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Outbound::Frame(b"hello".to_vec()));
    }

    #[test]
    fn test_send_to_unknown_connection_is_not_found() {
        let mgr = SessionManager::new();
        assert!(matches!(
            mgr.send(conn(9), b"x".to_vec()),
            Err(SessionError::NotFound(id)) if id == conn(9)
        ));
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let mut mgr = SessionManager::new();
        let (tx, rx) = outbound_channel();
        mgr.register(conn(1), tx).unwrap();
        drop(rx);

        assert!(mgr.send(conn(1), b"late".to_vec()).is_ok());
    }

    #[test]
    fn test_push_to_skips_unknown_and_counts_delivered() {
        let mut mgr = SessionManager::new();
        let (tx1, mut rx1) = outbound_channel();
        let (tx2, mut rx2) = outbound_channel();
        mgr.register(conn(1), tx1).unwrap();
        mgr.register(conn(2), tx2).unwrap();

        let queued = mgr.push_to(&[conn(1), conn(2), conn(3)], b"hi");
        assert_eq!(queued, 2);
        assert_eq!(rx1.try_recv().unwrap(), Outbound::Frame(b"hi".to_vec()));
        assert_eq!(rx2.try_recv().unwrap(), Outbound::Frame(b"hi".to_vec()));
    }

    #[test]
    fn test_close_is_queued_after_pending_frames() {
        let mut mgr = SessionManager::new();
        let (tx, mut rx) = outbound_channel();
        mgr.register(conn(1), tx).unwrap();

        mgr.send(conn(1), b"bye".to_vec()).unwrap();
        mgr.close(conn(1)).unwrap();

        assert_eq!(rx.try_recv().unwrap(), Outbound::Frame(b"bye".to_vec()));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Close);
    }
}
