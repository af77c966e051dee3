//! Per-connection handler: session registration, heartbeat, and the
//! read/write loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The task is the only writer of its socket. Everything addressed to the
//! connection arrives through its outbound queue, which the loop drains
//! alongside incoming frames.

use std::sync::Arc;
use std::time::Duration;

use bingohall_protocol::Codec;
use bingohall_session::{Outbound, outbound_channel};
use bingohall_transport::{
    Connection, ConnectionId, Frame, PendingConnection, PendingWebSocket, TransportError,
};
use tokio::time::{Instant, MissedTickBehavior};

use crate::BingoError;
use crate::dispatch;
use crate::server::ServerState;

/// Drop guard that takes a connection out of its room and the session
/// table when the handler exits, however it exits.
///
/// `Drop` is synchronous, so the async cleanup runs in its own task.
struct SessionGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for SessionGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        runtime.spawn(async move {
            let mut rooms = state.rooms.lock().await;
            let deliveries = rooms.remove_member(conn_id);
            let mut sessions = state.sessions.lock().await;
            dispatch::deliver(&state.codec, &sessions, &deliveries);
            let _ = sessions.disconnect(conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
///
/// The upgrade is bounded by the handshake timeout. A peer that fails it
/// never gets a session.
pub(crate) async fn handle_connection<C: Codec>(
    pending: PendingWebSocket,
    state: Arc<ServerState<C>>,
) -> Result<(), BingoError> {
    let addr = pending.peer_addr();
    let conn = tokio::time::timeout(state.handshake_timeout, pending.upgrade())
        .await
        .map_err(|_| TransportError::HandshakeTimeout(addr))??;
    let conn_id = conn.id();
    let (tx, mut outbound) = outbound_channel();

    // Register and arm the guard together: if registration fails there is
    // nothing to clean up.
    state.sessions.lock().await.register(conn_id, tx)?;
    let _guard = SessionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    let idle_timeout = state.idle_timeout;
    // `interval_at` panics on a zero period.
    let period = state.heartbeat_interval.max(Duration::from_millis(1));
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let idle = tokio::time::sleep(idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            frame = conn.recv() => {
                let frame = match frame {
                    Ok(Some(frame)) => frame,
                    Ok(None) => {
                        tracing::info!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut().reset(Instant::now() + idle_timeout);
                if let Frame::Data(data) = frame {
                    dispatch::handle_frame(&state, conn_id, &data).await?;
                }
            }

            queued = outbound.recv() => match queued {
                Some(Outbound::Frame(bytes)) => conn.send(&bytes).await?,
                Some(Outbound::Close) => {
                    tracing::info!(%conn_id, "closing connection");
                    let _ = conn.close().await;
                    break;
                }
                None => break,
            },

            _ = heartbeat.tick() => conn.ping().await?,

            () = &mut idle => {
                tracing::info!(%conn_id, "connection timed out");
                break;
            }
        }
    }

    // _guard drops here → room and session cleanup fires.
    Ok(())
}
