//! Inbound message routing and outbound fan-out.
//!
//! A decoded [`ClientMessage`] is applied to the room registry while its
//! lock is held, and every [`Delivery`] it produces is encoded once and
//! queued on the target sessions before the lock is released. That keeps
//! each request atomic and keeps every client's messages in processing
//! order.

use bingohall_protocol::{ClientMessage, Codec, Delivery, Outgoing, ServerEvent};
use bingohall_room::{RoomError, RoomRegistry};
use bingohall_session::SessionManager;
use bingohall_transport::ConnectionId;

use crate::BingoError;
use crate::server::ServerState;

/// What a routed request produced.
#[derive(Debug, Default)]
pub(crate) struct Routed {
    pub(crate) deliveries: Vec<Delivery>,
    /// A connection to close once the deliveries are queued (kicks).
    pub(crate) close: Option<ConnectionId>,
}

impl From<Vec<Delivery>> for Routed {
    fn from(deliveries: Vec<Delivery>) -> Self {
        Self {
            deliveries,
            close: None,
        }
    }
}

/// Decodes one inbound frame, applies it, and queues the results.
///
/// Rejected and undecodable requests are answered with an `error` to the
/// caller only; the connection stays open.
pub(crate) async fn handle_frame<C: Codec>(
    state: &ServerState<C>,
    conn: ConnectionId,
    data: &[u8],
) -> Result<(), BingoError> {
    let msg: ClientMessage = match state.codec.decode(data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(%conn, error = %e, "failed to decode message");
            return reply(state, conn, ServerEvent::error(e.to_string())).await;
        }
    };

    if matches!(msg, ClientMessage::Ping) {
        return reply(state, conn, ServerEvent::Pong).await;
    }

    let mut rooms = state.rooms.lock().await;
    let outcome = route(&mut rooms, conn, msg);
    let sessions = state.sessions.lock().await;

    match outcome {
        Ok(routed) => {
            deliver(&state.codec, &sessions, &routed.deliveries);
            if let Some(target) = routed.close {
                if let Err(e) = sessions.close(target) {
                    tracing::debug!(%target, error = %e, "kicked connection already gone");
                }
            }
        }
        Err(e) => {
            tracing::debug!(%conn, kind = %e.kind(), error = %e, "request rejected");
            let bytes = state
                .codec
                .encode(&Outgoing::bare(ServerEvent::error(e.to_string())))?;
            sessions.send(conn, bytes)?;
        }
    }
    Ok(())
}

/// Applies one request to the registry.
pub(crate) fn route(
    rooms: &mut RoomRegistry,
    conn: ConnectionId,
    msg: ClientMessage,
) -> Result<Routed, RoomError> {
    match msg {
        ClientMessage::Join { username, room } => {
            let joined = match room.filter(|code| !code.is_blank()) {
                Some(code) => rooms.join_room(conn, &code, &username)?,
                None => rooms.create_room(conn, &username)?,
            };
            Ok(joined.deliveries.into())
        }
        ClientMessage::Message { room, text } => rooms.chat(conn, &room, &text).map(Into::into),
        ClientMessage::Start { room } => rooms.start_round(conn, &room).map(Into::into),
        ClientMessage::Move { room, value } => {
            rooms.toggle_cell(conn, &room, value).map(Into::into)
        }
        ClientMessage::End { room } => rooms.end_round(conn, &room).map(Into::into),
        ClientMessage::Leave { room } => rooms.leave(conn, &room).map(Into::into),
        ClientMessage::Kick { room, client_id } => {
            let kicked = rooms.kick(conn, &room, &client_id)?;
            Ok(Routed {
                deliveries: kicked.deliveries,
                close: Some(kicked.connection),
            })
        }
        ClientMessage::Ping => Ok(Routed::default()),
    }
}

/// Encodes each delivery once and queues it for every target.
pub(crate) fn deliver<C: Codec>(codec: &C, sessions: &SessionManager, deliveries: &[Delivery]) {
    for delivery in deliveries {
        match codec.encode(&delivery.message) {
            Ok(bytes) => {
                sessions.push_to(&delivery.targets, &bytes);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to encode outgoing message");
            }
        }
    }
}

/// Sends an event without a roster to the caller alone.
async fn reply<C: Codec>(
    state: &ServerState<C>,
    conn: ConnectionId,
    event: ServerEvent,
) -> Result<(), BingoError> {
    let bytes = state.codec.encode(&Outgoing::bare(event))?;
    state.sessions.lock().await.send(conn, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingohall_protocol::{PlayerId, RoomCode};
    use bingohall_room::RoomConfig;

    const HOST: ConnectionId = ConnectionId::new(1);
    const GUEST: ConnectionId = ConnectionId::new(2);

    fn registry() -> RoomRegistry {
        RoomRegistry::with_seed(RoomConfig::default(), 9).unwrap()
    }

    fn join(username: &str, room: Option<&str>) -> ClientMessage {
        ClientMessage::Join {
            username: username.into(),
            room: room.map(|r| RoomCode(r.into())),
        }
    }

    #[test]
    fn test_join_without_room_creates_one() {
        let mut rooms = registry();
        let routed = route(&mut rooms, HOST, join("host", None)).unwrap();
        assert_eq!(rooms.room_count(), 1);
        assert!(matches!(
            routed.deliveries[0].message.event,
            ServerEvent::RoomCode { .. }
        ));
    }

    #[test]
    fn test_join_with_blank_room_creates_one() {
        let mut rooms = registry();
        route(&mut rooms, HOST, join("host", Some(""))).unwrap();
        assert_eq!(rooms.room_count(), 1);
    }

    #[test]
    fn test_join_with_code_joins_existing_room() {
        let mut rooms = registry();
        route(&mut rooms, HOST, join("host", None)).unwrap();
        let code = rooms.locate(HOST).unwrap().code;

        route(&mut rooms, GUEST, join("guest", Some(code.as_str()))).unwrap();
        assert_eq!(rooms.room_count(), 1);
        assert_eq!(rooms.room(&code).unwrap().len(), 2);
    }

    #[test]
    fn test_kick_requests_close_of_target() {
        let mut rooms = registry();
        route(&mut rooms, HOST, join("host", None)).unwrap();
        let code = rooms.locate(HOST).unwrap().code;
        route(&mut rooms, GUEST, join("guest", Some(code.as_str()))).unwrap();
        let guest_id = rooms.locate(GUEST).unwrap().player_id;

        let routed = route(
            &mut rooms,
            HOST,
            ClientMessage::Kick {
                room: code,
                client_id: guest_id,
            },
        )
        .unwrap();
        assert_eq!(routed.close, Some(GUEST));
    }

    #[test]
    fn test_errors_surface_from_registry() {
        let mut rooms = registry();
        let err = route(
            &mut rooms,
            HOST,
            ClientMessage::Kick {
                room: RoomCode("10000".into()),
                client_id: PlayerId("x".into()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, RoomError::NotFound(_)));
    }
}
