//! Unified error type for Bingohall.

use bingohall_board::BoardError;
use bingohall_protocol::ProtocolError;
use bingohall_room::RoomError;
use bingohall_session::SessionError;
use bingohall_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BingoError {
    /// A transport-level error (bind, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (unknown or duplicate connection).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (rejected request, bad configuration).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Unusable board settings.
    #[error(transparent)]
    Board(#[from] BoardError),
}
