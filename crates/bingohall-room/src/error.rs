//! Error types for the room layer.

use std::fmt;

use bingohall_board::BoardError;
use bingohall_protocol::{PlayerId, RoomCode};

/// Why a request was rejected, independent of the exact cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself was malformed.
    Validation,
    /// It names a room or player that does not exist.
    NotFound,
    /// The caller is not allowed to do this.
    Permission,
    /// The room is not in a state that allows this.
    State,
    /// No room for one more.
    Capacity,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::NotFound => "not found",
            Self::Permission => "permission",
            Self::State => "state",
            Self::Capacity => "capacity",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during room operations.
///
/// The `Display` text is sent verbatim to the client that caused it.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Username empty after trimming, or too long.
    #[error("username must be between 1 and {max} characters")]
    InvalidUsername { max: usize },

    /// Move coordinates missing or off the board.
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// Chat text was empty.
    #[error("message cannot be empty")]
    EmptyMessage,

    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// No member of the room has this id.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// The caller is not a member of the room it addressed.
    #[error("you are not in room {0}")]
    NotInRoom(RoomCode),

    /// Only the leader may do this.
    #[error("only the room master can do that")]
    NotLeader,

    /// The leader tried to kick themselves.
    #[error("you cannot kick yourself")]
    CannotKickSelf,

    /// The room is in a state that doesn't allow this operation.
    #[error("{0}")]
    InvalidState(String),

    /// The caller is already a member of this room.
    #[error("you are already in room {0}")]
    AlreadyInRoom(RoomCode),

    /// The room already holds the maximum number of members.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// Every room code is taken.
    #[error("no free room codes left")]
    NoFreeCodes,

    /// A room setting is out of range.
    #[error("invalid room configuration: {0}")]
    InvalidConfig(String),

    /// The board settings cannot produce a board.
    #[error("board configuration error: {0}")]
    Board(#[from] BoardError),
}

impl RoomError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUsername { .. }
            | Self::InvalidMove(_)
            | Self::EmptyMessage
            | Self::InvalidConfig(_)
            | Self::Board(_) => ErrorKind::Validation,
            Self::NotFound(_) | Self::PlayerNotFound(_) | Self::NotInRoom(_) => {
                ErrorKind::NotFound
            }
            Self::NotLeader | Self::CannotKickSelf => ErrorKind::Permission,
            Self::InvalidState(_) | Self::AlreadyInRoom(_) => ErrorKind::State,
            Self::RoomFull(_) | Self::NoFreeCodes => ErrorKind::Capacity,
        }
    }
}
