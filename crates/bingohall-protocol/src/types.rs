//! Core protocol types for Bingohall's wire format.
//!
//! Every message is a flat JSON object whose `type` field names the
//! message. Field names are camelCase because the clients are browsers.

use std::fmt;

use bingohall_board::Board;
use bingohall_transport::ConnectionId;
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A server-generated player token (opaque, alphanumeric).
///
/// Serialized as a plain JSON string. Clients use it to target kicks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A short numeric room code, e.g. `"48213"`.
///
/// Always serialized as a string. Deserialization also accepts a JSON
/// number, since room codes are typed into numeric inputs client-side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for an empty (or whitespace-only) code.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RoomCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(code) => RoomCode(code.trim().to_string()),
            Raw::Number(code) => RoomCode(code.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Cell coordinates of a move: `x` is the row, `y` the column.
///
/// Both are optional on the wire so a missing coordinate can be reported
/// as a validation error instead of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: Option<i64>,
    pub y: Option<i64>,
}

/// Everything a client can ask the server to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Join `room`, or create a new room when `room` is missing or empty.
    Join {
        #[serde(default)]
        username: String,
        #[serde(default)]
        room: Option<RoomCode>,
    },

    /// Chat to everyone else in the room.
    Message {
        room: RoomCode,
        #[serde(default)]
        text: String,
    },

    /// Start a round (leader only).
    Start { room: RoomCode },

    /// Toggle one cell of the caller's board.
    Move {
        room: RoomCode,
        #[serde(default)]
        value: Option<Position>,
    },

    /// End the round (leader only).
    End { room: RoomCode },

    /// Leave the room.
    Leave { room: RoomCode },

    /// Remove another member (leader only).
    Kick { room: RoomCode, client_id: PlayerId },

    /// Liveness probe; answered with [`ServerEvent::Pong`].
    Ping,
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// One row of the roster attached to almost every server message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub username: String,
    pub leader: bool,
    pub in_game: bool,
    pub checked_cells: usize,
    pub bingo: bool,
}

/// A ranked result shown when a round ends.
///
/// Timestamps are milliseconds since the Unix epoch. Players who never got
/// a bingo carry the round's end time as their `bingo_timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub bingo: bool,
    pub bingo_timestamp: u64,
    pub game_timestamp: u64,
    pub checked_cells: usize,
}

/// Everything the server can tell a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// You are in `room_code`, identified as `client_id`.
    RoomCode {
        room_code: RoomCode,
        client_id: PlayerId,
    },

    /// Chat line or server announcement (no `username`).
    Message {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        text: String,
    },

    /// You are now the room leader.
    Permission { text: String },

    /// A round began; this is your board.
    GameStarted { board: Board },

    /// Your board after a move.
    Board { board: Board },

    /// Your board completed a line.
    Bingo { board: Board },

    /// The round is over.
    GameEnded { leaderboard: Vec<LeaderboardEntry> },

    /// You left the room.
    Leave,

    /// Your last request was rejected.
    Error { message: String },

    /// Reply to [`ClientMessage::Ping`].
    Pong,
}

impl ServerEvent {
    /// A server announcement with no author.
    pub fn announcement(text: impl Into<String>) -> Self {
        Self::Message {
            username: None,
            text: text.into(),
        }
    }

    /// An error reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// A server event as it goes on the wire: the event's own fields plus,
/// for everything except `pong`/`error`, the room's current roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outgoing {
    #[serde(flatten)]
    pub event: ServerEvent,

    #[serde(
        rename = "playerList",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub player_list: Option<Vec<PlayerSummary>>,
}

impl Outgoing {
    /// An event with no roster attached.
    pub fn bare(event: ServerEvent) -> Self {
        Self {
            event,
            player_list: None,
        }
    }

    /// An event carrying a roster snapshot.
    pub fn with_players(event: ServerEvent, players: Vec<PlayerSummary>) -> Self {
        Self {
            event,
            player_list: Some(players),
        }
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// A message addressed to a set of connections.
///
/// The room layer resolves recipients at the moment it builds the
/// delivery; the dispatcher only encodes and fans out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub targets: Vec<ConnectionId>,
    pub message: Outgoing,
}

impl Delivery {
    /// A delivery to exactly one connection.
    pub fn to(connection: ConnectionId, message: Outgoing) -> Self {
        Self {
            targets: vec![connection],
            message,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
