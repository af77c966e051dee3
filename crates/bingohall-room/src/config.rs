//! Room configuration and the round state machine.

use bingohall_board::{BoardError, Vocabulary};
use serde::{Deserialize, Serialize};

use crate::RoomError;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room on a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Maximum members per room.
    pub max_players: usize,

    /// Maximum username length, counted in characters after trimming.
    pub max_username_len: usize,

    /// Board edge length. Must be odd so there is a centre cell.
    pub board_size: usize,

    /// How many entries the end-of-round leaderboard keeps.
    pub leaderboard_size: usize,

    /// Labels boards are drawn from.
    pub vocabulary: Vocabulary,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 10,
            max_username_len: 13,
            board_size: 5,
            leaderboard_size: 3,
            vocabulary: Vocabulary::classic(),
        }
    }
}

impl RoomConfig {
    /// Checks that rooms can be joined and boards generated with these
    /// settings.
    ///
    /// # Errors
    /// - [`RoomError::InvalidConfig`]: a limit is zero
    /// - [`RoomError::Board`]: the error board generation would fail with
    pub fn validate(&self) -> Result<(), RoomError> {
        for (name, value) in [
            ("max_players", self.max_players),
            ("max_username_len", self.max_username_len),
            ("leaderboard_size", self.leaderboard_size),
        ] {
            if value == 0 {
                return Err(RoomError::InvalidConfig(format!("{name} must be at least 1")));
            }
        }

        let size = self.board_size;
        if size == 0 {
            return Err(BoardError::ZeroSize.into());
        }
        if size % 2 == 0 {
            return Err(BoardError::EvenSize(size).into());
        }
        let needed = size * size - 1;
        if self.vocabulary.len() < needed {
            return Err(BoardError::PoolTooSmall {
                needed,
                available: self.vocabulary.len(),
            }
            .into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// Where a room is in its round cycle.
///
/// ```text
/// Lobby ──start──→ InGame ──end / everyone got bingo──→ Lobby
/// ```
///
/// The "round over" moment is not a resting state: the leaderboard is
/// computed and the room drops straight back to `Lobby`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// Waiting for the leader to start a round.
    Lobby,
    /// A round is running. `started_at` is in Unix milliseconds.
    InGame { started_at: u64 },
}

impl GameState {
    /// Returns `true` while a round is running.
    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::InGame { .. })
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::InGame { .. } => write!(f, "InGame"),
        }
    }
}
