//! Rooms and their members.
//!
//! A [`Room`] owns its members in join order. Leadership is tracked by
//! player id and handed to the earliest remaining member when the leader
//! goes. All fan-out goes through [`Room::broadcast`] and [`Room::unicast`],
//! which attach a roster snapshot taken at that moment.

use bingohall_board::Board;
use bingohall_protocol::{
    Delivery, Outgoing, PlayerId, PlayerSummary, RoomCode, ServerEvent,
};
use bingohall_transport::ConnectionId;

use crate::{GameState, RoomError};

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A member of a room.
#[derive(Debug, Clone)]
pub struct Player {
    /// Server-issued id, unique among live players.
    pub id: PlayerId,

    /// The socket this player is bound to.
    pub connection: ConnectionId,

    /// Display name, already trimmed.
    pub username: String,

    /// `true` when dealt into the current round.
    pub in_game: bool,

    /// This round's board. `None` outside a round and for mid-round joiners.
    pub board: Option<Board>,

    /// When this round's bingo happened, in Unix milliseconds.
    pub bingo_at: Option<u64>,
}

impl Player {
    /// A new lobby-only member.
    pub fn new(id: PlayerId, connection: ConnectionId, username: impl Into<String>) -> Self {
        Self {
            id,
            connection,
            username: username.into(),
            in_game: false,
            board: None,
            bingo_at: None,
        }
    }

    /// Returns `true` once this player has completed a line this round.
    pub fn has_bingo(&self) -> bool {
        self.bingo_at.is_some()
    }

    /// Checked cells on the current board, 0 without one.
    pub fn checked_cells(&self) -> usize {
        self.board.as_ref().map_or(0, Board::checked_count)
    }

    pub(crate) fn reset_round(&mut self) {
        self.in_game = false;
        self.board = None;
        self.bingo_at = None;
    }

    fn summary(&self, leader: bool) -> PlayerSummary {
        PlayerSummary {
            id: self.id.clone(),
            username: self.username.clone(),
            leader,
            in_game: self.in_game,
            checked_cells: self.checked_cells(),
            bingo: self.has_bingo(),
        }
    }
}

/// What [`Room::remove`] took out, and who took over if it was the leader.
#[derive(Debug)]
pub(crate) struct Removal {
    pub player: Player,
    pub promoted: Option<ConnectionId>,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One room: its members, its leader, and its round state.
#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    leader: PlayerId,
    members: Vec<Player>,
    pub(crate) state: GameState,
}

impl Room {
    /// Creates a room with `founder` as its only member and leader.
    pub fn new(code: RoomCode, founder: Player) -> Self {
        Self {
            code,
            leader: founder.id.clone(),
            members: vec![founder],
            state: GameState::Lobby,
        }
    }

    /// The room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// The current leader's id.
    pub fn leader(&self) -> &PlayerId {
        &self.leader
    }

    /// Current round state.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Members in join order.
    pub fn members(&self) -> &[Player] {
        &self.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` once the last member has gone.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Looks up a member by player id.
    pub fn member(&self, id: &PlayerId) -> Option<&Player> {
        self.members.iter().find(|p| &p.id == id)
    }

    /// Looks up a member by connection.
    pub fn member_by_connection(&self, connection: ConnectionId) -> Option<&Player> {
        self.members.iter().find(|p| p.connection == connection)
    }

    pub(crate) fn member_by_connection_mut(
        &mut self,
        connection: ConnectionId,
    ) -> Option<&mut Player> {
        self.members.iter_mut().find(|p| p.connection == connection)
    }

    pub(crate) fn members_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.members.iter_mut()
    }

    /// Returns `true` if `connection` belongs to the current leader.
    pub fn is_leader(&self, connection: ConnectionId) -> bool {
        self.member_by_connection(connection)
            .is_some_and(|p| p.id == self.leader)
    }

    /// Resolves a caller to their membership, or `NotInRoom`.
    pub(crate) fn caller(&self, connection: ConnectionId) -> Result<&Player, RoomError> {
        self.member_by_connection(connection)
            .ok_or_else(|| RoomError::NotInRoom(self.code.clone()))
    }

    /// Resolves a caller and checks they lead the room.
    pub(crate) fn leader_caller(&self, connection: ConnectionId) -> Result<&Player, RoomError> {
        let player = self.caller(connection)?;
        if player.id != self.leader {
            return Err(RoomError::NotLeader);
        }
        Ok(player)
    }

    pub(crate) fn add(&mut self, player: Player) {
        self.members.push(player);
    }

    /// Takes a member out. If they led the room, the earliest remaining
    /// member becomes leader.
    pub(crate) fn remove(&mut self, connection: ConnectionId) -> Option<Removal> {
        let index = self
            .members
            .iter()
            .position(|p| p.connection == connection)?;
        let player = self.members.remove(index);

        let mut promoted = None;
        if player.id == self.leader {
            if let Some(next) = self.members.first() {
                self.leader = next.id.clone();
                promoted = Some(next.connection);
            }
        }
        Some(Removal { player, promoted })
    }

    // -- Fan-out --------------------------------------------------------

    /// The roster as clients see it.
    pub fn player_list(&self) -> Vec<PlayerSummary> {
        self.members
            .iter()
            .map(|p| p.summary(p.id == self.leader))
            .collect()
    }

    /// Addresses `event` to every member except `exclude`.
    pub fn broadcast(&self, event: ServerEvent, exclude: Option<ConnectionId>) -> Delivery {
        let targets = self
            .members
            .iter()
            .map(|p| p.connection)
            .filter(|c| Some(*c) != exclude)
            .collect();
        Delivery {
            targets,
            message: Outgoing::with_players(event, self.player_list()),
        }
    }

    /// Addresses `event` to a single member's connection.
    pub fn unicast(&self, connection: ConnectionId, event: ServerEvent) -> Delivery {
        Delivery::to(
            connection,
            Outgoing::with_players(event, self.player_list()),
        )
    }

    /// Relays a chat line from `connection` to everyone else.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`]: the caller is not a member
    /// - [`RoomError::EmptyMessage`]: `text` is blank
    pub fn chat(&self, connection: ConnectionId, text: &str) -> Result<Delivery, RoomError> {
        let sender = self.caller(connection)?;
        if text.trim().is_empty() {
            return Err(RoomError::EmptyMessage);
        }
        Ok(self.broadcast(
            ServerEvent::Message {
                username: Some(sender.username.clone()),
                text: text.to_string(),
            },
            Some(connection),
        ))
    }
}
