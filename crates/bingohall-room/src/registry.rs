//! The room registry: every live room, keyed by code.
//!
//! The registry is the only owner of room state. Rooms are the single
//! record of membership: a connection is resolved to its room by looking
//! it up among the members. Each method applies one client request
//! completely and returns the deliveries it produced; the caller holds the
//! registry lock until those are queued.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use bingohall_protocol::{Delivery, PlayerId, Position, RoomCode, ServerEvent};
use bingohall_transport::ConnectionId;
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Player, Room, RoomConfig, RoomError};

/// Room codes are five-digit numbers.
const CODE_RANGE: std::ops::Range<u32> = 10_000..100_000;

/// Length of generated player ids.
const PLAYER_ID_LEN: usize = 12;

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Result of a successful create or join.
#[derive(Debug)]
pub struct Joined {
    pub code: RoomCode,
    pub player_id: PlayerId,
    pub deliveries: Vec<Delivery>,
}

/// Result of a successful kick. The dispatcher closes `connection`.
#[derive(Debug)]
pub struct Kicked {
    pub connection: ConnectionId,
    pub deliveries: Vec<Delivery>,
}

/// Where a connection currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub code: RoomCode,
    pub player_id: PlayerId,
    pub username: String,
}

#[derive(Debug, Clone, Copy)]
enum Departure {
    Left,
    Kicked,
}

/// Owns every live room.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    config: RoomConfig,
    rng: StdRng,
}

impl RoomRegistry {
    /// Creates an empty registry seeded from the OS.
    ///
    /// # Errors
    /// Returns [`RoomError::Board`] if `config` cannot produce boards.
    pub fn new(config: RoomConfig) -> Result<Self, RoomError> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates a registry with deterministic codes, ids and boards.
    ///
    /// # Errors
    /// Returns [`RoomError::Board`] if `config` cannot produce boards.
    pub fn with_seed(config: RoomConfig, seed: u64) -> Result<Self, RoomError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RoomConfig, rng: StdRng) -> Result<Self, RoomError> {
        config.validate()?;
        Ok(Self {
            rooms: HashMap::new(),
            config,
            rng,
        })
    }

    /// The settings every room runs with.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    // -- Queries --------------------------------------------------------

    /// Looks up a room.
    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if `code` names a live room.
    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Resolves a connection to its room and player.
    pub fn locate(&self, connection: ConnectionId) -> Option<Membership> {
        let (room, player) = self.rooms.values().find_map(|room| {
            room.member_by_connection(connection)
                .map(|player| (room, player))
        })?;
        Some(Membership {
            code: room.code().clone(),
            player_id: player.id.clone(),
            username: player.username.clone(),
        })
    }

    // -- Membership -----------------------------------------------------

    /// Opens a new room with the caller as leader.
    ///
    /// Any room the caller was already in is left first.
    ///
    /// # Errors
    /// - [`RoomError::InvalidUsername`]
    /// - [`RoomError::NoFreeCodes`]
    pub fn create_room(
        &mut self,
        connection: ConnectionId,
        username: &str,
    ) -> Result<Joined, RoomError> {
        let username = self.validate_username(username)?;
        let code = self.unused_code()?;

        let mut deliveries = self.remove_member(connection);

        let player_id = self.unused_player_id();
        let room = Room::new(
            code.clone(),
            Player::new(player_id.clone(), connection, username),
        );
        deliveries.push(room.unicast(
            connection,
            ServerEvent::RoomCode {
                room_code: code.clone(),
                client_id: player_id.clone(),
            },
        ));

        tracing::info!(room = %code, %connection, %player_id, "room created");
        self.rooms.insert(code.clone(), room);

        Ok(Joined {
            code,
            player_id,
            deliveries,
        })
    }

    /// Adds the caller to an existing room.
    ///
    /// Any other room the caller was in is left first. Joining while a round
    /// runs makes the caller a spectator of that round.
    ///
    /// # Errors
    /// - [`RoomError::InvalidUsername`]
    /// - [`RoomError::NotFound`]: no such room
    /// - [`RoomError::AlreadyInRoom`]: caller is already a member
    /// - [`RoomError::RoomFull`]
    pub fn join_room(
        &mut self,
        connection: ConnectionId,
        code: &RoomCode,
        username: &str,
    ) -> Result<Joined, RoomError> {
        let username = self.validate_username(username)?;
        let room = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if room.member_by_connection(connection).is_some() {
            return Err(RoomError::AlreadyInRoom(code.clone()));
        }
        if room.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(code.clone()));
        }

        let mut deliveries = self.remove_member(connection);
        let player_id = self.unused_player_id();

        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        room.add(Player::new(player_id.clone(), connection, username.clone()));
        deliveries.push(room.unicast(
            connection,
            ServerEvent::RoomCode {
                room_code: code.clone(),
                client_id: player_id.clone(),
            },
        ));
        deliveries.push(room.broadcast(
            ServerEvent::announcement(format!("{username} joined the room")),
            Some(connection),
        ));

        tracing::info!(
            room = %code,
            %connection,
            %player_id,
            mid_round = room.state().is_in_game(),
            "player joined"
        );

        Ok(Joined {
            code: code.clone(),
            player_id,
            deliveries,
        })
    }

    /// Takes a connection out of every room that lists it.
    ///
    /// Safe to call for connections that are in no room.
    pub fn remove_member(&mut self, connection: ConnectionId) -> Vec<Delivery> {
        let codes: Vec<RoomCode> = self
            .rooms
            .values()
            .filter(|room| room.member_by_connection(connection).is_some())
            .map(|room| room.code().clone())
            .collect();
        codes
            .iter()
            .flat_map(|code| self.depart(code, connection, Departure::Left))
            .collect()
    }

    /// Confirms the departure to the caller, then removes them.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] / [`RoomError::NotInRoom`]
    pub fn leave(
        &mut self,
        connection: ConnectionId,
        code: &RoomCode,
    ) -> Result<Vec<Delivery>, RoomError> {
        let room = self.member_room(connection, code)?;
        let mut deliveries = vec![room.unicast(connection, ServerEvent::Leave)];
        deliveries.extend(self.depart(code, connection, Departure::Left));
        Ok(deliveries)
    }

    /// Removes another member on the leader's behalf.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] / [`RoomError::NotInRoom`]
    /// - [`RoomError::NotLeader`] / [`RoomError::CannotKickSelf`]
    /// - [`RoomError::PlayerNotFound`]: no member has `target`
    pub fn kick(
        &mut self,
        connection: ConnectionId,
        code: &RoomCode,
        target: &PlayerId,
    ) -> Result<Kicked, RoomError> {
        let room = self.member_room(connection, code)?;
        let caller = room.leader_caller(connection)?;
        if &caller.id == target {
            return Err(RoomError::CannotKickSelf);
        }
        let victim = room
            .member(target)
            .ok_or_else(|| RoomError::PlayerNotFound(target.clone()))?
            .connection;

        tracing::info!(room = %code, %target, "player kicked");
        Ok(Kicked {
            connection: victim,
            deliveries: self.depart(code, victim, Departure::Kicked),
        })
    }

    // -- Room actions ---------------------------------------------------

    /// Relays a chat line to the rest of the room.
    ///
    /// # Errors
    /// [`RoomError::NotFound`], [`RoomError::NotInRoom`],
    /// [`RoomError::EmptyMessage`]
    pub fn chat(
        &self,
        connection: ConnectionId,
        code: &RoomCode,
        text: &str,
    ) -> Result<Vec<Delivery>, RoomError> {
        let room = self.find(code)?;
        Ok(vec![room.chat(connection, text)?])
    }

    /// Starts a round. See [`Room::start`].
    ///
    /// # Errors
    /// [`RoomError::NotFound`] plus everything [`Room::start`] returns.
    pub fn start_round(
        &mut self,
        connection: ConnectionId,
        code: &RoomCode,
    ) -> Result<Vec<Delivery>, RoomError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        room.start(connection, &self.config, &mut self.rng, now_millis())
    }

    /// Toggles a cell. See [`Room::toggle`].
    ///
    /// # Errors
    /// [`RoomError::NotFound`] plus everything [`Room::toggle`] returns.
    pub fn toggle_cell(
        &mut self,
        connection: ConnectionId,
        code: &RoomCode,
        position: Option<Position>,
    ) -> Result<Vec<Delivery>, RoomError> {
        let size = self.config.leaderboard_size;
        self.find_mut(code)?
            .toggle(connection, position, now_millis(), size)
    }

    /// Ends the round. See [`Room::end`].
    ///
    /// # Errors
    /// [`RoomError::NotFound`] plus everything [`Room::end`] returns.
    pub fn end_round(
        &mut self,
        connection: ConnectionId,
        code: &RoomCode,
    ) -> Result<Vec<Delivery>, RoomError> {
        let size = self.config.leaderboard_size;
        self.find_mut(code)?.end(connection, now_millis(), size)
    }

    // -- Internals ------------------------------------------------------

    fn find(&self, code: &RoomCode) -> Result<&Room, RoomError> {
        self.rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    fn find_mut(&mut self, code: &RoomCode) -> Result<&mut Room, RoomError> {
        self.rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    fn member_room(&self, connection: ConnectionId, code: &RoomCode) -> Result<&Room, RoomError> {
        let room = self.find(code)?;
        room.caller(connection)?;
        Ok(room)
    }

    /// Removes one member and handles everything that follows from it:
    /// deleting an empty room, announcing the departure, promoting a new
    /// leader, and ending a round nobody can still win.
    fn depart(
        &mut self,
        code: &RoomCode,
        connection: ConnectionId,
        reason: Departure,
    ) -> Vec<Delivery> {
        let Some(room) = self.rooms.get_mut(code) else {
            return Vec::new();
        };
        let Some(removal) = room.remove(connection) else {
            return Vec::new();
        };

        tracing::info!(
            room = %code,
            %connection,
            player_id = %removal.player.id,
            ?reason,
            "player left"
        );

        if room.is_empty() {
            self.rooms.remove(code);
            tracing::info!(room = %code, "room closed");
            return Vec::new();
        }

        let name = &removal.player.username;
        let text = match reason {
            Departure::Left => format!("{name} left the room"),
            Departure::Kicked => format!("{name} was kicked from the room"),
        };
        let mut deliveries = vec![room.broadcast(ServerEvent::announcement(text), None)];

        if let Some(new_leader) = removal.promoted {
            tracing::info!(room = %code, connection = %new_leader, "leader promoted");
            deliveries.push(room.unicast(
                new_leader,
                ServerEvent::Permission {
                    text: "You got promoted to room master".into(),
                },
            ));
        }

        if room.state().is_in_game() && room.everyone_has_bingo() {
            deliveries.extend(room.finish(now_millis(), self.config.leaderboard_size));
        }
        deliveries
    }

    fn validate_username(&self, username: &str) -> Result<String, RoomError> {
        let trimmed = username.trim();
        let len = trimmed.chars().count();
        if len == 0 || len > self.config.max_username_len {
            return Err(RoomError::InvalidUsername {
                max: self.config.max_username_len,
            });
        }
        Ok(trimmed.to_string())
    }

    fn unused_code(&mut self) -> Result<RoomCode, RoomError> {
        if self.rooms.len() >= CODE_RANGE.len() {
            return Err(RoomError::NoFreeCodes);
        }
        loop {
            let code = RoomCode(self.rng.random_range(CODE_RANGE).to_string());
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
        }
    }

    fn unused_player_id(&mut self) -> PlayerId {
        loop {
            let id = PlayerId(
                (&mut self.rng)
                    .sample_iter(Alphanumeric)
                    .take(PLAYER_ID_LEN)
                    .map(char::from)
                    .collect(),
            );
            let taken = self.rooms.values().any(|room| room.member(&id).is_some());
            if !taken {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RoomRegistry {
        RoomRegistry::with_seed(RoomConfig::default(), 42).unwrap()
    }

    #[test]
    fn test_codes_are_five_digits() {
        let mut reg = registry();
        for n in 0..20 {
            let joined = reg.create_room(ConnectionId::new(n), "host").unwrap();
            let code = joined.code.as_str();
            assert_eq!(code.len(), 5);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
        assert_eq!(reg.room_count(), 20);
    }

    #[test]
    fn test_player_ids_are_alphanumeric() {
        let mut reg = registry();
        let joined = reg.create_room(ConnectionId::new(1), "host").unwrap();
        assert_eq!(joined.player_id.as_str().len(), PLAYER_ID_LEN);
        assert!(joined.player_id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_username_is_trimmed_and_bounded() {
        let mut reg = registry();
        let conn = ConnectionId::new(1);

        assert!(matches!(
            reg.create_room(conn, "   "),
            Err(RoomError::InvalidUsername { max: 13 })
        ));
        assert!(matches!(
            reg.create_room(conn, "fourteen_chars"),
            Err(RoomError::InvalidUsername { .. })
        ));

        reg.create_room(conn, "  thirteen_chr  ").unwrap();
        assert_eq!(reg.locate(conn).unwrap().username, "thirteen_chr");
    }

    #[test]
    fn test_locate_follows_room_membership() {
        let mut reg = registry();
        let host = ConnectionId::new(1);
        let guest = ConnectionId::new(2);

        let first = reg.create_room(host, "host").unwrap().code;
        let second = reg.create_room(guest, "guest").unwrap().code;
        reg.join_room(host, &second, "host").unwrap();

        // Moving rooms leaves the old one, which closes once empty.
        assert_eq!(reg.locate(host).unwrap().code, second);
        assert!(!reg.contains(&first));

        reg.leave(host, &second).unwrap();
        assert!(reg.locate(host).is_none());
        assert!(reg.remove_member(host).is_empty());

        reg.remove_member(guest);
        assert!(reg.locate(guest).is_none());
        assert_eq!(reg.room_count(), 0);
    }

    #[test]
    fn test_now_millis_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RoomConfig {
            board_size: 2,
            ..RoomConfig::default()
        };
        assert!(matches!(
            RoomRegistry::with_seed(config, 1),
            Err(RoomError::Board(_))
        ));
    }
}
