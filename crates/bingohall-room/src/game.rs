//! The bingo round: dealing boards, moves, and the leaderboard.
//!
//! Timestamps are passed in by the caller (Unix milliseconds) so rounds
//! can be replayed deterministically.

use std::cmp::Reverse;

use bingohall_board::generate_board;
use bingohall_protocol::{Delivery, LeaderboardEntry, Position, ServerEvent};
use bingohall_transport::ConnectionId;
use rand::Rng;

use crate::{GameState, Room, RoomConfig, RoomError};

impl Room {
    /// Starts a round: every member is dealt a fresh board.
    ///
    /// Each member privately receives `gameStarted` with their own board.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`] / [`RoomError::NotLeader`]
    /// - [`RoomError::InvalidState`]: a round is already running
    /// - [`RoomError::Board`]: the board settings are unusable
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        connection: ConnectionId,
        config: &RoomConfig,
        rng: &mut R,
        now: u64,
    ) -> Result<Vec<Delivery>, RoomError> {
        self.leader_caller(connection)?;
        if self.state.is_in_game() {
            return Err(RoomError::InvalidState("game already in progress".into()));
        }

        // Deal everything before touching any member so a failure leaves
        // the room as it was.
        let boards = (0..self.len())
            .map(|_| generate_board(config.board_size, &config.vocabulary, rng))
            .collect::<Result<Vec<_>, _>>()?;

        for (player, board) in self.members_mut().zip(boards) {
            player.in_game = true;
            player.board = Some(board);
            player.bingo_at = None;
        }
        self.state = GameState::InGame { started_at: now };

        tracing::info!(room = %self.code(), players = self.len(), "round started");

        Ok(self
            .members()
            .iter()
            .filter_map(|p| {
                let board = p.board.clone()?;
                Some(self.unicast(p.connection, ServerEvent::GameStarted { board }))
            })
            .collect())
    }

    /// Toggles one cell of the caller's board.
    ///
    /// A player who already has a bingo is ignored. When the move completes
    /// a line and everyone dealt in now has a bingo, the round ends.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`]: caller is not a member
    /// - [`RoomError::InvalidState`]: no round, or caller was not dealt in
    /// - [`RoomError::InvalidMove`]: coordinates missing or off the board
    pub fn toggle(
        &mut self,
        connection: ConnectionId,
        position: Option<Position>,
        now: u64,
        leaderboard_size: usize,
    ) -> Result<Vec<Delivery>, RoomError> {
        self.caller(connection)?;
        if !self.state.is_in_game() {
            return Err(RoomError::InvalidState("no game in progress".into()));
        }

        let code = self.code().clone();
        let player = self
            .member_by_connection_mut(connection)
            .ok_or(RoomError::NotInRoom(code))?;
        if !player.in_game {
            return Err(RoomError::InvalidState("you are not playing this round".into()));
        }
        if player.has_bingo() {
            return Ok(Vec::new());
        }
        let Some(board) = player.board.as_mut() else {
            return Err(RoomError::InvalidState("you are not playing this round".into()));
        };

        let (x, y) = coordinates(position, board.size())?;
        board.toggle(x, y)?;

        let won = board.is_bingo();
        let checked = board.checked_count();
        let total = board.cell_count();
        let board = board.clone();
        if won {
            player.bingo_at = Some(now);
        }
        let username = player.username.clone();

        let mut deliveries = Vec::new();
        if won {
            tracing::info!(room = %self.code(), %username, "bingo");
            deliveries.push(self.unicast(connection, ServerEvent::Bingo { board }));
            deliveries.push(self.broadcast(
                ServerEvent::announcement(format!("{username} got a BINGO!")),
                None,
            ));
            if self.everyone_has_bingo() {
                deliveries.extend(self.finish(now, leaderboard_size));
            }
        } else {
            deliveries.push(self.unicast(connection, ServerEvent::Board { board }));
            deliveries.push(self.broadcast(
                ServerEvent::announcement(format!(
                    "{username} has {checked}/{total} cells checked"
                )),
                Some(connection),
            ));
        }
        Ok(deliveries)
    }

    /// Ends the round on the leader's request.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`] / [`RoomError::NotLeader`]
    /// - [`RoomError::InvalidState`]: no round is running
    pub fn end(
        &mut self,
        connection: ConnectionId,
        now: u64,
        leaderboard_size: usize,
    ) -> Result<Vec<Delivery>, RoomError> {
        self.leader_caller(connection)?;
        if !self.state.is_in_game() {
            return Err(RoomError::InvalidState("no game in progress".into()));
        }
        Ok(self.finish(now, leaderboard_size))
    }

    /// Ranks everyone dealt into the round.
    ///
    /// Finishers rank by bingo time. Players without a bingo are given `now`
    /// as their finish time, so among them more checked cells ranks higher.
    pub fn leaderboard(&self, now: u64, size: usize) -> Vec<LeaderboardEntry> {
        let started_at = match self.state {
            GameState::InGame { started_at } => started_at,
            GameState::Lobby => now,
        };

        let mut entries: Vec<LeaderboardEntry> = self
            .members()
            .iter()
            .filter(|p| p.in_game)
            .map(|p| LeaderboardEntry {
                username: p.username.clone(),
                bingo: p.has_bingo(),
                bingo_timestamp: p.bingo_at.unwrap_or(now),
                game_timestamp: started_at,
                checked_cells: p.checked_cells(),
            })
            .collect();
        entries.sort_by_key(|e| (e.bingo_timestamp, Reverse(e.checked_cells)));
        entries.truncate(size);
        entries
    }

    /// Returns `true` when every member dealt into the round has a bingo.
    /// Vacuously `true` when nobody dealt in is left.
    pub(crate) fn everyone_has_bingo(&self) -> bool {
        self.members()
            .iter()
            .filter(|p| p.in_game)
            .all(|p| p.has_bingo())
    }

    /// Closes the round: computes the leaderboard, returns everyone to the
    /// lobby, and announces `gameEnded`.
    pub(crate) fn finish(&mut self, now: u64, leaderboard_size: usize) -> Vec<Delivery> {
        let leaderboard = self.leaderboard(now, leaderboard_size);
        for player in self.members_mut() {
            player.reset_round();
        }
        self.state = GameState::Lobby;

        tracing::info!(room = %self.code(), ranked = leaderboard.len(), "round ended");
        vec![self.broadcast(ServerEvent::GameEnded { leaderboard }, None)]
    }
}

/// Converts wire coordinates into board indices.
fn coordinates(position: Option<Position>, size: usize) -> Result<(usize, usize), RoomError> {
    let Some(Position {
        x: Some(x),
        y: Some(y),
    }) = position
    else {
        return Err(RoomError::InvalidMove("missing coordinates".into()));
    };

    let index = |v: i64| usize::try_from(v).ok().filter(|v| *v < size);
    match (index(x), index(y)) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(RoomError::InvalidMove(format!(
            "cell ({x}, {y}) is outside the board"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Player;
    use bingohall_protocol::{PlayerId, RoomCode};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const ALICE: ConnectionId = ConnectionId::new(1);
    const BOB: ConnectionId = ConnectionId::new(2);

    fn room_with(names: &[&str]) -> Room {
        let mut members = names.iter().enumerate().map(|(i, name)| {
            let n = i as u64 + 1;
            Player::new(PlayerId(format!("p{n}")), ConnectionId::new(n), *name)
        });
        let mut room = match members.next() {
            Some(founder) => Room::new(RoomCode("10000".into()), founder),
            None => panic!("need at least one member"),
        };
        for p in members {
            room.add(p);
        }
        room
    }

    fn started(names: &[&str]) -> Room {
        let mut room = room_with(names);
        let mut rng = StdRng::seed_from_u64(7);
        room.start(ALICE, &RoomConfig::default(), &mut rng, 1_000).unwrap();
        room
    }

    fn pos(x: i64, y: i64) -> Option<Position> {
        Some(Position {
            x: Some(x),
            y: Some(y),
        })
    }

    /// Checks the rest of row 2 (the centre row) for one player.
    fn complete_centre_row(room: &mut Room, conn: ConnectionId, now: u64) -> Vec<Delivery> {
        let mut last = Vec::new();
        for y in [0, 1, 3, 4] {
            last = room.toggle(conn, pos(2, y), now, 3).unwrap();
        }
        last
    }

    #[test]
    fn test_start_deals_distinct_private_boards() {
        let mut room = room_with(&["alice", "bob"]);
        let mut rng = StdRng::seed_from_u64(7);

        let deliveries = room
            .start(ALICE, &RoomConfig::default(), &mut rng, 1_000)
            .unwrap();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].targets, vec![ALICE]);
        assert_eq!(deliveries[1].targets, vec![BOB]);

        let boards: Vec<_> = room.members().iter().map(|p| p.board.clone().unwrap()).collect();
        assert_ne!(boards[0], boards[1]);
        assert_eq!(room.state(), GameState::InGame { started_at: 1_000 });
        assert!(room.members().iter().all(|p| p.in_game));
    }

    #[test]
    fn test_start_requires_leader_and_lobby() {
        let mut room = room_with(&["alice", "bob"]);
        let mut rng = StdRng::seed_from_u64(7);
        let config = RoomConfig::default();

        let err = room.start(BOB, &config, &mut rng, 1).unwrap_err();
        assert!(matches!(err, RoomError::NotLeader));

        room.start(ALICE, &config, &mut rng, 1).unwrap();
        let err = room.start(ALICE, &config, &mut rng, 2).unwrap_err();
        assert!(matches!(err, RoomError::InvalidState(_)));
    }

    #[test]
    fn test_move_outside_round_is_state_error() {
        let mut room = room_with(&["alice"]);
        let err = room.toggle(ALICE, pos(0, 0), 1, 3).unwrap_err();
        assert!(matches!(err, RoomError::InvalidState(_)));
    }

    #[test]
    fn test_move_validates_coordinates() {
        let mut room = started(&["alice"]);
        assert!(matches!(
            room.toggle(ALICE, None, 1, 3),
            Err(RoomError::InvalidMove(_))
        ));
        assert!(matches!(
            room.toggle(ALICE, Some(Position { x: Some(1), y: None }), 1, 3),
            Err(RoomError::InvalidMove(_))
        ));
        assert!(matches!(
            room.toggle(ALICE, pos(5, 0), 1, 3),
            Err(RoomError::InvalidMove(_))
        ));
        assert!(matches!(
            room.toggle(ALICE, pos(-1, 0), 1, 3),
            Err(RoomError::InvalidMove(_))
        ));
    }

    #[test]
    fn test_move_without_win_reports_progress_to_others() {
        let mut room = started(&["alice", "bob"]);

        let deliveries = room.toggle(ALICE, pos(0, 0), 2_000, 3).unwrap();
        assert_eq!(deliveries.len(), 2);

        assert_eq!(deliveries[0].targets, vec![ALICE]);
        assert!(matches!(deliveries[0].message.event, ServerEvent::Board { .. }));

        assert_eq!(deliveries[1].targets, vec![BOB]);
        assert_eq!(
            deliveries[1].message.event,
            ServerEvent::announcement("alice has 2/25 cells checked")
        );
    }

    #[test]
    fn test_bingo_is_announced_and_later_moves_ignored() {
        let mut room = started(&["alice", "bob"]);

        let deliveries = complete_centre_row(&mut room, ALICE, 3_000);
        assert!(matches!(deliveries[0].message.event, ServerEvent::Bingo { .. }));
        assert_eq!(deliveries[0].targets, vec![ALICE]);
        assert_eq!(
            deliveries[1].message.event,
            ServerEvent::announcement("alice got a BINGO!")
        );
        assert_eq!(deliveries[1].targets, vec![ALICE, BOB]);
        assert_eq!(deliveries.len(), 2, "bob is still playing");

        let alice = room.member_by_connection(ALICE).unwrap();
        assert_eq!(alice.bingo_at, Some(3_000));

        let ignored = room.toggle(ALICE, pos(0, 0), 3_500, 3).unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_round_ends_when_everyone_has_bingo() {
        let mut room = started(&["alice", "bob"]);
        complete_centre_row(&mut room, ALICE, 3_000);

        let deliveries = complete_centre_row(&mut room, BOB, 4_000);
        let last = deliveries.last().unwrap();
        match &last.message.event {
            ServerEvent::GameEnded { leaderboard } => {
                assert_eq!(leaderboard.len(), 2);
                assert_eq!(leaderboard[0].username, "alice");
                assert_eq!(leaderboard[1].username, "bob");
            }
            other => panic!("expected gameEnded, got {other:?}"),
        }
        assert_eq!(room.state(), GameState::Lobby);
        assert!(room.members().iter().all(|p| !p.in_game && p.board.is_none()));
    }

    #[test]
    fn test_leaderboard_orders_by_time_then_checked_cells() {
        let mut room = started(&["alice", "bob", "carol", "dave"]);
        let carol = ConnectionId::new(3);
        let dave = ConnectionId::new(4);

        complete_centre_row(&mut room, BOB, 5_000);
        room.toggle(carol, pos(0, 0), 5_100, 3).unwrap();
        room.toggle(carol, pos(0, 1), 5_200, 3).unwrap();
        room.toggle(dave, pos(0, 0), 5_300, 3).unwrap();

        let deliveries = room.end(ALICE, 9_000, 3).unwrap();
        let ServerEvent::GameEnded { leaderboard } = &deliveries[0].message.event else {
            panic!("expected gameEnded");
        };

        let names: Vec<_> = leaderboard.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, ["bob", "carol", "dave"]);
        assert!(leaderboard[0].bingo);
        assert_eq!(leaderboard[0].bingo_timestamp, 5_000);
        assert!(!leaderboard[1].bingo);
        assert_eq!(leaderboard[1].bingo_timestamp, 9_000);
        assert_eq!(leaderboard[1].checked_cells, 3);
        assert!(leaderboard.iter().all(|e| e.game_timestamp == 1_000));
    }

    #[test]
    fn test_end_requires_leader_and_round() {
        let mut room = room_with(&["alice", "bob"]);
        assert!(matches!(
            room.end(ALICE, 1, 3),
            Err(RoomError::InvalidState(_))
        ));

        let mut rng = StdRng::seed_from_u64(1);
        room.start(ALICE, &RoomConfig::default(), &mut rng, 1).unwrap();
        assert!(matches!(room.end(BOB, 2, 3), Err(RoomError::NotLeader)));
    }

    #[test]
    fn test_mid_round_joiner_cannot_move_and_is_not_ranked() {
        let mut room = started(&["alice"]);
        room.add(Player::new(PlayerId("p2".into()), BOB, "bob"));

        assert!(matches!(
            room.toggle(BOB, pos(0, 0), 2, 3),
            Err(RoomError::InvalidState(_))
        ));
        let board = room.leaderboard(3, 3);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].username, "alice");
    }
}
