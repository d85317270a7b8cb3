//! The room state machine: roster, host, lifecycle, and the match it owns.
//!
//! [`Room`] is plain data with synchronous methods. It knows nothing about
//! tasks or channels; the actor in [`crate::actor`] owns one and serializes
//! access to it. Every method runs all of its checks before it changes
//! anything, so an `Err` always means "nothing happened".

use domino_engine::{Match, Opener, RoundResult, Seat, Side};
use domino_protocol::{RoomId, RoomState, RoomSummary};
use domino_transport::ConnectionId;

use crate::{ROOM_CAPACITY, RoomConfig, RoomError};

/// One connection at the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub conn: ConnectionId,
    pub name: String,
    /// Assigned at match start, in join order. `None` while waiting.
    pub seat: Option<Seat>,
}

/// What an accepted move or pass led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The round goes on.
    Continued,
    /// The round ended and its point has been awarded.
    RoundEnded {
        result: RoundResult,
        /// A team reached the target score; the room is now finished.
        match_over: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    config: RoomConfig,
    /// Join order. Never more than [`ROOM_CAPACITY`].
    members: Vec<Member>,
    host: ConnectionId,
    state: RoomState,
    game: Option<Match>,
}

impl Room {
    /// Creates a waiting room with `host` as its only member.
    ///
    /// # Errors
    /// [`RoomError::InvalidRequest`] for a blank or oversized room id or
    /// player name.
    pub fn new(
        id: RoomId,
        host: ConnectionId,
        host_name: &str,
        config: RoomConfig,
    ) -> Result<Self, RoomError> {
        let id = RoomId::new(validate_label("room id", id.as_str(), config.max_name_len)?);
        let name = validate_label("player name", host_name, config.max_name_len)?;
        Ok(Self {
            id,
            config,
            members: vec![Member {
                conn: host,
                name,
                seat: None,
            }],
            host,
            state: RoomState::Waiting,
            game: None,
        })
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    /// Adds a player to a waiting room.
    ///
    /// # Errors
    /// [`RoomError::InvalidRequest`], [`RoomError::AlreadyStarted`],
    /// [`RoomError::DuplicatePlayer`] or [`RoomError::RoomFull`].
    pub fn add_player(&mut self, conn: ConnectionId, name: &str) -> Result<(), RoomError> {
        let name = validate_label("player name", name, self.config.max_name_len)?;
        if !self.state.is_joinable() {
            return Err(RoomError::AlreadyStarted);
        }
        if self.member(conn).is_some() {
            return Err(RoomError::DuplicatePlayer(conn.to_string()));
        }
        if self.members.iter().any(|m| m.name == name) {
            return Err(RoomError::DuplicatePlayer(name));
        }
        if self.members.len() >= ROOM_CAPACITY {
            return Err(RoomError::RoomFull(self.id.clone()));
        }

        self.members.push(Member {
            conn,
            name,
            seat: None,
        });
        Ok(())
    }

    /// Removes a member. If the host leaves, the next member in join order
    /// becomes host.
    ///
    /// Seats are not renumbered: a player leaving mid-match leaves their
    /// seat empty.
    ///
    /// # Errors
    /// [`RoomError::PlayerNotInRoom`] if `conn` isn't a member.
    pub fn remove_player(&mut self, conn: ConnectionId) -> Result<Member, RoomError> {
        let index = self
            .members
            .iter()
            .position(|m| m.conn == conn)
            .ok_or(RoomError::PlayerNotInRoom)?;
        let removed = self.members.remove(index);

        if removed.conn == self.host {
            if let Some(next) = self.members.first() {
                self.host = next.conn;
                tracing::info!(room_id = %self.id, host = %next.name, "host transferred");
            }
        }
        Ok(removed)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    // -----------------------------------------------------------------------
    // Match lifecycle
    // -----------------------------------------------------------------------

    /// Deals a match for the four members and reports the opener.
    ///
    /// Seats follow join order. The opener's double is not played for
    /// them.
    ///
    /// # Errors
    /// [`RoomError::PermissionDenied`] unless `by` is the host,
    /// [`RoomError::AlreadyStarted`] outside the waiting state, and
    /// [`RoomError::WrongPlayerCount`] without exactly four members.
    pub fn start_match(&mut self, by: ConnectionId) -> Result<Opener, RoomError> {
        self.require_host(by, "start the game")?;
        if self.state != RoomState::Waiting {
            return Err(RoomError::AlreadyStarted);
        }
        if self.members.len() != ROOM_CAPACITY {
            return Err(RoomError::WrongPlayerCount(self.members.len()));
        }

        let names = self.members.iter().map(|m| m.name.clone()).collect();
        let mut game = Match::start(names, self.config.match_config.clone())?;
        let opener = game.assign_opener();

        for (member, seat) in self.members.iter_mut().zip(Seat::all()) {
            member.seat = Some(seat);
        }
        self.game = Some(game);
        self.state = RoomState::Playing;
        Ok(opener)
    }

    /// Plays a tile for the seat `conn` holds.
    ///
    /// When the move ends the round, the winning team gets its point and,
    /// if that reaches the target, the room moves to finished.
    ///
    /// # Errors
    /// [`RoomError::NotPlaying`], [`RoomError::NoActiveMatch`],
    /// [`RoomError::PlayerNotInRoom`], or whatever the engine rejects the
    /// move with.
    pub fn submit_move(
        &mut self,
        conn: ConnectionId,
        hand_index: usize,
        side: Side,
    ) -> Result<MoveOutcome, RoomError> {
        let seat = self.mover_seat(conn)?;
        self.game_mut()?.play(seat, hand_index, side)?;
        Ok(self.settle_round())
    }

    /// Passes for the seat `conn` holds. Same outcomes as
    /// [`Room::submit_move`].
    ///
    /// # Errors
    /// As [`Room::submit_move`], plus [`RoomError::MustPlay`] under strict
    /// passing.
    pub fn submit_pass(&mut self, conn: ConnectionId) -> Result<MoveOutcome, RoomError> {
        let seat = self.mover_seat(conn)?;
        self.game_mut()?.pass(seat)?;
        Ok(self.settle_round())
    }

    /// Deals a new round of the running match. Scores carry over.
    ///
    /// # Errors
    /// [`RoomError::PermissionDenied`] unless `by` is the host,
    /// [`RoomError::NotPlaying`] or [`RoomError::NoActiveMatch`].
    pub fn restart_round(&mut self, by: ConnectionId) -> Result<Opener, RoomError> {
        self.require_host(by, "restart the game")?;
        if !self.state.is_playing() {
            return Err(RoomError::NotPlaying);
        }
        let game = self.game_mut()?;
        game.start_new_round()?;
        Ok(game.assign_opener())
    }

    fn settle_round(&mut self) -> MoveOutcome {
        let Some(game) = self.game.as_mut() else {
            return MoveOutcome::Continued;
        };
        let Some(result) = game.round_winner() else {
            return MoveOutcome::Continued;
        };

        game.award_point(result.team);
        let match_over = game.is_match_over();
        if match_over {
            self.state = RoomState::Finished;
        }
        MoveOutcome::RoundEnded { result, match_over }
    }

    fn mover_seat(&self, conn: ConnectionId) -> Result<Seat, RoomError> {
        if !self.state.is_playing() {
            return Err(RoomError::NotPlaying);
        }
        if self.game.is_none() {
            return Err(RoomError::NoActiveMatch);
        }
        self.seat_of(conn).ok_or(RoomError::PlayerNotInRoom)
    }

    fn game_mut(&mut self) -> Result<&mut Match, RoomError> {
        self.game.as_mut().ok_or(RoomError::NoActiveMatch)
    }

    /// # Errors
    /// [`RoomError::PermissionDenied`] naming `action` unless `conn` is
    /// the host.
    pub fn require_host(&self, conn: ConnectionId, action: &'static str) -> Result<(), RoomError> {
        if conn == self.host {
            Ok(())
        } else {
            Err(RoomError::PermissionDenied(action))
        }
    }

    /// Runs the match's consistency check, if a match exists.
    ///
    /// # Errors
    /// [`RoomError::Invariant`] describing the violation.
    pub fn verify(&self) -> Result<(), RoomError> {
        if let Some(game) = &self.game {
            game.check_invariants()?;
        }
        let mut seats: Vec<Seat> = self.members.iter().filter_map(|m| m.seat).collect();
        let seated = seats.len();
        seats.sort();
        seats.dedup();
        if seats.len() != seated {
            return Err(RoomError::Invariant(format!("room {} has two members in one seat", self.id)));
        }
        Ok(())
    }

    /// Puts two seated members other than the current mover in the same
    /// seat, so the next [`verify`](Self::verify) fails.
    #[cfg(test)]
    pub(crate) fn seat_two_members_together(&mut self) {
        let current = self.game.as_ref().map(Match::current_seat);
        let mut others = self
            .members
            .iter_mut()
            .filter(|m| m.seat.is_some() && m.seat != current);
        if let (Some(a), Some(b)) = (others.next(), others.next()) {
            b.seat = a.seat;
        }
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn host(&self) -> ConnectionId {
        self.host
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, conn: ConnectionId) -> Option<&Member> {
        self.members.iter().find(|m| m.conn == conn)
    }

    /// The member sitting in `seat`, if they are still here.
    pub fn member_at(&self, seat: Seat) -> Option<&Member> {
        self.members.iter().find(|m| m.seat == Some(seat))
    }

    pub fn seat_of(&self, conn: ConnectionId) -> Option<Seat> {
        self.member(conn).and_then(|m| m.seat)
    }

    pub fn game(&self) -> Option<&Match> {
        self.game.as_ref()
    }

    /// Public summary. Reveals no tiles.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.id.clone(),
            player_count: self.members.len(),
            max_players: ROOM_CAPACITY,
            state: self.state,
            players: self.members.iter().map(|m| m.name.clone()).collect(),
            host_name: self.member(self.host).map(|m| m.name.clone()),
        }
    }
}

/// Trims `value` and checks it is non-empty and at most `max` characters.
fn validate_label(what: &str, value: &str, max: usize) -> Result<String, RoomError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RoomError::InvalidRequest(format!("{what} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(RoomError::InvalidRequest(format!(
            "{what} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domino_engine::{MatchConfig, RoundReason};

    fn conn(i: u64) -> ConnectionId {
        ConnectionId::new(i)
    }

    fn waiting_room(players: usize) -> Room {
        let mut room = Room::new(RoomId::new("mesa"), conn(1), "ana", RoomConfig::default()).unwrap();
        for (i, name) in ["bruno", "carla", "davi"].iter().take(players - 1).enumerate() {
            room.add_player(conn(i as u64 + 2), name).unwrap();
        }
        room
    }

    fn started_room() -> (Room, Opener) {
        let mut room = waiting_room(4);
        let opener = room.start_match(conn(1)).unwrap();
        (room, opener)
    }

    /// Connection holding `seat` in a started room (seats follow join order).
    fn conn_at(seat: Seat) -> ConnectionId {
        conn(seat.index() as u64 + 1)
    }

    // =====================================================================
    // Roster
    // =====================================================================

    #[test]
    fn test_new_room_has_host_as_only_member() {
        let room = waiting_room(1);
        assert_eq!(room.state(), RoomState::Waiting);
        assert_eq!(room.host(), conn(1));
        let summary = room.summary();
        assert_eq!(summary.players, vec!["ana"]);
        assert_eq!(summary.host_name.as_deref(), Some("ana"));
        assert_eq!(summary.max_players, 4);
    }

    #[test]
    fn test_new_room_rejects_blank_names() {
        let err = Room::new(RoomId::new("mesa"), conn(1), "   ", RoomConfig::default()).unwrap_err();
        assert!(matches!(err, RoomError::InvalidRequest(_)));
        let err = Room::new(RoomId::new(""), conn(1), "ana", RoomConfig::default()).unwrap_err();
        assert!(matches!(err, RoomError::InvalidRequest(_)));
    }

    #[test]
    fn test_names_are_trimmed_and_length_checked() {
        let mut room = waiting_room(1);
        room.add_player(conn(2), "  bruno ").unwrap();
        assert_eq!(room.member(conn(2)).unwrap().name, "bruno");

        let long = "x".repeat(25);
        assert!(matches!(
            room.add_player(conn(3), &long),
            Err(RoomError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_fifth_player_is_rejected() {
        let mut room = waiting_room(4);
        assert_eq!(
            room.add_player(conn(5), "eva"),
            Err(RoomError::RoomFull(RoomId::new("mesa")))
        );
        assert_eq!(room.members().len(), 4);
    }

    #[test]
    fn test_duplicate_connection_or_name_is_rejected() {
        let mut room = waiting_room(2);
        assert!(matches!(
            room.add_player(conn(2), "other"),
            Err(RoomError::DuplicatePlayer(_))
        ));
        assert_eq!(
            room.add_player(conn(9), "bruno"),
            Err(RoomError::DuplicatePlayer("bruno".into()))
        );
    }

    #[test]
    fn test_host_transfers_in_join_order() {
        let mut room = waiting_room(3);
        room.remove_player(conn(1)).unwrap();
        assert_eq!(room.host(), conn(2));
        assert_eq!(room.summary().host_name.as_deref(), Some("bruno"));

        room.remove_player(conn(3)).unwrap();
        assert_eq!(room.host(), conn(2));
    }

    #[test]
    fn test_remove_last_player_empties_room() {
        let mut room = waiting_room(1);
        let removed = room.remove_player(conn(1)).unwrap();
        assert_eq!(removed.name, "ana");
        assert!(room.is_empty());
        assert_eq!(room.remove_player(conn(1)), Err(RoomError::PlayerNotInRoom));
    }

    // =====================================================================
    // Start
    // =====================================================================

    #[test]
    fn test_start_requires_host() {
        let mut room = waiting_room(4);
        assert_eq!(
            room.start_match(conn(2)),
            Err(RoomError::PermissionDenied("start the game"))
        );
        assert_eq!(room.state(), RoomState::Waiting);
    }

    #[test]
    fn test_start_requires_four_players() {
        let mut room = waiting_room(3);
        assert_eq!(room.start_match(conn(1)), Err(RoomError::WrongPlayerCount(3)));
        assert!(room.game().is_none());
    }

    #[test]
    fn test_start_assigns_seats_and_opener() {
        let (room, opener) = started_room();
        assert_eq!(room.state(), RoomState::Playing);
        for (i, member) in room.members().iter().enumerate() {
            assert_eq!(member.seat, Seat::new(i));
        }

        let game = room.game().unwrap();
        assert_eq!(game.current_seat(), opener.seat);
        assert!(game.board().is_empty(), "opener's tile must not be auto-played");
        room.verify().unwrap();
    }

    #[test]
    fn test_start_twice_and_join_after_start_are_rejected() {
        let (mut room, _) = started_room();
        assert_eq!(room.start_match(conn(1)), Err(RoomError::AlreadyStarted));
        room.remove_player(conn(4)).unwrap();
        assert_eq!(room.add_player(conn(5), "eva"), Err(RoomError::AlreadyStarted));
    }

    // =====================================================================
    // Moves
    // =====================================================================

    #[test]
    fn test_moves_before_start_are_rejected() {
        let mut room = waiting_room(4);
        assert_eq!(room.submit_move(conn(1), 0, Side::Right), Err(RoomError::NotPlaying));
        assert_eq!(room.submit_pass(conn(1)), Err(RoomError::NotPlaying));
    }

    #[test]
    fn test_out_of_turn_move_changes_nothing() {
        let (mut room, opener) = started_room();
        let other = conn_at(opener.seat.next().next());
        let before = room.game().unwrap().clone();

        let err = room.submit_move(other, 0, Side::Right).unwrap_err();

        assert!(matches!(err, RoomError::NotYourTurn { .. }));
        assert_eq!(room.game().unwrap(), &before);
    }

    #[test]
    fn test_opener_move_is_accepted() {
        let (mut room, opener) = started_room();
        let index = opener.hand_index.unwrap_or(0);

        let outcome = room.submit_move(conn_at(opener.seat), index, Side::Right).unwrap();

        assert_eq!(outcome, MoveOutcome::Continued);
        let game = room.game().unwrap();
        assert_eq!(game.board().len(), 1);
        assert_eq!(game.current_seat(), opener.seat.next());
        room.verify().unwrap();
    }

    #[test]
    fn test_four_passes_end_round_and_finish_match() {
        let (mut room, opener) = started_room();
        let mut seat = opener.seat;
        let mut last = MoveOutcome::Continued;
        for _ in 0..4 {
            last = room.submit_pass(conn_at(seat)).unwrap();
            seat = seat.next();
        }

        let MoveOutcome::RoundEnded { result, match_over } = last else {
            panic!("round should have ended, got {last:?}");
        };
        assert_eq!(result.reason, RoundReason::Closed);
        // Default target is one point.
        assert!(match_over);
        assert_eq!(room.state(), RoomState::Finished);
        assert_eq!(room.game().unwrap().scores()[result.team.index()], 1);
    }

    #[test]
    fn test_round_end_below_target_keeps_playing() {
        let config = RoomConfig {
            match_config: MatchConfig {
                target_score: 2,
                ..MatchConfig::default()
            },
            ..RoomConfig::default()
        };
        let mut room = Room::new(RoomId::new("mesa"), conn(1), "ana", config).unwrap();
        for (i, name) in ["bruno", "carla", "davi"].iter().enumerate() {
            room.add_player(conn(i as u64 + 2), name).unwrap();
        }
        let opener = room.start_match(conn(1)).unwrap();

        let mut seat = opener.seat;
        for _ in 0..4 {
            room.submit_pass(conn_at(seat)).unwrap();
            seat = seat.next();
        }
        assert_eq!(room.state(), RoomState::Playing);
        assert_eq!(room.submit_pass(conn_at(seat)), Err(RoomError::RoundOver));

        let scores = room.game().unwrap().scores();
        room.restart_round(conn(1)).unwrap();
        let game = room.game().unwrap();
        assert_eq!(game.scores(), scores);
        assert_eq!(game.round_number(), 2);
        assert!(game.board().is_empty());
    }

    // =====================================================================
    // Restart
    // =====================================================================

    #[test]
    fn test_restart_rules() {
        let mut waiting = waiting_room(4);
        assert_eq!(waiting.restart_round(conn(1)), Err(RoomError::NotPlaying));

        let (mut room, _) = started_room();
        assert_eq!(
            room.restart_round(conn(3)),
            Err(RoomError::PermissionDenied("restart the game"))
        );
        let opener = room.restart_round(conn(1)).unwrap();
        assert_eq!(room.game().unwrap().current_seat(), opener.seat);
    }

    #[test]
    fn test_seats_survive_a_departure() {
        let (mut room, _) = started_room();
        room.remove_player(conn(2)).unwrap();
        assert!(room.member_at(Seat::new(1).unwrap()).is_none());
        assert_eq!(room.seat_of(conn(3)), Seat::new(2));
        room.verify().unwrap();
    }
}
