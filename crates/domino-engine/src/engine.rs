//! The match engine: one authoritative game between four seats.
//!
//! A [`Match`] lives for a whole match. Rounds come and go inside it
//! ([`Match::start_new_round`]); the team scores carry over.
//!
//! ```text
//! start ──→ assign_opener ──→ play / pass ... ──→ round over
//!                ↑                                    │
//!                │                         award_point(winner)
//!                │                                    │
//!                └──────── start_new_round ◄──── match over? ──→ done
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    Board, Deal, EngineError, FULL_SET_SIZE, Hand, MatchConfig, PlacedTile, Playability,
    SEATS, Seat, Side, Team, Tile,
};

/// A seated player: display name plus the hand they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub hand: Hand,
}

/// Who opens the round, and with which tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opener {
    pub seat: Seat,
    /// Position of the highest double in the opener's hand. `None` when no
    /// seat holds a double and the fallback seat 0 opens freely.
    pub hand_index: Option<usize>,
    pub tile: Option<Tile>,
}

/// Why a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundReason {
    /// A seat played its last tile.
    Batida,
    /// All four seats passed in a row.
    Closed,
}

/// The outcome of a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub team: Team,
    pub reason: RoundReason,
    /// The seat that emptied its hand. Only set for a batida.
    pub seat: Option<Seat>,
    /// Pips left in each team's hands, indexed by [`Team::index`].
    pub team_pips: [u32; 2],
}

/// One match between four seats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    config: MatchConfig,
    players: [Player; SEATS],
    standby: Vec<Tile>,
    board: Board,
    scores: [u32; 2],
    current: Seat,
    first_move: bool,
    consecutive_passes: u8,
    round: u32,
}

impl Match {
    /// Starts a match with a freshly shuffled deal.
    ///
    /// # Errors
    /// - [`EngineError::InvalidPlayerCount`] unless exactly four names are given
    /// - whatever [`MatchConfig::validate`] reports
    pub fn start(names: Vec<String>, config: MatchConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let deal = Deal::shuffled(&mut rand::rng(), config.hand_size)?;
        Self::with_deal(names, config, deal)
    }

    /// Starts a match from a prepared deal.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidPlayerCount`] unless exactly four
    /// names are given.
    pub fn with_deal(
        names: Vec<String>,
        config: MatchConfig,
        deal: Deal,
    ) -> Result<Self, EngineError> {
        let count = names.len();
        let names: [String; SEATS] = names
            .try_into()
            .map_err(|_| EngineError::InvalidPlayerCount(count))?;

        let Deal { hands, standby } = deal;
        let mut hands = hands.into_iter();
        let players = names.map(|name| Player {
            name,
            hand: Hand::new(hands.next().unwrap_or_default()),
        });

        Ok(Self {
            config,
            players,
            standby,
            board: Board::new(),
            scores: [0, 0],
            current: Seat::FIRST,
            first_move: true,
            consecutive_passes: 0,
            round: 1,
        })
    }

    // -----------------------------------------------------------------------
    // Opening
    // -----------------------------------------------------------------------

    /// Finds the seat holding the highest double.
    ///
    /// Falls back to seat 0 when nobody holds a double. Only reports; the
    /// opener still has to submit the tile as a normal move.
    pub fn determine_starting_seat(&self) -> Opener {
        let highest_double = Seat::all()
            .flat_map(|seat| {
                self.hand(seat)
                    .tiles()
                    .iter()
                    .enumerate()
                    .filter(|(_, tile)| tile.is_double())
                    .map(move |(index, tile)| (seat, index, *tile))
            })
            .max_by_key(|(_, _, tile)| tile.low());

        match highest_double {
            Some((seat, index, tile)) => Opener {
                seat,
                hand_index: Some(index),
                tile: Some(tile),
            },
            None => Opener {
                seat: Seat::FIRST,
                hand_index: None,
                tile: None,
            },
        }
    }

    /// Determines the opener and hands them the turn.
    pub fn assign_opener(&mut self) -> Opener {
        let opener = self.determine_starting_seat();
        self.current = opener.seat;
        tracing::debug!(seat = %opener.seat, tile = ?opener.tile, "opener assigned");
        opener
    }

    // -----------------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------------

    /// Whether `tile` fits on `side` of the current board.
    pub fn can_play(&self, tile: Tile, side: Side) -> Playability {
        self.board.can_play(tile, side)
    }

    /// Plays the tile at `hand_index` from `seat`'s hand onto `side`.
    ///
    /// The first move of a round goes down as the only board tile and
    /// `side` is ignored. Later tiles are flipped as needed so the matching
    /// half touches the open end.
    ///
    /// # Errors
    /// [`EngineError::RoundOver`], [`EngineError::NotYourTurn`],
    /// [`EngineError::HandIndexOutOfRange`], or [`EngineError::IllegalMove`].
    /// All checks run before anything changes.
    pub fn play(
        &mut self,
        seat: Seat,
        hand_index: usize,
        side: Side,
    ) -> Result<PlacedTile, EngineError> {
        self.ensure_mover(seat)?;

        let hand = self.hand(seat);
        let tile = hand
            .get(hand_index)
            .ok_or(EngineError::HandIndexOutOfRange {
                index: hand_index,
                len: hand.len(),
            })?;

        let side = if self.first_move { Side::Right } else { side };
        let placed = self.board.place(tile, side)?;

        // Validated above: the index exists and the board accepted the tile.
        self.players[seat.index()].hand.take(hand_index);
        self.first_move = false;
        self.consecutive_passes = 0;
        self.current = seat.next();

        tracing::debug!(%seat, %placed, %side, "tile played");
        Ok(placed)
    }

    /// Passes the turn for `seat`.
    ///
    /// # Errors
    /// [`EngineError::RoundOver`], [`EngineError::NotYourTurn`], or, with
    /// strict passing enabled, [`EngineError::MustPlay`] when the seat holds
    /// a tile that fits either end.
    pub fn pass(&mut self, seat: Seat) -> Result<(), EngineError> {
        self.ensure_mover(seat)?;

        if self.config.strict_pass && self.has_playable_tile(seat) {
            return Err(EngineError::MustPlay(seat));
        }

        self.consecutive_passes += 1;
        self.current = seat.next();
        tracing::debug!(%seat, passes = self.consecutive_passes, "turn passed");
        Ok(())
    }

    /// Returns `true` if any tile in `seat`'s hand fits the board.
    pub fn has_playable_tile(&self, seat: Seat) -> bool {
        self.hand(seat)
            .iter()
            .any(|tile| !self.board.valid_sides(*tile).is_empty())
    }

    fn ensure_mover(&self, seat: Seat) -> Result<(), EngineError> {
        if self.is_round_over() {
            return Err(EngineError::RoundOver);
        }
        if seat != self.current {
            return Err(EngineError::NotYourTurn {
                expected: self.current,
                got: seat,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Round and match outcome
    // -----------------------------------------------------------------------

    /// A round ends on a batida (empty hand) or after four straight passes.
    pub fn is_round_over(&self) -> bool {
        self.players.iter().any(|p| p.hand.is_empty())
            || usize::from(self.consecutive_passes) >= SEATS
    }

    /// Decides the round. `None` while the round is still running.
    ///
    /// A batida goes to the team of the seat that emptied its hand,
    /// regardless of pips. A closed game goes to the team with fewer pips
    /// left; a tie goes to team A.
    pub fn round_winner(&self) -> Option<RoundResult> {
        if !self.is_round_over() {
            return None;
        }

        let team_pips = self.team_pips();
        let batida = Seat::all().find(|s| self.hand(*s).is_empty());

        let result = match batida {
            Some(seat) => RoundResult {
                team: seat.team(),
                reason: RoundReason::Batida,
                seat: Some(seat),
                team_pips,
            },
            None => RoundResult {
                team: if team_pips[0] <= team_pips[1] { Team::A } else { Team::B },
                reason: RoundReason::Closed,
                seat: None,
                team_pips,
            },
        };
        Some(result)
    }

    /// Pips remaining in each team's two hands.
    pub fn team_pips(&self) -> [u32; 2] {
        let mut pips = [0, 0];
        for seat in Seat::all() {
            pips[seat.team().index()] += self.hand(seat).pip_total();
        }
        pips
    }

    /// Adds one point to `team`.
    pub fn award_point(&mut self, team: Team) {
        self.scores[team.index()] += 1;
        tracing::info!(%team, scores = ?self.scores, "point awarded");
    }

    /// `true` once either team has reached the target score.
    pub fn is_match_over(&self) -> bool {
        self.scores.iter().any(|s| *s >= self.config.target_score)
    }

    /// Re-deals for the next round. Scores are kept; everything else resets.
    ///
    /// # Errors
    /// Propagates deal errors for an invalid hand size.
    pub fn start_new_round(&mut self) -> Result<(), EngineError> {
        let deal = Deal::shuffled(&mut rand::rng(), self.config.hand_size)?;
        self.start_new_round_with(deal);
        Ok(())
    }

    /// Re-deals from a prepared deal. Scores are kept.
    pub fn start_new_round_with(&mut self, deal: Deal) {
        let Deal { hands, standby } = deal;
        for (player, hand) in self.players.iter_mut().zip(hands) {
            player.hand = Hand::new(hand);
        }
        self.standby = standby;
        self.board = Board::new();
        self.current = Seat::FIRST;
        self.first_move = true;
        self.consecutive_passes = 0;
        self.round += 1;
        tracing::debug!(round = self.round, "new round dealt");
    }

    // -----------------------------------------------------------------------
    // Consistency
    // -----------------------------------------------------------------------

    /// Verifies that every tile of the set is in exactly one place and that
    /// the board chain is connected.
    ///
    /// # Errors
    /// Returns [`EngineError::Invariant`] describing the first violation.
    pub fn check_invariants(&self) -> Result<(), EngineError> {
        self.board.check_chain()?;

        let mut seen = HashSet::with_capacity(FULL_SET_SIZE);
        let held = self.players.iter().flat_map(|p| p.hand.iter().copied());
        let placed = self.board.iter().map(PlacedTile::tile);
        for tile in held.chain(self.standby.iter().copied()).chain(placed) {
            if !seen.insert(tile) {
                return Err(EngineError::Invariant(format!("tile {tile} is in two places")));
            }
        }
        if seen.len() != FULL_SET_SIZE {
            return Err(EngineError::Invariant(format!(
                "{} tiles accounted for, expected {FULL_SET_SIZE}",
                seen.len()
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn hand(&self, seat: Seat) -> &Hand {
        &self.players[seat.index()].hand
    }

    pub fn player(&self, seat: Seat) -> &Player {
        &self.players[seat.index()]
    }

    pub fn players(&self) -> &[Player; SEATS] {
        &self.players
    }

    pub fn standby(&self) -> &[Tile] {
        &self.standby
    }

    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    pub fn current_seat(&self) -> Seat {
        self.current
    }

    pub fn is_first_move(&self) -> bool {
        self.first_move
    }

    pub fn consecutive_passes(&self) -> u8 {
        self.consecutive_passes
    }

    /// One-based round counter.
    pub fn round_number(&self) -> u32 {
        self.round
    }

    /// `"Team A (seat0 & seat2)"` and `"Team B (seat1 & seat3)"`.
    pub fn team_names(&self) -> [String; 2] {
        [Team::A, Team::B].map(|team| {
            let [a, b] = team.seats();
            format!("{team} ({} & {})", self.player(a).name, self.player(b).name)
        })
    }
}
