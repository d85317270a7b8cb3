//! Error types for the match engine.

use crate::{Seat, Side, Tile};

/// Errors returned by [`Match`](crate::Match) operations.
///
/// Every variant is a rejection: the operation that produced it did not
/// touch the match state. The only exception is [`EngineError::Invariant`],
/// which reports that the state was already inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A match needs exactly four players.
    #[error("a match needs exactly 4 players, got {0}")]
    InvalidPlayerCount(usize),

    /// A pip value outside `0..=6`.
    #[error("pip value {0} is out of range (0-6)")]
    PipOutOfRange(u8),

    /// The configured hand size can't be dealt from one set.
    #[error("cannot deal {0} tiles to each of 4 players from a 28-tile set")]
    InvalidHandSize(usize),

    /// A match that is won before it starts.
    #[error("target score must be at least 1")]
    InvalidTargetScore,

    /// A fixed deal listed the same tile twice.
    #[error("tile {0} appears more than once in the deal")]
    DuplicateTile(Tile),

    /// The seat is not the one expected to move.
    #[error("it is seat {expected}'s turn, not seat {got}'s")]
    NotYourTurn { expected: Seat, got: Seat },

    /// No tile at that position in the mover's hand.
    #[error("hand index {index} is out of range (hand has {len} tiles)")]
    HandIndexOutOfRange { index: usize, len: usize },

    /// The tile doesn't match the open end on the requested side.
    #[error("tile {tile} cannot be played on the {side} end")]
    IllegalMove { tile: Tile, side: Side },

    /// Strict passing is on and the mover holds a playable tile.
    #[error("seat {0} holds a playable tile and cannot pass")]
    MustPlay(Seat),

    /// The round already ended; a new round must be started first.
    #[error("the round is over")]
    RoundOver,

    /// Internal consistency check failed.
    #[error("match invariant violated: {0}")]
    Invariant(String),
}
