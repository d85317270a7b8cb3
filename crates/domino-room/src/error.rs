//! Error types for the room layer.
//!
//! Every variant except [`RoomError::Unavailable`], [`RoomError::Invariant`]
//! and [`RoomError::Engine`] is a rejected request: nothing changed, and
//! the sender may retry with different input.

use domino_engine::{EngineError, Seat, Side, Tile};
use domino_protocol::RoomId;

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No room with this id.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// All four seats are taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The connection or the name is already at this table.
    #[error("{0} is already in this room")]
    DuplicatePlayer(String),

    /// The connection isn't a member of the room it addressed.
    #[error("you are not in a room")]
    PlayerNotInRoom,

    /// A match needs exactly four players.
    #[error("need exactly 4 players to start, have {0}")]
    WrongPlayerCount(usize),

    /// The room has left the waiting state.
    #[error("the game has already started")]
    AlreadyStarted,

    /// The room isn't running a match.
    #[error("no game in progress")]
    NotPlaying,

    /// Playing, but no match has been dealt.
    #[error("no active match")]
    NoActiveMatch,

    #[error("it is seat {expected}'s turn, not yours (seat {got})")]
    NotYourTurn { expected: Seat, got: Seat },

    /// The tile doesn't fit the requested end.
    #[error("tile {tile} cannot be played on the {side} end")]
    IllegalMove { tile: Tile, side: Side },

    /// A host-only action from someone else.
    #[error("only the host can {0}")]
    PermissionDenied(&'static str),

    /// `createRoom` with an id that is taken.
    #[error("room {0} already exists")]
    RoomAlreadyExists(RoomId),

    /// A connection can sit in one room at a time.
    #[error("you are already in room {0}")]
    AlreadyInRoom(RoomId),

    /// The round ended; the host has to restart it.
    #[error("the round is over")]
    RoundOver,

    /// Strict passing is on and the mover holds a playable tile.
    #[error("you have a playable tile and cannot pass")]
    MustPlay,

    /// Malformed input: blank or oversized names, bad hand index.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The room actor is gone or its channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The room's state became inconsistent; the room was shut down.
    #[error("internal error: {0}")]
    Invariant(String),

    /// Any other engine failure.
    #[error("engine error: {0}")]
    Engine(EngineError),
}

impl RoomError {
    /// HTTP-style status code sent in the outbound `error` event.
    pub fn code(&self) -> u16 {
        match self {
            RoomError::InvalidRequest(_) => 400,
            RoomError::PermissionDenied(_) => 403,
            RoomError::RoomNotFound(_) | RoomError::PlayerNotInRoom => 404,
            RoomError::RoomFull(_)
            | RoomError::DuplicatePlayer(_)
            | RoomError::WrongPlayerCount(_)
            | RoomError::AlreadyStarted
            | RoomError::NotPlaying
            | RoomError::NoActiveMatch
            | RoomError::NotYourTurn { .. }
            | RoomError::RoomAlreadyExists(_)
            | RoomError::AlreadyInRoom(_)
            | RoomError::RoundOver => 409,
            RoomError::IllegalMove { .. } | RoomError::MustPlay => 422,
            RoomError::Invariant(_) | RoomError::Engine(_) => 500,
            RoomError::Unavailable(_) => 503,
        }
    }

    /// `true` when the room can no longer serve requests and should be
    /// dropped from the coordinator's tables.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RoomError::Unavailable(_) | RoomError::Invariant(_))
    }
}

impl From<EngineError> for RoomError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotYourTurn { expected, got } => RoomError::NotYourTurn { expected, got },
            EngineError::IllegalMove { tile, side } => RoomError::IllegalMove { tile, side },
            EngineError::InvalidPlayerCount(n) => RoomError::WrongPlayerCount(n),
            EngineError::HandIndexOutOfRange { .. } => RoomError::InvalidRequest(err.to_string()),
            EngineError::MustPlay(_) => RoomError::MustPlay,
            EngineError::RoundOver => RoomError::RoundOver,
            EngineError::Invariant(msg) => RoomError::Invariant(msg),
            other => RoomError::Engine(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_room_errors() {
        let seat = |i| Seat::new(i).unwrap();
        assert_eq!(
            RoomError::from(EngineError::NotYourTurn {
                expected: seat(0),
                got: seat(2)
            }),
            RoomError::NotYourTurn {
                expected: seat(0),
                got: seat(2)
            }
        );
        assert_eq!(RoomError::from(EngineError::RoundOver), RoomError::RoundOver);
        assert!(matches!(
            RoomError::from(EngineError::HandIndexOutOfRange { index: 9, len: 6 }),
            RoomError::InvalidRequest(_)
        ));
        assert!(matches!(
            RoomError::from(EngineError::InvalidHandSize(9)),
            RoomError::Engine(_)
        ));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(RoomError::PermissionDenied("start the game").code(), 403);
        assert_eq!(RoomError::RoomNotFound(RoomId::new("x")).code(), 404);
        assert_eq!(RoomError::AlreadyStarted.code(), 409);
        assert_eq!(RoomError::MustPlay.code(), 422);
        assert_eq!(RoomError::Unavailable(RoomId::new("x")).code(), 503);
    }

    #[test]
    fn test_only_dead_rooms_are_fatal() {
        assert!(RoomError::Unavailable(RoomId::new("x")).is_fatal());
        assert!(RoomError::Invariant("bad".into()).is_fatal());
        assert!(!RoomError::NotPlaying.is_fatal());
    }

    #[test]
    fn test_permission_message_names_the_action() {
        assert_eq!(
            RoomError::PermissionDenied("start the game").to_string(),
            "only the host can start the game"
        );
    }
}
