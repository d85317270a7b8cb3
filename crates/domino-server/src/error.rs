//! Unified error type for the domino server.

use domino_engine::EngineError;
use domino_protocol::ProtocolError;
use domino_room::RoomError;
use domino_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DominoError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, full, not your turn, ...).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Match rules that can't be played.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A configuration value that can't be used.
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: DominoError = TransportError::ConnectionClosed.into();
        assert!(matches!(err, DominoError::Transport(_)));
        assert_eq!(err.to_string(), "connection closed");
    }

    #[test]
    fn test_from_protocol_error() {
        let err: DominoError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, DominoError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: DominoError = RoomError::RoomNotFound(domino_protocol::RoomId::new("mesa")).into();
        assert!(matches!(err, DominoError::Room(_)));
        assert!(err.to_string().contains("mesa"));
    }

    #[test]
    fn test_from_engine_error() {
        let err: DominoError = EngineError::InvalidTargetScore.into();
        assert!(matches!(err, DominoError::Engine(_)));
    }
}
