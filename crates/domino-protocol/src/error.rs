//! Error types for the protocol layer.
//!
//! When you see a `ProtocolError`, the problem is in turning frames into
//! events or back, never in networking or in the game itself.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown `type` tag, a
    /// missing field, or a value of the wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but breaks a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
