//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The server loop never calls `serde_json` directly; it holds something
//! that implements [`Codec`]. Swapping the wire format means swapping the
//! codec, nothing else.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so one codec can be shared by every connection
/// task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is what browser clients speak, so it is the default. Encoded output
/// is always valid UTF-8 and goes out as WebSocket text frames.
///
/// ## Example
///
/// ```rust
/// use domino_protocol::{ClientEvent, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let event: ClientEvent = codec.decode(br#"{"type":"passTurn"}"#).unwrap();
/// assert_eq!(event, ClientEvent::PassTurn);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, Envelope, ServerEvent};

    #[test]
    fn test_json_codec_encodes_envelope_as_utf8() {
        let envelope = Envelope {
            seq: 3,
            timestamp: 1200,
            event: ServerEvent::Pong {
                client_time: 10,
                server_time: 1200,
            },
        };
        let bytes = JsonCodec.encode(&envelope).unwrap();
        assert!(std::str::from_utf8(&bytes).is_ok());

        let decoded: Envelope = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_json_codec_decode_garbage_returns_error() {
        let result: Result<ClientEvent, _> = JsonCodec.decode(b"not json {{{");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_decode_unknown_event_returns_error() {
        let result: Result<ClientEvent, _> = JsonCodec.decode(br#"{"type":"drawTile"}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
