//! Codec trait and the JSON implementation.
//!
//! The server handler is written against [`Codec`] so the framing format
//! can change without touching connection handling. [`JsonCodec`] is the
//! only implementation; browser clients speak JSON.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidMessage` for an empty frame and
    /// `ProtocolError::Decode` if the bytes are malformed or don't match
    /// the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use skirmish_protocol::{ClientEvent, Codec, Envelope, JsonCodec, RoomName};
///
/// let codec = JsonCodec;
/// let frame = br#"{"payload":{"event":"join-room","data":"r1"}}"#;
///
/// let envelope: Envelope<ClientEvent> = codec.decode(frame).unwrap();
/// assert_eq!(envelope.payload, ClientEvent::JoinRoom(RoomName::from("r1")));
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
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(ProtocolError::InvalidMessage("empty frame".to_string()));
        }
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, ClientId, Envelope, ServerEvent};

    #[test]
    fn test_encode_server_envelope_is_json_text() {
        let envelope = Envelope {
            seq: 3,
            timestamp: 120,
            payload: ServerEvent::PlayerJoined {
                player_id: ClientId(9),
            },
        };

        let bytes = JsonCodec.encode(&envelope).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["seq"], 3);
        assert_eq!(json["payload"]["event"], "player-joined");
        assert_eq!(json["payload"]["data"]["playerId"], 9);
    }

    #[test]
    fn test_decode_unknown_move_is_rejected() {
        let frame = br#"{"payload":{"event":"player-move","data":{"roomId":"r1","move":"lizard"}}}"#;
        let result: Result<Envelope<ClientEvent>, _> = JsonCodec.decode(frame);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let result: Result<Envelope<ClientEvent>, _> =
            JsonCodec.decode(b"not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_empty_frame_is_invalid() {
        let result: Result<Envelope<ClientEvent>, _> = JsonCodec.decode(b"  \n");
        assert!(matches!(result, Err(ProtocolError::InvalidMessage(_))));
    }
}
