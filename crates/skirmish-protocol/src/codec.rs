//! Codec trait and implementations for serializing/deserializing packets.
//!
//! The server does not care HOW a packet is serialized, only that some
//! [`Codec`] can do it. Two are provided:
//!
//! - [`BincodeCodec`]: compact binary, the default on the wire.
//! - [`JsonCodec`]: human-readable, handy when inspecting traffic.
//!
//! Both ends of a connection must agree on the codec.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// - `Send + Sync` → the server (and the codec inside it) may be moved
///   onto any runtime thread.
/// - `'static` → the codec owns everything it needs.
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
// BincodeCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses `bincode` (compact, non-self-describing binary).
///
/// Because bincode does not describe its own structure, packet enums must
/// stay externally tagged (serde's default). Internally tagged enums
/// (`#[serde(tag = "...")]`) cannot be decoded by it.
#[cfg(feature = "bincode")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

#[cfg(feature = "bincode")]
impl Codec for BincodeCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        bincode::serialize(value).map_err(|e| ProtocolError::Encode(e))
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        bincode::deserialize(data).map_err(|e| ProtocolError::Decode(e))
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use skirmish_protocol::{Codec, JsonCodec, Packet};
///
/// let codec = JsonCodec;
/// let packet = Packet::Auth { credential: "alice".into() };
///
/// let bytes = codec.encode(&packet).unwrap();
/// let decoded: Packet = codec.decode(&bytes).unwrap();
/// assert_eq!(packet, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(|e| ProtocolError::Encode(Box::new(e)))
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(|e| ProtocolError::Decode(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameState, Packet};

    #[cfg(feature = "bincode")]
    #[test]
    fn test_bincode_round_trip_players_packet() {
        let packet = Packet::Players {
            slot_index: 3,
            slots: "[{\"state\":\"Open\"}]".into(),
        };
        let bytes = BincodeCodec.encode(&packet).unwrap();
        let decoded: Packet = BincodeCodec.decode(&bytes).unwrap();
        assert_eq!(packet, decoded);
    }

    #[cfg(feature = "bincode")]
    #[test]
    fn test_bincode_is_smaller_than_json() {
        let packet = Packet::GameStateChange {
            state: GameState::Running,
        };
        let binary = BincodeCodec.encode(&packet).unwrap();
        let json = serde_json::to_vec(&packet).unwrap();
        assert!(binary.len() < json.len());
    }

    #[cfg(feature = "bincode")]
    #[test]
    fn test_bincode_decode_truncated_returns_decode_error() {
        let bytes = BincodeCodec
            .encode(&Packet::Kick {
                reason: "Server is full!".into(),
            })
            .unwrap();
        let result: Result<Packet, _> = BincodeCodec.decode(&bytes[..bytes.len() - 3]);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[cfg(feature = "bincode")]
    #[test]
    fn test_bincode_decode_unknown_tag_returns_decode_error() {
        // Variant index 200 does not exist.
        let bytes = [200u8, 0, 0, 0];
        let result: Result<Packet, _> = BincodeCodec.decode(&bytes);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_decode_garbage_returns_decode_error() {
        let result: Result<Packet, _> = JsonCodec.decode(b"not json at all");
        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("decode failed"));
    }
}
