//! The lobby packet set.
//!
//! Every message on the wire is one [`Packet`]. Each variant carries
//! exactly the payload its kind needs, so a receiver can never read a
//! field that the sender did not fill in.
//!
//! Seat tables, single seats and global settings travel as strings. The
//! session layer produces them with its own serialize/deserialize pair;
//! to this crate they are opaque.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// Phase of the overall game, announced by the server with
/// [`Packet::GameStateChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    /// Still in the lobby.
    #[default]
    None,
    /// The host is generating the map; progress follows as
    /// [`Packet::Tiles`].
    PreparingMap,
    /// Map is ready, clients are loading.
    Initializing,
    /// The game is on.
    Running,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::PreparingMap => write!(f, "PreparingMap"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Running => write!(f, "Running"),
        }
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// A single protocol message.
///
/// Direction is noted per variant. Packets marked server → client are
/// tolerated (logged and ignored) if a client sends them anyway.
///
/// The enum is externally tagged (serde's default) so it works with both
/// the binary and the JSON codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Packet {
    /// Server → client: "authenticate yourself."
    RequestAuth,

    /// Client → server: the player's credential (their display name).
    /// An empty credential is rejected.
    Auth { credential: String },

    /// Server → client: the full seat table plus the seat the receiver
    /// was given. Sent once, right after successful authentication.
    Players { slot_index: usize, slots: String },

    /// Client → server: the sender's own seat, edited (faction,
    /// difficulty, ready flag).
    UpdateSlot { slot: String },

    /// Server → client: seat `slot_index` changed.
    SlotUpdate { slot_index: usize, slot: String },

    /// Either direction: a chat line.
    Message { text: String },

    /// Server → client: the shared game rules and map settings.
    GlobalSettings { settings: String },

    /// Server → client: the game moved to another phase.
    GameStateChange { state: GameState },

    /// Server → client: map generation progress.
    Tiles { is_final: bool, percent: u8 },

    /// Server → client: "you are being disconnected, here's why."
    /// The connection closes right after.
    Kick { reason: String },
}

impl Packet {
    /// Returns the payload-free kind of this packet.
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::RequestAuth => PacketKind::RequestAuth,
            Self::Auth { .. } => PacketKind::Auth,
            Self::Players { .. } => PacketKind::Players,
            Self::UpdateSlot { .. } => PacketKind::UpdateSlot,
            Self::SlotUpdate { .. } => PacketKind::SlotUpdate,
            Self::Message { .. } => PacketKind::Message,
            Self::GlobalSettings { .. } => PacketKind::GlobalSettings,
            Self::GameStateChange { .. } => PacketKind::GameStateChange,
            Self::Tiles { .. } => PacketKind::Tiles,
            Self::Kick { .. } => PacketKind::Kick,
        }
    }
}

/// The kind of a [`Packet`] without its payload. Used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    RequestAuth,
    Auth,
    Players,
    UpdateSlot,
    SlotUpdate,
    Message,
    GlobalSettings,
    GameStateChange,
    Tiles,
    Kick,
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The JSON shape is what a browser-side client would parse, so these
    //! tests pin it down for the kinds whose layout is easy to get wrong.

    use super::*;

    #[test]
    fn test_packet_request_auth_json_is_bare_string() {
        // A unit variant of an externally tagged enum is just its name.
        let json = serde_json::to_string(&Packet::RequestAuth).unwrap();
        assert_eq!(json, "\"RequestAuth\"");
    }

    #[test]
    fn test_packet_players_json_format() {
        let packet = Packet::Players {
            slot_index: 2,
            slots: "[]".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&packet).unwrap();

        assert_eq!(json["Players"]["slot_index"], 2);
        assert_eq!(json["Players"]["slots"], "[]");
    }

    #[test]
    fn test_packet_tiles_json_format() {
        let packet = Packet::Tiles {
            is_final: false,
            percent: 40,
        };
        let json: serde_json::Value = serde_json::to_value(&packet).unwrap();

        assert_eq!(json["Tiles"]["is_final"], false);
        assert_eq!(json["Tiles"]["percent"], 40);
    }

    #[test]
    fn test_packet_game_state_change_round_trip() {
        let packet = Packet::GameStateChange {
            state: GameState::PreparingMap,
        };
        let bytes = serde_json::to_vec(&packet).unwrap();
        let decoded: Packet = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(packet, decoded);
    }

    #[test]
    fn test_packet_kind_matches_variant() {
        assert_eq!(Packet::RequestAuth.kind(), PacketKind::RequestAuth);
        assert_eq!(
            Packet::Auth {
                credential: "a".into()
            }
            .kind(),
            PacketKind::Auth
        );
        assert_eq!(
            Packet::Kick {
                reason: String::new()
            }
            .kind(),
            PacketKind::Kick
        );
    }

    #[test]
    fn test_packet_kind_display() {
        assert_eq!(PacketKind::GameStateChange.to_string(), "GameStateChange");
    }

    #[test]
    fn test_game_state_default_is_none() {
        assert_eq!(GameState::default(), GameState::None);
    }

    #[test]
    fn test_decode_unknown_packet_kind_returns_error() {
        let unknown = r#"{"FlyToMoon": {"speed": 9000}}"#;
        let result: Result<Packet, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
