//! Error types for the session layer.

use skirmish_transport::ConnectionId;

/// Errors that can occur while reading or changing session state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A seat table, seat, or settings value could not be serialized.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A blob received from a peer is not a valid seat or settings value.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The slot index is past the end of the seat table.
    #[error("slot index {index} out of range ({count} slots)")]
    SlotOutOfRange { index: usize, count: usize },

    /// The operation needs an open slot.
    #[error("slot {0} is not open")]
    SlotNotOpen(usize),

    /// The operation needs an occupied slot.
    #[error("slot {0} is not occupied")]
    SlotNotOccupied(usize),

    /// The connection already holds a seat.
    /// A connection can sit in at most one slot.
    #[error("connection {0} already holds slot {1}")]
    AlreadySeated(ConnectionId, usize),

    /// A submitted slot carried no player.
    #[error("slot update has no player")]
    MissingPlayer,
}
