//! Error types for the protocol layer.
//!
//! Each crate in Skirmish defines its own error enum, so a `ProtocolError`
//! always means a packet could not be turned into bytes or back, never a
//! networking or seating problem.

/// Boxed source error from whichever codec produced it.
pub type CodecSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a packet into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] CodecSource),

    /// Deserialization failed (turning bytes into a packet).
    ///
    /// Common causes: truncated frames, an unknown packet tag, or a peer
    /// speaking a different codec.
    #[error("decode failed: {0}")]
    Decode(#[source] CodecSource),
}
