//! Unified error type for Skirmish.

use skirmish_connection::ConnectionError;
use skirmish_protocol::ProtocolError;
use skirmish_session::SessionError;
use skirmish_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// Binding the listener failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A packet could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Session state was invalid.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The server hit a contract breach while processing events, or an
    /// admin operation was rejected.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The server configuration cannot work.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
