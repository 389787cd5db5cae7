//! Error types for the connection layer.

use skirmish_protocol::ProtocolError;
use skirmish_session::SessionError;
use skirmish_transport::ConnectionId;

/// Errors produced while routing events or running admin operations.
///
/// [`Connection::process_event`](crate::Connection::process_event) only
/// ever returns the contract-breach variants (`AlreadyListening`,
/// `HostConnectionEvent`, `AlreadyConnected`) or a session error while
/// seating the host. The rest are scoped to one client: the server
/// matches them itself and kicks that client.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// `Listen` arrived while a host is already seated.
    #[error("listen received twice: host already seated")]
    AlreadyListening,

    /// A client event carried the host's reserved connection id.
    #[error("client event carried the reserved host connection id")]
    HostConnectionEvent,

    /// `ClientConnect` for a connection that already holds a seat.
    #[error("connection {0} connected while already seated")]
    AlreadyConnected(ConnectionId),

    /// The packet could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A seat or settings value was malformed, or an admin operation
    /// named a bad seat.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The packet needs a seat and the sender has none.
    #[error("connection {0} holds no slot")]
    NotSeated(ConnectionId),

    /// Kick or ban aimed at the host's own seat.
    #[error("the host's slot cannot be kicked or banned")]
    HostSlot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_error() {
        let err: ConnectionError = SessionError::SlotNotOccupied(4).into();
        assert!(matches!(err, ConnectionError::Session(_)));
        assert!(err.to_string().contains("slot 4"));
    }

    #[test]
    fn test_not_seated_display_names_connection() {
        let err = ConnectionError::NotSeated(ConnectionId::new(12));
        assert_eq!(err.to_string(), "connection conn-12 holds no slot");
    }
}
