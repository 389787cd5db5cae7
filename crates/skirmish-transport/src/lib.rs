//! Transport layer for Skirmish.
//!
//! The session server never manages sockets itself. It sees the network as
//! two things:
//!
//! - a stream of inbound [`Event`]s, delivered one at a time in arrival
//!   order (listen, connect, disconnect, packet, error), and
//! - a [`Network`] handle it can call to send bytes to a connection or to
//!   drop it.
//!
//! ```text
//! sockets ──→ transport tasks ──→ Event queue ──→ Connection::process_event
//!                    ↑                                     │
//!                    └──────── Network::send / disconnect ─┘
//! ```
//!
//! `Network` is the only part of the stack that must be safe to call from
//! several threads at once: the transport's own worker tasks read and write
//! sockets while the protocol layer pushes outbound data.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketNetwork, WebSocketTransport};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a connection.
///
/// The transport hands out ids starting at 1. Id 0 is reserved for the
/// host, who lives inside the server process and never has a socket.
///
/// `#[serde(transparent)]` puts it on the wire as a plain number, which
/// is how seat tables carry it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// The host's loopback id. Nothing is ever sent to it over the wire.
    pub const HOST: ConnectionId = ConnectionId(0);

    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }

    /// Returns `true` for the reserved host id.
    pub fn is_host(self) -> bool {
        self == Self::HOST
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Something that happened on the network, in the order it happened.
///
/// Every variant except [`Event::Listen`] carries the connection it is
/// about. The enum is `#[non_exhaustive]` so consumers keep a fallback arm
/// for kinds a newer transport may add.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Event {
    /// The transport is bound and accepting connections.
    Listen,

    /// A client opened a connection. No seat is reserved yet.
    ClientConnect {
        cid: ConnectionId,
        remote_address: String,
    },

    /// A client connection is gone for good.
    ClientDisconnect { cid: ConnectionId },

    /// A raw frame arrived from a client.
    Packet { cid: ConnectionId, data: Vec<u8> },

    /// The transport hit an error on this connection.
    Error {
        cid: ConnectionId,
        message: String,
    },
}

impl Event {
    /// The connection this event is about, if any.
    pub fn cid(&self) -> Option<ConnectionId> {
        match self {
            Self::Listen => None,
            Self::ClientConnect { cid, .. }
            | Self::ClientDisconnect { cid }
            | Self::Packet { cid, .. }
            | Self::Error { cid, .. } => Some(*cid),
        }
    }
}

/// Outbound half of the transport, shared with the protocol layer.
///
/// Both methods must return quickly and must be callable while the
/// transport's worker tasks are running: implementations queue the work
/// (channel, or queue + lock) rather than touching sockets inline.
pub trait Network: Send + Sync + 'static {
    /// Queues `data` for delivery to `cid`.
    ///
    /// # Errors
    /// Returns [`TransportError::UnknownConnection`] if `cid` is not (or no
    /// longer) connected.
    fn send(&self, cid: ConnectionId, data: Vec<u8>) -> Result<(), TransportError>;

    /// Closes the connection to `cid` after everything already queued for
    /// it has been flushed.
    ///
    /// The matching [`Event::ClientDisconnect`] arrives later through the
    /// event stream, never synchronously.
    fn disconnect(&self, cid: ConnectionId) -> Result<(), TransportError>;
}

impl<N: Network> Network for Arc<N> {
    fn send(&self, cid: ConnectionId, data: Vec<u8>) -> Result<(), TransportError> {
        (**self).send(cid, data)
    }

    fn disconnect(&self, cid: ConnectionId) -> Result<(), TransportError> {
        (**self).disconnect(cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_host_is_zero() {
        assert_eq!(ConnectionId::HOST.into_inner(), 0);
        assert!(ConnectionId::new(0).is_host());
        assert!(!ConnectionId::new(1).is_host());
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }

    #[test]
    fn test_event_cid_listen_has_none() {
        assert_eq!(Event::Listen.cid(), None);
    }

    #[test]
    fn test_event_cid_returns_connection() {
        let cid = ConnectionId::new(3);
        let events = [
            Event::ClientConnect {
                cid,
                remote_address: "10.0.0.1".into(),
            },
            Event::ClientDisconnect { cid },
            Event::Packet {
                cid,
                data: vec![1, 2],
            },
            Event::Error {
                cid,
                message: "reset".into(),
            },
        ];
        for event in events {
            assert_eq!(event.cid(), Some(cid), "{event:?}");
        }
    }
}
