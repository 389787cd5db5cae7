//! Connection layer for Skirmish.
//!
//! A [`Connection`] turns the transport's event stream into session
//! changes. This crate provides the authoritative side, [`Server`], which
//! owns the [`GameSessionState`](skirmish_session::GameSessionState) and
//! runs the whole lobby protocol: request auth, seat players first-fit,
//! relay chat, apply slot edits, kick and ban.
//!
//! Whoever embeds the server learns what happened through a
//! [`SessionObserver`]. Every hook is optional and runs synchronously
//! inside the event that triggered it.
//!
//! ```text
//! Event ──→ Connection::process_event ──→ GameSessionState
//!                     │                        │
//!                     ├──→ SessionObserver     │
//!                     └──→ Network::send ←─────┘ (serialized snapshots)
//! ```

mod error;
mod observer;
mod server;

pub use error::ConnectionError;
pub use observer::{NoopObserver, SessionObserver};
pub use server::Server;

use skirmish_session::GameSessionState;
use skirmish_transport::Event;

/// Something that consumes transport events in arrival order.
///
/// `process_event` must be called one event at a time from a single task.
/// Implementations keep no locks of their own.
pub trait Connection {
    /// Handles one inbound event.
    ///
    /// # Errors
    /// Returns an error only for contract breaches by the caller or the
    /// transport, such as a second `Listen`. Misbehaving clients are
    /// kicked and never surface here.
    fn process_event(&mut self, event: Event) -> Result<(), ConnectionError>;

    /// Read-only view of the session.
    fn state(&self) -> &GameSessionState;
}
