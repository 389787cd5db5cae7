//! Wire protocol for Skirmish.
//!
//! This crate defines what a lobby client and the authoritative server say
//! to each other:
//!
//! - **Packets** ([`Packet`], [`PacketKind`], [`GameState`]): the closed
//!   set of messages that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`BincodeCodec`], [`JsonCodec`]): how a
//!   packet becomes bytes and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing that.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (slots and players). It knows nothing about seats or connections;
//! seat tables and settings ride inside packets as opaque strings that
//! the session layer produces and parses.
//!
//! ```text
//! Transport (bytes) → Protocol (Packet) → Connection (session state)
//! ```

mod codec;
mod error;
mod packet;

pub use codec::Codec;
#[cfg(feature = "bincode")]
pub use codec::BincodeCodec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use packet::{GameState, Packet, PacketKind};
