//! Game session state for Skirmish.
//!
//! This crate holds everything the authoritative server keeps about a
//! lobby, and nothing about how it gets there:
//!
//! 1. **Players**: who is taking part ([`Player`], [`PlayerRole`])
//! 2. **Seats**: a fixed table of [`Slot`]s, each closed, open, or
//!    occupied by exactly one player ([`Slots`])
//! 3. **Settings**: operator-only [`LocalSettings`] (ban list) and the
//!    [`GlobalSettings`] every client shares
//! 4. **The table**: [`GameSessionState`], which ties seats to
//!    connections
//!
//! # How it fits in the stack
//!
//! ```text
//! Connection Layer (above)  ← mutates the session in response to events
//!     ↕
//! Session Layer (this crate)  ← seats, players, settings
//!     ↕
//! Transport (below)  ← provides ConnectionId
//! ```
//!
//! Seat tables and settings cross the wire as self-describing JSON
//! strings produced by their own `serialize` / `deserialize` pair.

mod blob;
mod error;
mod player;
mod settings;
mod slot;
mod state;

pub use error::SessionError;
pub use player::{Player, PlayerRole};
pub use settings::{
    DifficultyLevel, Faction, GameMode, GameRules, GlobalSettings, LocalSettings,
    MapParameter, MapSettings, MapSize, Settings,
};
pub use slot::{Slot, SlotState, Slots};
pub use state::GameSessionState;
