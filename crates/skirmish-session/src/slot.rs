//! Slots: the fixed seats of a session.
//!
//! A slot is a small state machine:
//!
//! ```text
//!   Open ──(occupy)──→ Occupied ──(clear)──→ Open
//!                          │
//!                  (kick: close_after_clear = true, still Occupied)
//!                          │
//!                          └───────(clear)──→ Open
//! ```
//!
//! `Closed` is an administrative state; the lobby protocol itself never
//! produces it.

use serde::{Deserialize, Serialize};
use skirmish_transport::ConnectionId;

use crate::blob::{from_blob, to_blob};
use crate::{Player, SessionError};

/// The state of a single seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SlotState {
    /// Not available to anyone.
    Closed,
    /// Free for the next player who authenticates.
    #[default]
    Open,
    /// Held by a player.
    Occupied,
}

/// One seat in the session.
///
/// Invariant: `player` is `Some` exactly when `state` is
/// [`SlotState::Occupied`]. The fields are private so only the methods
/// below can move between states.
///
/// On the wire a slot carries its state, connection id and player. The
/// remote address and the kick flag stay on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    state: SlotState,
    #[serde(default)]
    player: Option<Player>,
    cid: ConnectionId,
    #[serde(skip)]
    remote_address: String,
    #[serde(skip)]
    close_after_clear: bool,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            state: SlotState::Open,
            player: None,
            cid: ConnectionId::HOST,
            remote_address: String::new(),
            close_after_clear: false,
        }
    }
}

impl Slot {
    /// A fresh open slot.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SlotState::Open
    }

    pub fn is_occupied(&self) -> bool {
        self.state == SlotState::Occupied
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }

    /// Connection of the occupying client. Meaningless unless occupied.
    pub fn cid(&self) -> ConnectionId {
        self.cid
    }

    /// Remote address of the occupying client, kept for ban bookkeeping.
    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    /// `true` once a kick has been issued and the seat is waiting for the
    /// old connection's disconnect.
    pub fn close_after_clear(&self) -> bool {
        self.close_after_clear
    }

    /// Marks the seat as kicked. It stays occupied until
    /// [`Slot::clear`] runs on the connection's disconnect.
    pub fn set_close_after_clear(&mut self) {
        self.close_after_clear = true;
    }

    /// Seats `player` here.
    pub fn occupy(
        &mut self,
        player: Player,
        cid: ConnectionId,
        remote_address: impl Into<String>,
    ) {
        self.state = SlotState::Occupied;
        self.player = Some(player);
        self.cid = cid;
        self.remote_address = remote_address.into();
        self.close_after_clear = false;
    }

    /// Empties the seat and hands back its player, if there was one. The
    /// seat ends up open.
    pub fn clear(&mut self) -> Option<Player> {
        let player = self.player.take();
        *self = Self::default();
        player
    }

    /// Closes an empty seat so nobody can take it.
    ///
    /// # Errors
    /// Returns [`SessionError::SlotNotOpen`] unless the seat is open.
    pub fn close(&mut self, index: usize) -> Result<(), SessionError> {
        if !self.is_open() {
            return Err(SessionError::SlotNotOpen(index));
        }
        self.state = SlotState::Closed;
        Ok(())
    }

    /// Reopens a closed seat. Does nothing to an open or occupied seat.
    pub fn open(&mut self) {
        if self.state == SlotState::Closed {
            self.state = SlotState::Open;
        }
    }

    /// Serializes for a `SlotUpdate` or `UpdateSlot` packet.
    pub fn serialize(&self) -> Result<String, SessionError> {
        to_blob(self)
    }

    /// Parses what [`Slot::serialize`] produced.
    pub fn deserialize(blob: &str) -> Result<Self, SessionError> {
        from_blob(blob)
    }

    /// Applies a seat edited and submitted by its own client.
    ///
    /// Only the lobby choices are taken from the submitted player: faction,
    /// difficulty and the ready flag. Name and role were fixed at
    /// authentication and stay as they are, as do state, connection and
    /// address.
    ///
    /// # Errors
    /// - [`SessionError::Decode`] if the blob is not a slot
    /// - [`SessionError::MissingPlayer`] if either side has no player
    pub fn apply_update(&mut self, blob: &str) -> Result<(), SessionError> {
        let submitted = Self::deserialize(blob)?
            .player
            .ok_or(SessionError::MissingPlayer)?;
        let player = self.player.as_mut().ok_or(SessionError::MissingPlayer)?;

        player.faction = submitted.faction;
        player.difficulty = submitted.difficulty;
        player.ready = submitted.ready;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// The ordered seat table. Addressed by index; index 0 is the host's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slots {
    slots: Vec<Slot>,
}

impl Slots {
    /// Resizes the table to `count` seats. New seats are open.
    pub fn resize(&mut self, count: usize) {
        self.slots.resize_with(count, Slot::new);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    /// Like [`Slots::get_mut`], but with an error naming the table size.
    pub fn try_get_mut(&mut self, index: usize) -> Result<&mut Slot, SessionError> {
        let count = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(SessionError::SlotOutOfRange { index, count })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// Index of the first open seat, scanning from 0.
    pub fn first_open(&self) -> Option<usize> {
        self.slots.iter().position(Slot::is_open)
    }

    /// Serializes the whole table for a `Players` packet.
    pub fn serialize(&self) -> Result<String, SessionError> {
        to_blob(self)
    }

    /// Parses what [`Slots::serialize`] produced.
    pub fn deserialize(blob: &str) -> Result<Self, SessionError> {
        from_blob(blob)
    }
}
