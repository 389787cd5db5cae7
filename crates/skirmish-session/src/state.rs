//! The shared session table.
//!
//! [`GameSessionState`] ties three things together:
//!
//! - the seat table ([`Slots`]), which owns every [`Player`],
//! - an index from [`ConnectionId`] to the seat that connection holds,
//! - the session [`Settings`].
//!
//! The roster of seated players is read straight off the occupied seats,
//! so it cannot drift from the seat table.
//!
//! Nothing here locks. The connection layer mutates the state from one
//! event at a time.

use std::collections::HashMap;

use skirmish_transport::ConnectionId;

use crate::{
    GlobalSettings, LocalSettings, Player, SessionError, Settings, Slot, Slots,
};

/// Authoritative session state.
#[derive(Debug, Clone, Default)]
pub struct GameSessionState {
    slots: Slots,
    cid_slots: HashMap<ConnectionId, usize>,
    settings: Settings,
}

impl GameSessionState {
    /// Creates an empty session with the given operator settings. The seat
    /// table is empty until [`GameSessionState::resize_slots`] runs.
    pub fn new(local: LocalSettings) -> Self {
        Self {
            slots: Slots::default(),
            cid_slots: HashMap::new(),
            settings: Settings {
                local,
                global: GlobalSettings::default(),
            },
        }
    }

    /// Allocates the seat table. New seats are open.
    pub fn resize_slots(&mut self, count: usize) {
        self.slots.resize(count);
    }

    // -----------------------------------------------------------------------
    // Seating
    // -----------------------------------------------------------------------

    /// Seats `player` at `slot_index` for `cid`.
    ///
    /// # Errors
    /// - [`SessionError::SlotOutOfRange`] if there is no such seat
    /// - [`SessionError::SlotNotOpen`] if the seat is closed or taken
    /// - [`SessionError::AlreadySeated`] if `cid` already holds a seat
    pub fn seat(
        &mut self,
        slot_index: usize,
        cid: ConnectionId,
        player: Player,
        remote_address: &str,
    ) -> Result<&Slot, SessionError> {
        if let Some(&held) = self.cid_slots.get(&cid) {
            return Err(SessionError::AlreadySeated(cid, held));
        }

        let slot = self.slots.try_get_mut(slot_index)?;
        if !slot.is_open() {
            return Err(SessionError::SlotNotOpen(slot_index));
        }

        tracing::debug!(%cid, slot_index, player = %player.name, "seating player");
        slot.occupy(player, cid, remote_address);
        self.cid_slots.insert(cid, slot_index);
        Ok(slot)
    }

    /// Releases the seat `cid` holds and returns its index and player.
    ///
    /// Returns `None` if `cid` holds no seat.
    pub fn unseat(&mut self, cid: ConnectionId) -> Option<(usize, Player)> {
        let slot_index = self.cid_slots.remove(&cid)?;
        let player = self.slots.get_mut(slot_index)?.clear()?;
        tracing::debug!(%cid, slot_index, player = %player.name, "unseated player");
        Some((slot_index, player))
    }

    /// Seat index held by `cid`, if any.
    pub fn slot_of(&self, cid: ConnectionId) -> Option<usize> {
        self.cid_slots.get(&cid).copied()
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn slot(&self, slot_index: usize) -> Option<&Slot> {
        self.slots.get(slot_index)
    }

    pub fn slot_mut(&mut self, slot_index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(slot_index)
    }

    /// Like [`GameSessionState::slot_mut`], with an error for a bad index.
    pub fn try_slot_mut(&mut self, slot_index: usize) -> Result<&mut Slot, SessionError> {
        self.slots.try_get_mut(slot_index)
    }

    /// Seat the next authenticated player gets: the lowest open index.
    pub fn first_open_slot(&self) -> Option<usize> {
        self.slots.first_open()
    }

    /// Every seated player, in seat order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.slots.iter().filter_map(Slot::player)
    }

    pub fn player_count(&self) -> usize {
        self.players().count()
    }

    /// Player seated for `cid`.
    pub fn player_of(&self, cid: ConnectionId) -> Option<&Player> {
        self.slot_of(cid)
            .and_then(|index| self.slots.get(index))
            .and_then(Slot::player)
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn local_settings(&self) -> &LocalSettings {
        &self.settings.local
    }

    pub fn local_settings_mut(&mut self) -> &mut LocalSettings {
        &mut self.settings.local
    }

    pub fn global_settings(&self) -> &GlobalSettings {
        &self.settings.global
    }

    pub fn global_settings_mut(&mut self) -> &mut GlobalSettings {
        &mut self.settings.global
    }

    /// Checks that the connection index and the seat table agree:
    /// every indexed cid sits in an occupied seat carrying that cid, and
    /// every occupied seat is indexed.
    pub fn is_consistent(&self) -> bool {
        let indexed_ok = self.cid_slots.iter().all(|(cid, &index)| {
            self.slots
                .get(index)
                .is_some_and(|slot| slot.is_occupied() && slot.cid() == *cid)
        });
        let occupied = self.slots.iter().filter(|slot| slot.is_occupied()).count();
        indexed_ok && occupied == self.cid_slots.len()
    }
}
