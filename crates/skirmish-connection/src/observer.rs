//! Notification hooks for whoever embeds the server.

use skirmish_session::{Player, Slot};

/// Receives session notifications from a [`Server`](crate::Server).
///
/// Every method defaults to a no-op, so implement only what you need.
/// Hooks run synchronously inside the event that caused them, in the
/// order the server documents for that event.
pub trait SessionObserver: Send {
    /// The server is listening and the host is about to be seated.
    fn on_listen(&mut self) {}

    /// Global settings were (re)initialized.
    fn on_global_settings_update(&mut self) {}

    /// `player` took seat `slot_index`.
    fn on_player_join(&mut self, _slot_index: usize, _slot: &Slot, _player: &Player) {}

    /// `player` left seat `slot_index`. The seat is already open again;
    /// the player is dropped right after this call.
    fn on_player_leave(&mut self, _slot_index: usize, _slot: &Slot, _player: &Player) {}

    /// The occupant of seat `slot_index` edited it.
    fn on_slot_update(&mut self, _slot_index: usize, _slot: &Slot) {}

    /// A chat line, already formatted as `<name> text`.
    fn on_message(&mut self, _text: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}
