//! The authoritative lobby server.
//!
//! [`Server`] reacts to one transport [`Event`] at a time:
//!
//! | Event | What happens |
//! |---|---|
//! | `Listen` | settings reset, seat table allocated, host seated at slot 0 / cid 0 |
//! | `ClientConnect` | banned address → kick; otherwise `RequestAuth`. No seat yet. |
//! | `ClientDisconnect` | seat released, `on_player_leave` |
//! | `Packet` | decode, then `Auth` / `UpdateSlot` / `Message`; anything else is logged |
//! | `Error` | treated as a protocol error: the client is kicked |
//!
//! A client that sends garbage, or a packet it is not entitled to send,
//! is kicked with "Network protocol error". That never stops the server.
//!
//! Kicks are two-phase. The seat is flagged (`close_after_clear`), the
//! client gets a `Kick` packet and the transport is asked to close it.
//! The seat is released only when the matching `ClientDisconnect` comes
//! back, so it is never handed out while the old socket is still live.
//! Packets still arriving on a kicked connection are dropped, and a
//! connection kicked before authenticating can no longer take a seat.

use std::collections::HashMap;
use std::fmt;

use skirmish_protocol::{BincodeCodec, Codec, GameState, Packet};
use skirmish_session::{
    GameSessionState, GlobalSettings, LocalSettings, Player, PlayerRole, SessionError, Slot,
};
use skirmish_transport::{ConnectionId, Event, Network};

use crate::{Connection, ConnectionError, NoopObserver, SessionObserver};

/// The host always sits here.
const HOST_SLOT: usize = 0;

const REASON_BANNED: &str = "You are banned";
const REASON_FULL: &str = "Server is full!";
const REASON_PROTOCOL: &str = "Network protocol error";
const REASON_BAD_CREDENTIAL: &str = "Authentication failed";
const REASON_DUPLICATE_AUTH: &str = "Already authenticated";

/// Authoritative server side of a lobby.
///
/// Generic over the outbound [`Network`] and the wire [`Codec`], so tests
/// can drive it with an in-memory network and the binary can pick JSON
/// for debugging.
pub struct Server<N: Network, C: Codec = BincodeCodec> {
    network: N,
    codec: C,
    state: GameSessionState,
    observer: Box<dyn SessionObserver>,
    slot_count: usize,
    /// Connections that were sent `RequestAuth` and have not authenticated
    /// or been kicked yet, with their remote address. Only these may
    /// authenticate.
    awaiting_auth: HashMap<ConnectionId, String>,
}

impl<N: Network, C: Codec> Server<N, C> {
    /// Creates a server that will allocate `slot_count` seats on `Listen`.
    pub fn new(network: N, codec: C, local: LocalSettings, slot_count: usize) -> Self {
        Self {
            network,
            codec,
            state: GameSessionState::new(local),
            observer: Box::new(NoopObserver),
            slot_count,
            awaiting_auth: HashMap::new(),
        }
    }

    /// Replaces the notification hooks.
    pub fn set_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observer = observer;
    }

    /// Drops the current hooks in favour of no-ops.
    pub fn reset_observer(&mut self) {
        self.observer = Box::new(NoopObserver);
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Seat held by the host, once listening.
    pub fn host_slot(&self) -> Option<usize> {
        self.state.slot_of(ConnectionId::HOST)
    }

    pub fn slot_of(&self, cid: ConnectionId) -> Option<usize> {
        self.state.slot_of(cid)
    }

    /// Mutable access to the shared settings. Call
    /// [`Server::update_game_settings`] afterwards to push them out.
    pub fn global_settings_mut(&mut self) -> &mut GlobalSettings {
        self.state.global_settings_mut()
    }

    // -----------------------------------------------------------------------
    // Inbound events
    // -----------------------------------------------------------------------

    fn handle_listen(&mut self) -> Result<(), ConnectionError> {
        if self.host_slot().is_some() {
            return Err(ConnectionError::AlreadyListening);
        }
        tracing::info!(slot_count = self.slot_count, "listening");

        self.state.global_settings_mut().initialize();
        self.state.resize_slots(self.slot_count);

        let host = Player::with_rules(
            self.state.local_settings().player_name.clone(),
            PlayerRole::Host,
            &self.state.global_settings().game_rules,
        );
        self.state.seat(HOST_SLOT, ConnectionId::HOST, host, "")?;

        self.observer.on_listen();
        self.observer.on_global_settings_update();
        self.notify_join(HOST_SLOT);
        Ok(())
    }

    fn handle_client_connect(
        &mut self,
        cid: ConnectionId,
        remote_address: String,
    ) -> Result<(), ConnectionError> {
        tracing::info!(%cid, %remote_address, "client connected");
        if self.state.slot_of(cid).is_some() {
            return Err(ConnectionError::AlreadyConnected(cid));
        }

        if self.state.local_settings().is_banned(&remote_address) {
            self.kick(cid, REASON_BANNED);
            return Ok(());
        }

        self.awaiting_auth.insert(cid, remote_address);
        self.send_packet(cid, &Packet::RequestAuth);
        Ok(())
    }

    fn handle_client_disconnect(&mut self, cid: ConnectionId) {
        tracing::info!(%cid, "client disconnected");
        self.awaiting_auth.remove(&cid);

        // Unmapped: the client never finished auth.
        let Some((slot_index, player)) = self.state.unseat(cid) else {
            return;
        };
        if let Some(slot) = self.state.slot(slot_index) {
            self.observer.on_player_leave(slot_index, slot, &player);
        }
    }

    fn handle_packet(&mut self, cid: ConnectionId, data: &[u8]) {
        let result = self
            .codec
            .decode::<Packet>(data)
            .map_err(ConnectionError::from)
            .and_then(|packet| self.dispatch(cid, packet));

        if let Err(e) = result {
            self.protocol_error(cid, &e);
        }
    }

    fn dispatch(&mut self, cid: ConnectionId, packet: Packet) -> Result<(), ConnectionError> {
        if self.is_being_kicked(cid) {
            tracing::debug!(%cid, kind = %packet.kind(), "packet from kicked connection, dropping");
            return Ok(());
        }

        match packet {
            Packet::Auth { credential } => self.handle_auth(cid, credential),
            Packet::UpdateSlot { slot } => self.handle_update_slot(cid, &slot),
            Packet::Message { text } => self.handle_message(cid, &text),
            other => {
                tracing::warn!(%cid, kind = %other.kind(), "invalid packet kind from client");
                Ok(())
            }
        }
    }

    fn handle_auth(&mut self, cid: ConnectionId, credential: String) -> Result<(), ConnectionError> {
        if let Some(slot_index) = self.state.slot_of(cid) {
            tracing::info!(%cid, slot_index, "duplicate authentication, disconnecting");
            self.kick(cid, REASON_DUPLICATE_AUTH);
            return Ok(());
        }

        // Banned or already kicked: the disconnect is on its way.
        let Some(remote_address) = self.awaiting_auth.remove(&cid) else {
            tracing::warn!(%cid, "authentication from connection not awaiting it, ignoring");
            return Ok(());
        };

        if credential.is_empty() {
            tracing::info!(%cid, "authentication failed, disconnecting");
            self.kick(cid, REASON_BAD_CREDENTIAL);
            return Ok(());
        }
        tracing::info!(%cid, name = %credential, "got authentication");

        let Some(slot_index) = self.state.first_open_slot() else {
            tracing::info!(%cid, name = %credential, "no free slots, dropping");
            self.kick(cid, REASON_FULL);
            return Ok(());
        };

        let player = Player::with_rules(
            credential,
            PlayerRole::Player,
            &self.state.global_settings().game_rules,
        );
        self.state.seat(slot_index, cid, player, &remote_address)?;

        tracing::debug!(%cid, slot_index, "sending players list");
        let slots = self.state.slots().serialize()?;
        self.send_packet(cid, &Packet::Players { slot_index, slots });
        self.send_global_settings(cid)?;

        self.notify_join(slot_index);
        Ok(())
    }

    fn handle_update_slot(&mut self, cid: ConnectionId, blob: &str) -> Result<(), ConnectionError> {
        tracing::debug!(%cid, "got slot update");
        let slot_index = self.state.slot_of(cid).ok_or(ConnectionError::NotSeated(cid))?;
        let slot = self
            .state
            .slot_mut(slot_index)
            .ok_or(ConnectionError::NotSeated(cid))?;

        slot.apply_update(blob)?;
        self.observer.on_slot_update(slot_index, slot);
        Ok(())
    }

    fn handle_message(&mut self, cid: ConnectionId, text: &str) -> Result<(), ConnectionError> {
        tracing::debug!(%cid, text, "got chat message");
        let player = self.state.player_of(cid).ok_or(ConnectionError::NotSeated(cid))?;
        let line = format_chat_message(player, text);
        self.global_message(line);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Outbound operations
    // -----------------------------------------------------------------------

    /// Calls `f` once for every seated client. The host's own seat is
    /// skipped: nothing is ever sent to connection 0.
    pub fn broadcast(&self, mut f: impl FnMut(ConnectionId)) {
        self.state
            .slots()
            .iter()
            .filter(|slot| slot.is_occupied() && !slot.cid().is_host())
            .for_each(|slot| f(slot.cid()));
    }

    /// Kicks whoever sits at `slot_index`.
    ///
    /// The seat stays occupied, flagged `close_after_clear`, until the
    /// client's disconnect arrives.
    ///
    /// # Errors
    /// - [`SessionError::SlotOutOfRange`] / [`SessionError::SlotNotOccupied`]
    ///   wrapped in [`ConnectionError::Session`]
    /// - [`ConnectionError::HostSlot`] for the host's own seat
    pub fn kick_from_slot(&mut self, slot_index: usize, reason: &str) -> Result<(), ConnectionError> {
        let slot = self.occupied_client_slot_mut(slot_index)?;
        slot.set_close_after_clear();
        let cid = slot.cid();
        self.kick(cid, reason);
        Ok(())
    }

    /// Like [`Server::kick_from_slot`], but first adds the occupant's remote
    /// address to the ban list so it cannot reconnect.
    pub fn ban_from_slot(&mut self, slot_index: usize, reason: &str) -> Result<(), ConnectionError> {
        let address = self
            .occupied_client_slot_mut(slot_index)?
            .remote_address()
            .to_string();
        tracing::info!(slot_index, %address, "banning address");
        self.state.local_settings_mut().ban(&address);
        self.kick_from_slot(slot_index, reason)
    }

    /// Tells every client the game moved to `state`.
    pub fn change_game_state(&self, state: GameState) {
        tracing::debug!(%state, "sending game state change");
        self.broadcast_packet(&Packet::GameStateChange { state });
    }

    /// Tells every client how far map generation has got.
    pub fn send_map_generation_percentage(&self, percent: u8) {
        tracing::debug!(percent, "sending map generation percentage");
        self.broadcast_packet(&Packet::Tiles {
            is_final: false,
            percent,
        });
    }

    /// Pushes seat `slot_index` to every client.
    pub fn update_slot(&self, slot_index: usize) -> Result<(), ConnectionError> {
        let slot = self.state.slot(slot_index).ok_or(SessionError::SlotOutOfRange {
            index: slot_index,
            count: self.state.slots().len(),
        })?;
        let slot = slot.serialize()?;
        tracing::debug!(slot_index, "sending slot update");
        self.broadcast_packet(&Packet::SlotUpdate { slot_index, slot });
        Ok(())
    }

    /// Sends a chat line from the host.
    pub fn message(&mut self, text: &str) -> Result<(), ConnectionError> {
        let host = self
            .state
            .player_of(ConnectionId::HOST)
            .ok_or(ConnectionError::NotSeated(ConnectionId::HOST))?;
        let line = format_chat_message(host, text);
        self.global_message(line);
        Ok(())
    }

    /// Pushes the current global settings to every client.
    pub fn update_game_settings(&self) -> Result<(), ConnectionError> {
        let settings = self.state.global_settings().serialize()?;
        self.broadcast_packet(&Packet::GlobalSettings { settings });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn notify_join(&mut self, slot_index: usize) {
        if let Some(slot) = self.state.slot(slot_index) {
            if let Some(player) = slot.player() {
                self.observer.on_player_join(slot_index, slot, player);
            }
        }
    }

    /// `true` while the connection's seat waits for its disconnect after a
    /// kick.
    fn is_being_kicked(&self, cid: ConnectionId) -> bool {
        self.state
            .slot_of(cid)
            .and_then(|slot_index| self.state.slot(slot_index))
            .is_some_and(|slot| slot.close_after_clear())
    }

    fn occupied_client_slot_mut(&mut self, slot_index: usize) -> Result<&mut Slot, ConnectionError> {
        let slot = self.state.try_slot_mut(slot_index)?;
        if !slot.is_occupied() {
            return Err(SessionError::SlotNotOccupied(slot_index).into());
        }
        if slot.cid().is_host() {
            return Err(ConnectionError::HostSlot);
        }
        Ok(slot)
    }

    /// Hook first, then every client.
    fn global_message(&mut self, text: String) {
        self.observer.on_message(&text);
        self.broadcast_packet(&Packet::Message { text });
    }

    fn kick(&mut self, cid: ConnectionId, reason: &str) {
        tracing::info!(%cid, reason, "kicking");
        self.awaiting_auth.remove(&cid);
        self.send_packet(
            cid,
            &Packet::Kick {
                reason: reason.to_string(),
            },
        );
        if let Err(e) = self.network.disconnect(cid) {
            tracing::warn!(%cid, error = %e, "disconnect failed");
        }
    }

    fn protocol_error(&mut self, cid: ConnectionId, reason: &dyn fmt::Display) {
        tracing::warn!(%cid, %reason, "network protocol error");
        self.kick(cid, REASON_PROTOCOL);
    }

    fn send_global_settings(&self, cid: ConnectionId) -> Result<(), ConnectionError> {
        tracing::debug!(%cid, "sending global settings");
        let settings = self.state.global_settings().serialize()?;
        self.send_packet(cid, &Packet::GlobalSettings { settings });
        Ok(())
    }

    fn send_packet(&self, cid: ConnectionId, packet: &Packet) {
        match self.codec.encode(packet) {
            Ok(bytes) => self.send_bytes(cid, bytes),
            Err(e) => tracing::error!(%cid, kind = %packet.kind(), error = %e, "failed to encode packet"),
        }
    }

    /// Encodes once and sends the same bytes to every client.
    fn broadcast_packet(&self, packet: &Packet) {
        let bytes = match self.codec.encode(packet) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(kind = %packet.kind(), error = %e, "failed to encode packet");
                return;
            }
        };
        self.broadcast(|cid| self.send_bytes(cid, bytes.clone()));
    }

    fn send_bytes(&self, cid: ConnectionId, bytes: Vec<u8>) {
        if let Err(e) = self.network.send(cid, bytes) {
            tracing::warn!(%cid, error = %e, "send failed");
        }
    }
}

impl<N: Network, C: Codec> Connection for Server<N, C> {
    fn process_event(&mut self, event: Event) -> Result<(), ConnectionError> {
        if event.cid().is_some_and(ConnectionId::is_host) {
            return Err(ConnectionError::HostConnectionEvent);
        }

        match event {
            Event::Listen => self.handle_listen(),
            Event::ClientConnect {
                cid,
                remote_address,
            } => self.handle_client_connect(cid, remote_address),
            Event::ClientDisconnect { cid } => {
                self.handle_client_disconnect(cid);
                Ok(())
            }
            Event::Packet { cid, data } => {
                self.handle_packet(cid, &data);
                Ok(())
            }
            Event::Error { cid, message } => {
                self.protocol_error(cid, &message);
                Ok(())
            }
            other => {
                tracing::warn!(event = ?other, "invalid event kind");
                Ok(())
            }
        }
    }

    fn state(&self) -> &GameSessionState {
        &self.state
    }
}

fn format_chat_message(player: &Player, text: &str) -> String {
    format!("<{}> {}", player.name, text)
}
