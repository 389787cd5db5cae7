//! # Skirmish
//!
//! Authoritative lobby server for multiplayer games.
//!
//! Skirmish owns a fixed table of player seats, authenticates clients over
//! WebSockets, assigns seats first-fit, relays chat and seat edits, and
//! keeps every client's view of the roster and game settings in sync.
//! Kicks and bans are issued by the host through [`Server`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! # async fn run() -> Result<(), SkirmishError> {
//! skirmish::init_logging("info");
//!
//! let server = SkirmishServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .host_name("Commander")
//!     .build::<BincodeCodec>()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod server;

pub use config::ServerConfig;
pub use error::SkirmishError;
pub use server::{SkirmishServer, SkirmishServerBuilder};

pub use skirmish_connection::{Connection, ConnectionError, NoopObserver, Server, SessionObserver};
pub use skirmish_protocol::{
    BincodeCodec, Codec, GameState, JsonCodec, Packet, PacketKind, ProtocolError,
};
pub use skirmish_session::{
    DifficultyLevel, Faction, GameMode, GameRules, GameSessionState, GlobalSettings,
    LocalSettings, MapParameter, MapSettings, MapSize, Player, PlayerRole, SessionError,
    Settings, Slot, SlotState, Slots,
};
pub use skirmish_transport::{
    ConnectionId, Event, Network, TransportError, WebSocketNetwork, WebSocketTransport,
};

/// Installs a `tracing` subscriber that prints to stderr.
///
/// `default_directive` applies when `RUST_LOG` is unset, e.g. `"info"` or
/// `"skirmish_connection=debug,info"`. Calling this twice is harmless;
/// the second call leaves the first subscriber in place.
pub fn init_logging(default_directive: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Everything needed to run a server and write an observer.
pub mod prelude {
    pub use crate::{
        BincodeCodec, Codec, Connection, ConnectionId, GameState, JsonCodec, Player,
        PlayerRole, ServerConfig, SessionObserver, SkirmishError, SkirmishServer,
        SkirmishServerBuilder, Slot, SlotState,
    };
}
