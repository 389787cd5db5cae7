//! `SkirmishServer` builder and event loop.
//!
//! This is the entry point for running a lobby. It wires the WebSocket
//! transport to the authoritative [`Server`] and feeds it events one at a
//! time, in arrival order, from a single task.

use std::net::SocketAddr;

use skirmish_connection::{Connection, Server, SessionObserver};
use skirmish_protocol::{BincodeCodec, Codec};
use skirmish_session::LocalSettings;
use skirmish_transport::{WebSocketNetwork, WebSocketTransport};

use crate::{ServerConfig, SkirmishError};

/// Builder for configuring and starting a Skirmish server.
///
/// # Example
///
/// ```rust,ignore
/// use skirmish::prelude::*;
///
/// let server = SkirmishServer::builder()
///     .bind("0.0.0.0:8080")
///     .slot_count(4)
///     .ban("203.0.113.7")
///     .build::<BincodeCodec>()
///     .await?;
/// server.run().await
/// ```
pub struct SkirmishServerBuilder {
    config: ServerConfig,
    local: LocalSettings,
    observer: Option<Box<dyn SessionObserver>>,
}

impl SkirmishServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(ServerConfig::default())
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: ServerConfig) -> Self {
        Self {
            config,
            local: LocalSettings::default(),
            observer: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the number of seats, host included.
    pub fn slot_count(mut self, count: usize) -> Self {
        self.config.slot_count = count;
        self
    }

    /// Sets the host's display name.
    pub fn host_name(mut self, name: &str) -> Self {
        self.local.player_name = name.to_string();
        self
    }

    /// Refuses connections from `remote_address`.
    pub fn ban(mut self, remote_address: &str) -> Self {
        self.local.ban(remote_address);
        self
    }

    /// Registers the notification hooks.
    pub fn observer(mut self, observer: impl SessionObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Nothing is processed until [`SkirmishServer::run`] or
    /// [`SkirmishServer::step`] is called.
    ///
    /// # Errors
    /// - [`SkirmishError::InvalidConfig`] if `slot_count` is 0 (the host
    ///   needs slot 0)
    /// - [`SkirmishError::Transport`] if binding fails
    pub async fn build<C: Codec + Default>(self) -> Result<SkirmishServer<C>, SkirmishError> {
        if self.config.slot_count == 0 {
            return Err(SkirmishError::InvalidConfig(
                "slot_count must be at least 1".into(),
            ));
        }

        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let mut server = Server::new(
            transport.network(),
            C::default(),
            self.local,
            self.config.slot_count,
        );
        if let Some(observer) = self.observer {
            server.set_observer(observer);
        }

        Ok(SkirmishServer { transport, server })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Skirmish server.
///
/// Call [`run()`](Self::run) to process events until the transport stops,
/// or [`step()`](Self::step) to interleave event processing with host-side
/// actions such as kicks and chat.
pub struct SkirmishServer<C: Codec = BincodeCodec> {
    transport: WebSocketTransport,
    server: Server<WebSocketNetwork, C>,
}

impl SkirmishServer<BincodeCodec> {
    /// Creates a new builder.
    pub fn builder() -> SkirmishServerBuilder {
        SkirmishServerBuilder::new()
    }
}

impl<C: Codec> SkirmishServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    pub fn server(&self) -> &Server<WebSocketNetwork, C> {
        &self.server
    }

    /// Host-side access: kick, ban, chat, settings.
    pub fn server_mut(&mut self) -> &mut Server<WebSocketNetwork, C> {
        &mut self.server
    }

    /// Waits for one transport event and processes it.
    ///
    /// Returns `Ok(false)` once the transport has shut down. Cancel-safe:
    /// dropping the future before an event arrives loses nothing.
    ///
    /// # Errors
    /// Returns [`SkirmishError::Connection`] if the event broke the
    /// server's contract (for example a second `Listen`). The session
    /// state can no longer be trusted after that.
    pub async fn step(&mut self) -> Result<bool, SkirmishError> {
        let Some(event) = self.transport.next_event().await else {
            return Ok(false);
        };
        self.server.process_event(event)?;
        Ok(true)
    }

    /// Processes events until the transport stops.
    ///
    /// # Errors
    /// Stops at the first contract breach, see [`SkirmishServer::step`].
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        tracing::info!(addr = %self.local_addr(), "Skirmish server running");

        loop {
            match self.step().await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!("transport closed, stopping");
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "fatal session error, stopping");
                    return Err(e);
                }
            }
        }
    }

    /// Stops accepting new connections.
    pub fn shutdown(&self) {
        self.transport.shutdown();
    }
}
