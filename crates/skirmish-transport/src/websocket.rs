//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! One accept task hands each socket to its own connection task. Every
//! connection task forwards what it reads into a single unbounded event
//! queue (the one consumer is the session server) and drains its own
//! outbound queue, fed through [`WebSocketNetwork`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::{ConnectionId, Event, Network, TransportError};

/// Counter for generating unique connection IDs. Starts at 1: 0 is the host.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// Work queued for a connection task.
#[derive(Debug)]
enum Outbound {
    Data(Vec<u8>),
    Close,
}

type PeerMap = HashMap<ConnectionId, mpsc::UnboundedSender<Outbound>>;

/// A WebSocket transport: listens, accepts, and turns socket activity into
/// [`Event`]s.
///
/// The first event is always [`Event::Listen`].
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    events: mpsc::UnboundedReceiver<Event>,
    network: WebSocketNetwork,
    accept_task: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address and starts
    /// accepting connections in the background.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        let local_addr =
            listener.local_addr().map_err(TransportError::AcceptFailed)?;
        tracing::info!(%local_addr, "WebSocket transport listening");

        let (events_tx, events) = mpsc::unbounded_channel();
        let network = WebSocketNetwork::default();

        // Queued before the accept loop exists, so it is always first.
        let _ = events_tx.send(Event::Listen);

        let accept_task =
            tokio::spawn(accept_loop(listener, events_tx, network.clone()));

        Ok(Self {
            local_addr,
            events,
            network,
            accept_task,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns a cloneable handle for sending to and dropping connections.
    pub fn network(&self) -> WebSocketNetwork {
        self.network.clone()
    }

    /// Waits for the next event. Returns `None` once the transport has
    /// shut down and every connection task has finished.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Stops accepting new connections. Live connections keep running
    /// until they close.
    pub fn shutdown(&self) {
        self.accept_task.abort();
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Thread-safe outbound handle for a [`WebSocketTransport`].
///
/// Cheap to clone: every clone shares one map from connection id to that
/// connection's outbound queue.
#[derive(Debug, Clone, Default)]
pub struct WebSocketNetwork {
    peers: Arc<Mutex<PeerMap>>,
}

impl WebSocketNetwork {
    /// Number of connections currently open.
    pub fn connection_count(&self) -> usize {
        self.peers().len()
    }

    fn register(
        &self,
        cid: ConnectionId,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) {
        self.peers().insert(cid, outbound);
    }

    fn unregister(&self, cid: ConnectionId) {
        self.peers().remove(&cid);
    }

    // The map holds no invariant a panicking holder could break halfway.
    fn peers(&self) -> MutexGuard<'_, PeerMap> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Network for WebSocketNetwork {
    fn send(
        &self,
        cid: ConnectionId,
        data: Vec<u8>,
    ) -> Result<(), TransportError> {
        let peers = self.peers();
        let outbound = peers
            .get(&cid)
            .ok_or(TransportError::UnknownConnection(cid))?;
        outbound
            .send(Outbound::Data(data))
            .map_err(|_| TransportError::ConnectionClosed(cid.to_string()))
    }

    fn disconnect(&self, cid: ConnectionId) -> Result<(), TransportError> {
        let outbound = self
            .peers()
            .remove(&cid)
            .ok_or(TransportError::UnknownConnection(cid))?;
        outbound
            .send(Outbound::Close)
            .map_err(|_| TransportError::ConnectionClosed(cid.to_string()))
    }
}

async fn accept_loop(
    listener: TcpListener,
    events: mpsc::UnboundedSender<Event>,
    network: WebSocketNetwork,
) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
                continue;
            }
        };

        let events = events.clone();
        let network = network.clone();
        tokio::spawn(async move {
            match tokio_tungstenite::accept_async(stream).await {
                Ok(ws) => drive_connection(ws, addr, events, network).await,
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "WebSocket handshake failed");
                }
            }
        });
    }
}

/// Pumps one socket until either side closes it.
async fn drive_connection(
    ws: WsStream,
    addr: SocketAddr,
    events: mpsc::UnboundedSender<Event>,
    network: WebSocketNetwork,
) {
    let cid =
        ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    network.register(cid, outbound_tx);

    tracing::debug!(%cid, %addr, "accepted WebSocket connection");
    let _ = events.send(Event::ClientConnect {
        cid,
        remote_address: addr.ip().to_string(),
    });

    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Binary(data))) => {
                    let _ = events.send(Event::Packet { cid, data: data.into() });
                }
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(Event::Packet {
                        cid,
                        data: text.as_bytes().to_vec(),
                    });
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // ping/pong/raw frame
                Some(Err(e)) => {
                    let _ = events.send(Event::Error { cid, message: e.to_string() });
                    break;
                }
            },
            outgoing = outbound_rx.recv() => match outgoing {
                Some(Outbound::Data(data)) => {
                    if let Err(e) = sink.send(Message::Binary(data.into())).await {
                        tracing::debug!(%cid, error = %e, "send failed");
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.close().await;
                    break;
                }
            },
        }
    }

    network.unregister(cid);
    tracing::debug!(%cid, "WebSocket connection closed");
    let _ = events.send(Event::ClientDisconnect { cid });
}
