use std::future::Future;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use skirmish::prelude::*;

// ---------------------------------------------------------------------------
// Host-side hooks
// ---------------------------------------------------------------------------

/// Logs lobby activity and remembers which seats changed, so the loop can
/// push them to every client once the event is done.
#[derive(Clone, Default)]
struct LobbyObserver {
    dirty_slots: Arc<Mutex<Vec<usize>>>,
}

impl LobbyObserver {
    fn mark(&self, slot_index: usize) {
        let mut dirty = self.dirty_slots.lock().unwrap_or_else(|e| e.into_inner());
        if !dirty.contains(&slot_index) {
            dirty.push(slot_index);
        }
    }

    fn take_dirty(&self) -> Vec<usize> {
        std::mem::take(&mut *self.dirty_slots.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl SessionObserver for LobbyObserver {
    fn on_listen(&mut self) {
        tracing::info!("lobby open");
    }

    fn on_player_join(&mut self, slot_index: usize, _slot: &Slot, player: &Player) {
        tracing::info!(slot_index, name = %player.name, faction = %player.faction, "player joined");
        self.mark(slot_index);
    }

    fn on_player_leave(&mut self, slot_index: usize, _slot: &Slot, player: &Player) {
        tracing::info!(slot_index, name = %player.name, "player left");
        self.mark(slot_index);
    }

    fn on_slot_update(&mut self, slot_index: usize, slot: &Slot) {
        if let Some(player) = slot.player() {
            tracing::info!(slot_index, name = %player.name, ready = player.ready, "slot updated");
        }
        self.mark(slot_index);
    }

    fn on_message(&mut self, text: &str) {
        tracing::info!(%text, "chat");
    }
}

// ---------------------------------------------------------------------------
// Lobby loop
// ---------------------------------------------------------------------------

/// Processes events until `shutdown` resolves or the transport stops,
/// pushing every changed seat to all clients after each event.
async fn run_lobby<C: Codec>(
    mut server: SkirmishServer<C>,
    observer: LobbyObserver,
    shutdown: impl Future<Output = ()>,
) -> Result<(), SkirmishError> {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                server.server_mut().message("Server shutting down")?;
                server.shutdown();
                return Ok(());
            }
            step = server.step() => {
                if !step? {
                    return Ok(());
                }
                for slot_index in observer.take_dirty() {
                    server.server().update_slot(slot_index)?;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    skirmish::init_logging("info");

    let bind = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());
    let observer = LobbyObserver::default();

    let server = match SkirmishServer::builder()
        .bind(&bind)
        .observer(observer.clone())
        .build::<BincodeCodec>()
        .await
    {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, %bind, "failed to start lobby");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(addr = %server.local_addr(), "lobby server started");

    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    match run_lobby(server, observer, ctrl_c).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "lobby stopped");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use skirmish::Packet;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn start() -> (String, tokio::sync::oneshot::Sender<()>) {
        let observer = LobbyObserver::default();
        let server = SkirmishServer::builder()
            .bind("127.0.0.1:0")
            .observer(observer.clone())
            .build::<BincodeCodec>()
            .await
            .unwrap();
        let addr = server.local_addr().to_string();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = run_lobby(server, observer, async {
                let _ = stop_rx.await;
            })
            .await;
        });
        (addr, stop_tx)
    }

    async fn send(ws: &mut Ws, packet: &Packet) {
        ws.send(Message::Binary(BincodeCodec.encode(packet).unwrap().into()))
            .await
            .unwrap();
    }

    async fn recv(ws: &mut Ws) -> Packet {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let Message::Binary(data) = msg {
                return BincodeCodec.decode(&data).unwrap();
            }
        }
    }

    async fn join(addr: &str, name: &str) -> Ws {
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        assert_eq!(recv(&mut ws).await, Packet::RequestAuth);
        send(&mut ws, &Packet::Auth { credential: name.into() }).await;
        assert!(matches!(recv(&mut ws).await, Packet::Players { .. }));
        assert!(matches!(recv(&mut ws).await, Packet::GlobalSettings { .. }));
        ws
    }

    #[tokio::test]
    async fn test_lobby_join_is_pushed_to_seated_clients() {
        let (addr, _stop) = start().await;

        let mut alice = join(&addr, "alice").await;
        // Alice's own join comes back as a seat update too.
        assert!(matches!(recv(&mut alice).await, Packet::SlotUpdate { slot_index: 1, .. }));

        let _bob = join(&addr, "bob").await;
        match recv(&mut alice).await {
            Packet::SlotUpdate { slot_index, slot } => {
                assert_eq!(slot_index, 2);
                let slot = Slot::deserialize(&slot).unwrap();
                assert_eq!(slot.player().unwrap().name, "bob");
            }
            other => panic!("expected SlotUpdate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lobby_ready_flag_is_relayed() {
        let (addr, _stop) = start().await;

        let mut alice = join(&addr, "alice").await;
        let Packet::SlotUpdate { slot, .. } = recv(&mut alice).await else {
            panic!("expected alice's own seat");
        };

        let mut seat = Slot::deserialize(&slot).unwrap();
        seat.player_mut().unwrap().ready = true;
        send(&mut alice, &Packet::UpdateSlot { slot: seat.serialize().unwrap() }).await;

        let Packet::SlotUpdate { slot_index, slot } = recv(&mut alice).await else {
            panic!("expected relayed seat");
        };
        assert_eq!(slot_index, 1);
        assert!(Slot::deserialize(&slot).unwrap().player().unwrap().ready);
    }

    #[tokio::test]
    async fn test_lobby_shutdown_announces_to_clients() {
        let (addr, stop) = start().await;

        let mut alice = join(&addr, "alice").await;
        assert!(matches!(recv(&mut alice).await, Packet::SlotUpdate { .. }));

        stop.send(()).unwrap();

        assert_eq!(
            recv(&mut alice).await,
            Packet::Message { text: "<Host> Server shutting down".into() }
        );
    }
}
