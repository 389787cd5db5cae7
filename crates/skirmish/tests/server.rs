//! Integration tests for the full server: real sockets, real codec.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use skirmish::prelude::*;
use skirmish::{GlobalSettings, Packet, Slots};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Records joins and chat lines seen by the host.
#[derive(Clone, Default)]
struct HostLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl SessionObserver for HostLog {
    fn on_player_join(&mut self, slot_index: usize, _slot: &Slot, player: &Player) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("join {slot_index} {}", player.name));
    }

    fn on_message(&mut self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}

/// Starts a server on a random port and returns the address.
async fn start_server(builder: SkirmishServerBuilder) -> String {
    let server = builder
        .bind("127.0.0.1:0")
        .build::<BincodeCodec>()
        .await
        .expect("server should build");

    let addr = server.local_addr().to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, packet: &Packet) {
    let bytes = BincodeCodec.encode(packet).expect("should encode");
    ws.send(Message::Binary(bytes.into()))
        .await
        .expect("should send");
}

/// Receives the next packet, skipping control frames. `None` once the
/// server closes the socket.
async fn recv(ws: &mut ClientWs) -> Option<Packet> {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("server should answer in time");
        match msg {
            Some(Ok(Message::Binary(data))) => {
                return Some(BincodeCodec.decode(&data).expect("should decode"));
            }
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

/// Connects and authenticates. Returns the socket and the seat index.
async fn join(addr: &str, name: &str) -> (ClientWs, usize) {
    let mut ws = connect(addr).await;
    assert_eq!(recv(&mut ws).await, Some(Packet::RequestAuth));

    send(
        &mut ws,
        &Packet::Auth {
            credential: name.into(),
        },
    )
    .await;

    let Some(Packet::Players { slot_index, .. }) = recv(&mut ws).await else {
        panic!("expected Players after auth");
    };
    let Some(Packet::GlobalSettings { .. }) = recv(&mut ws).await else {
        panic!("expected GlobalSettings after Players");
    };
    (ws, slot_index)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_build_zero_slots_returns_invalid_config() {
    let result = SkirmishServer::builder()
        .bind("127.0.0.1:0")
        .slot_count(0)
        .build::<BincodeCodec>()
        .await;

    assert!(matches!(result, Err(SkirmishError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_step_first_event_seats_host() {
    let mut server = SkirmishServer::builder()
        .bind("127.0.0.1:0")
        .host_name("Commander")
        .slot_count(3)
        .build::<BincodeCodec>()
        .await
        .expect("server should build");

    assert!(server.step().await.expect("listen should succeed"));

    let state = server.server().state();
    assert_eq!(server.server().host_slot(), Some(0));
    assert_eq!(state.slots().len(), 3);
    assert_eq!(state.players().next().unwrap().name, "Commander");
}

#[tokio::test]
async fn test_client_auth_receives_seat_table_and_settings() {
    let addr = start_server(SkirmishServer::builder()).await;

    let mut ws = connect(&addr).await;
    assert_eq!(recv(&mut ws).await, Some(Packet::RequestAuth));

    send(
        &mut ws,
        &Packet::Auth {
            credential: "alice".into(),
        },
    )
    .await;

    let Some(Packet::Players { slot_index, slots }) = recv(&mut ws).await else {
        panic!("expected Players");
    };
    assert_eq!(slot_index, 1);
    let slots = Slots::deserialize(&slots).expect("seat table should parse");
    assert_eq!(slots.len(), ServerConfig::DEFAULT_SLOT_COUNT);
    assert_eq!(slots.get(0).unwrap().player().unwrap().role, PlayerRole::Host);
    assert_eq!(slots.get(1).unwrap().player().unwrap().name, "alice");

    let Some(Packet::GlobalSettings { settings }) = recv(&mut ws).await else {
        panic!("expected GlobalSettings");
    };
    let settings = GlobalSettings::deserialize(&settings).expect("settings should parse");
    assert!(!settings.game_rules.factions.is_empty());
}

#[tokio::test]
async fn test_chat_reaches_every_client_and_host() {
    let log = HostLog::default();
    let addr = start_server(SkirmishServer::builder().observer(log.clone())).await;

    let (mut alice, alice_slot) = join(&addr, "alice").await;
    let (mut bob, bob_slot) = join(&addr, "bob").await;
    assert_eq!((alice_slot, bob_slot), (1, 2));

    send(
        &mut alice,
        &Packet::Message {
            text: "hello".into(),
        },
    )
    .await;

    let expected = Some(Packet::Message {
        text: "<alice> hello".into(),
    });
    assert_eq!(recv(&mut alice).await, expected);
    assert_eq!(recv(&mut bob).await, expected);

    let lines = log.lines.lock().unwrap().clone();
    assert_eq!(
        lines,
        ["join 0 Host", "join 1 alice", "join 2 bob", "<alice> hello"]
    );
}

#[tokio::test]
async fn test_banned_address_is_kicked_before_auth() {
    let addr = start_server(SkirmishServer::builder().ban("127.0.0.1")).await;

    let mut ws = connect(&addr).await;

    assert_eq!(
        recv(&mut ws).await,
        Some(Packet::Kick {
            reason: "You are banned".into()
        })
    );
    assert_eq!(recv(&mut ws).await, None, "socket closes after the kick");
}

#[tokio::test]
async fn test_full_server_kicks_extra_client() {
    let addr = start_server(SkirmishServer::builder().slot_count(2)).await;

    let (_alice, slot) = join(&addr, "alice").await;
    assert_eq!(slot, 1);

    let mut bob = connect(&addr).await;
    assert_eq!(recv(&mut bob).await, Some(Packet::RequestAuth));
    send(
        &mut bob,
        &Packet::Auth {
            credential: "bob".into(),
        },
    )
    .await;

    assert_eq!(
        recv(&mut bob).await,
        Some(Packet::Kick {
            reason: "Server is full!".into()
        })
    );
    assert_eq!(recv(&mut bob).await, None);
}

#[tokio::test]
async fn test_garbage_frame_kicks_with_protocol_error() {
    let addr = start_server(SkirmishServer::builder()).await;

    let mut ws = connect(&addr).await;
    assert_eq!(recv(&mut ws).await, Some(Packet::RequestAuth));

    ws.send(Message::Binary(vec![0xFF, 0xFF, 0xFF, 0xFF].into()))
        .await
        .expect("should send");

    assert_eq!(
        recv(&mut ws).await,
        Some(Packet::Kick {
            reason: "Network protocol error".into()
        })
    );
    assert_eq!(recv(&mut ws).await, None);
}

#[tokio::test]
async fn test_leaving_frees_seat_for_next_client() {
    let addr = start_server(SkirmishServer::builder().slot_count(2)).await;

    let (mut alice, slot) = join(&addr, "alice").await;
    assert_eq!(slot, 1);
    alice.close(None).await.expect("should close");
    drop(alice);

    // The disconnect is processed asynchronously; retry until the seat frees.
    let mut seated = None;
    for _ in 0..20 {
        let mut ws = connect(&addr).await;
        assert_eq!(recv(&mut ws).await, Some(Packet::RequestAuth));
        send(
            &mut ws,
            &Packet::Auth {
                credential: "bob".into(),
            },
        )
        .await;
        if let Some(Packet::Players { slot_index, .. }) = recv(&mut ws).await {
            seated = Some(slot_index);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(seated, Some(1));
}
