//! End-to-end tests: real `SocketSession`s against an in-process Socket.IO
//! server speaking just enough of the room protocol.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;

use big2_client::application::ports::{IdentityRepository, StoredIdentity};
use big2_client::application::room_session::RoomSessionUseCase;
use big2_client::application::session_state::JoinForm;
use big2_client::infrastructure::connection::{SessionEvent, SocketSession, SocketSessionConfig};
use big2_client::infrastructure::dispatch::dispatch_session_events;
use big2_client::infrastructure::subscription::Subscription;
use big2_client::infrastructure::toast_service::ToastService;
use big2_core::protocol::codec::{self, Handshake};
use big2_core::protocol::messages::{ClientEvent, ServerEvent};

// ── Fake server ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Room {
    players: Vec<String>,
    creator_id: Option<String>,
}

struct FakeServer {
    addr: SocketAddr,
    frames: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeServer {
    /// Accepts connections, handing out `sids` in order.
    async fn start(sids: Vec<&'static str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let frames = Arc::new(Mutex::new(Vec::new()));
        let room = Arc::new(Mutex::new(Room::default()));
        let (roster_tx, _) = broadcast::channel::<String>(16);

        let recorded = Arc::clone(&frames);
        tokio::spawn(async move {
            for sid in sids {
                let Ok((stream, _)) = listener.accept().await else { return };
                tokio::spawn(serve(stream, sid, Arc::clone(&room), roster_tx.clone(), Arc::clone(&recorded)));
            }
        });
        Self { addr, frames }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn frames_from(&self, sid: &str) -> Vec<String> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .filter(|(from, _)| from == sid)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

async fn serve(
    stream: TcpStream,
    sid: &'static str,
    room: Arc<Mutex<Room>>,
    roster_tx: broadcast::Sender<String>,
    frames: Arc<Mutex<Vec<(String, String)>>>,
) {
    let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
    let (mut write, mut read) = ws.split();
    let mut roster_rx = roster_tx.subscribe();
    let mut joined = false;

    let open = codec::encode_open(&Handshake {
        sid: format!("eio-{sid}"),
        upgrades: vec![],
        ping_interval: 25_000,
        ping_timeout: 20_000,
        max_payload: Some(1_000_000),
    })
    .unwrap();
    write.send(Message::Text(open)).await.unwrap();

    loop {
        tokio::select! {
            message = read.next() => {
                let text = match message {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(_)) => continue,
                    _ => return,
                };
                frames.lock().unwrap().push((sid.to_string(), text.clone()));

                if text == "40" {
                    write.send(Message::Text(codec::encode_connect_ack(sid))).await.unwrap();
                    write.send(Message::Text("2".to_string())).await.unwrap();
                    continue;
                }
                if text == "41" {
                    return;
                }
                match codec::decode_client_event(&text) {
                    Ok(ClientEvent::RequestRandomUsername {}) => {
                        let reply = ServerEvent::AssignUsername { username: format!("Player-{sid}") };
                        write.send(Message::Text(codec::encode_event(&reply).unwrap())).await.unwrap();
                    }
                    Ok(ClientEvent::JoinRoom { player_name, .. }) => {
                        joined = true;
                        let update = {
                            let mut room = room.lock().unwrap();
                            room.players.push(player_name);
                            let creator_id = room.creator_id.get_or_insert_with(|| sid.to_string()).clone();
                            ServerEvent::RoomUpdate { players: room.players.clone(), creator_id }
                        };
                        let _ = roster_tx.send(codec::encode_event(&update).unwrap());
                    }
                    _ => {}
                }
            }
            Ok(frame) = roster_rx.recv() => {
                if joined {
                    write.send(Message::Text(frame)).await.unwrap();
                }
            }
        }
    }
}

/// Completes the handshake with a short heartbeat, then never sends again.
async fn start_silent_server(sid: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                let (mut write, mut read) = ws.split();
                let open = codec::encode_open(&Handshake {
                    sid: format!("eio-{sid}"),
                    upgrades: vec![],
                    ping_interval: 100,
                    ping_timeout: 100,
                    max_payload: None,
                })
                .unwrap();
                write.send(Message::Text(open)).await.unwrap();
                while let Some(Ok(message)) = read.next().await {
                    if message == Message::Text("40".to_string()) {
                        write.send(Message::Text(codec::encode_connect_ack(sid))).await.unwrap();
                    }
                }
            });
        }
    });
    addr
}

// ── Client harness ────────────────────────────────────────────────────────────

struct NoIdentity;

impl IdentityRepository for NoIdentity {
    fn load(&self) -> StoredIdentity {
        StoredIdentity::default()
    }
    fn save_username(&self, _: &str) {}
    fn save_room_name(&self, _: &str) {}
}

struct Client {
    socket: Arc<SocketSession>,
    session: Arc<RoomSessionUseCase>,
}

impl Client {
    async fn connect(server_url: String) -> Self {
        let socket = Arc::new(
            SocketSession::new(SocketSessionConfig {
                server_url,
                reconnect_interval: Duration::from_millis(100),
                ..Default::default()
            })
            .unwrap(),
        );
        let toasts = Arc::new(ToastService::new(3, Duration::from_secs(2)));
        let session = Arc::new(RoomSessionUseCase::new(socket.clone(), toasts, Arc::new(NoIdentity)));
        tokio::spawn(dispatch_session_events(Subscription::all(socket.subscribe()), session.clone(), |_| {}));

        let mut lifecycle = socket.subscribe_to(&[]);
        assert!(socket.connect());
        let event = timeout(Duration::from_secs(5), lifecycle.recv()).await.expect("no connect");
        assert!(matches!(event, Some(SessionEvent::Connected { .. })));
        Self { socket, session }
    }

    async fn join(&self, room_name: &str, username: &str) {
        self.session
            .join_room(JoinForm { room_name: room_name.into(), username: username.into() })
            .await;
    }

    async fn wait_for_players(&self, count: usize) {
        timeout(Duration::from_secs(5), async {
            while self.session.snapshot().await.players().len() != count {
                sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("roster never arrived");
    }
}

async fn wait_for_frame(server: &FakeServer, sid: &str, frame: &str) {
    timeout(Duration::from_secs(5), async {
        while !server.frames_from(sid).iter().any(|f| f == frame) {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("server never saw {frame:?} from {sid}"));
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_joiner_is_confirmed_creator_and_second_is_not() {
    // Arrange
    let server = FakeServer::start(vec!["sid-alice", "sid-bob"]).await;
    let alice = Client::connect(server.url()).await;

    // Act
    alice.join("Friday", "Alice").await;
    alice.wait_for_players(1).await;
    let bob = Client::connect(server.url()).await;
    bob.join("Friday", "Bob").await;
    bob.wait_for_players(2).await;
    alice.wait_for_players(2).await;

    // Assert
    let alice_state = alice.session.snapshot().await;
    assert_eq!(alice_state.players(), ["Alice".to_string(), "Bob".to_string()]);
    assert_eq!(alice_state.creator_id(), Some("sid-alice"));
    assert!(!alice_state.creator_is_predicted());
    assert!(alice.session.is_creator().await);
    assert!(!bob.session.is_creator().await);
}

#[tokio::test]
async fn test_connect_claims_a_username_and_answers_pings() {
    let server = FakeServer::start(vec!["sid-carol"]).await;
    let carol = Client::connect(server.url()).await;

    wait_for_frame(&server, "sid-carol", "3").await;
    timeout(Duration::from_secs(5), async {
        while carol.session.snapshot().await.username() != "Player-sid-carol" {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("username never assigned");

    let frames = server.frames_from("sid-carol");
    assert_eq!(frames[0], "40");
    assert!(frames.iter().any(|f| f == r#"42["requestRandomUsername",{}]"#));
}

#[tokio::test]
async fn test_disconnect_sends_socket_disconnect_packet() {
    // Arrange
    let server = FakeServer::start(vec!["sid-dave"]).await;
    let dave = Client::connect(server.url()).await;

    // Act
    dave.socket.disconnect().await;

    // Assert
    wait_for_frame(&server, "sid-dave", "41").await;
    assert!(!dave.socket.is_connected());
}

#[tokio::test]
async fn test_second_connect_is_a_no_op() {
    let server = FakeServer::start(vec!["sid-erin"]).await;
    let erin = Client::connect(server.url()).await;

    assert!(!erin.socket.connect());
    assert!(erin.socket.is_connected());
}

#[tokio::test]
async fn test_silent_link_is_dropped_and_redialled() {
    // Arrange
    let addr = start_silent_server("sid-quiet").await;
    let socket = Arc::new(
        SocketSession::new(SocketSessionConfig {
            server_url: format!("http://{addr}"),
            reconnect_interval: Duration::from_millis(50),
            ..Default::default()
        })
        .unwrap(),
    );
    let mut lifecycle = socket.subscribe_to(&[]);

    // Act
    socket.connect();
    let window = Duration::from_secs(3);
    let first = timeout(window, lifecycle.recv()).await.expect("no connect");
    let lost = timeout(window, lifecycle.recv()).await.expect("silent link never detected");
    let again = timeout(window, lifecycle.recv()).await.expect("no reconnect");

    // Assert
    assert_eq!(first, Some(SessionEvent::Connected { sid: "sid-quiet".into() }));
    assert_eq!(lost, Some(SessionEvent::Disconnected));
    assert_eq!(again, Some(SessionEvent::Connected { sid: "sid-quiet".into() }));
    socket.disconnect().await;
}
