//! Socket session: the one live connection to the game server.
//!
//! Speaks Socket.IO v4 over a WebSocket (see `big2_core::protocol::codec`).
//!
//! Architecture:
//! - `SocketSession` is constructed once at the root and shared by `Arc`.
//! - `connect()` spawns a background task that dials, completes the
//!   Socket.IO handshake, answers pings and reconnects when the link drops.
//!   A second `connect()` while the task is alive is a no-op.
//! - Inbound events fan out on a `broadcast` channel; views take scoped
//!   [`Subscription`]s from it.
//! - Outbound frames go through an `mpsc` queue owned by the task, so
//!   `emit` never touches the socket directly.
//! - A link that stays silent for `pingInterval + pingTimeout` (from the
//!   open handshake) counts as lost and is redialled.
//!
//! # Handshake (for beginners)
//!
//! ```text
//! server → 0{"sid":"…","pingInterval":25000,…}   Engine.IO open
//! client → 40                                     join default namespace
//! server → 40{"sid":"abc"}                        connected, "abc" is our id
//! server → 2 / client → 3                         heartbeat
//! server → 42["roomUpdate",{…}]                   event
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use big2_core::protocol::codec::{self, decode_frame, encode_event, Frame, ProtocolError};
use big2_core::protocol::messages::{ClientEvent, EventKind, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::application::ports::{EventEmitter, SessionError};
use crate::infrastructure::subscription::Subscription;

/// Errors building the socket endpoint.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported URL scheme {0:?} (expected http, https, ws or wss)")]
    UnsupportedScheme(String),
}

/// Configuration for the socket session.
#[derive(Debug, Clone)]
pub struct SocketSessionConfig {
    /// Game server base URL, e.g. `http://localhost:3002`.
    pub server_url: String,
    /// Delay between reconnect attempts.
    pub reconnect_interval: Duration,
    /// Inbound events buffered per subscriber before it starts lagging.
    pub event_capacity: usize,
}

impl Default for SocketSessionConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3002".to_string(),
            reconnect_interval: Duration::from_secs(5),
            event_capacity: 128,
        }
    }
}

/// Events delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The Socket.IO connect packet arrived; `sid` is our connection id.
    Connected { sid: String },
    /// The link dropped.  A reconnect follows unless the session was closed.
    Disconnected,
    Server(ServerEvent),
}

impl SessionEvent {
    /// Event kind for server events; lifecycle events have none.
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            SessionEvent::Server(event) => Some(event.kind()),
            _ => None,
        }
    }
}

/// Builds the WebSocket endpoint for a server base URL.
///
/// # Errors
///
/// Returns [`ConnectionError`] if the URL does not parse or uses a scheme
/// other than http(s)/ws(s).
pub fn socket_url(server_url: &str) -> Result<Url, ConnectionError> {
    let mut url = Url::parse(server_url)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ConnectionError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|()| ConnectionError::UnsupportedScheme(scheme.to_string()))?;
    url.set_path("/socket.io/");
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket");
    Ok(url)
}

enum Outbound {
    Frame(String),
    Disconnect,
}

enum LinkEnd {
    /// Dropped by the server or the network.
    Lost,
    /// Closed by us.
    Closed,
}

/// The long-lived connection to the game server.
pub struct SocketSession {
    url: Url,
    config: SocketSessionConfig,
    events_tx: broadcast::Sender<SessionEvent>,
    outbound: Mutex<Option<mpsc::Sender<Outbound>>>,
    sid: RwLock<Option<String>>,
    /// `pingInterval + pingTimeout` from the current link's handshake.
    heartbeat: Mutex<Option<Duration>>,
    task: Mutex<Option<JoinHandle<()>>>,
    closing: AtomicBool,
}

impl SocketSession {
    /// Creates a session that is not connected yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] if `config.server_url` is not usable.
    pub fn new(config: SocketSessionConfig) -> Result<Self, ConnectionError> {
        let url = socket_url(&config.server_url)?;
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Ok(Self {
            url,
            config,
            events_tx,
            outbound: Mutex::new(None),
            sid: RwLock::new(None),
            heartbeat: Mutex::new(None),
            task: Mutex::new(None),
            closing: AtomicBool::new(false),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Starts the connection task.
    ///
    /// Returns `false` without doing anything if a task is already running.
    pub fn connect(self: &Arc<Self>) -> bool {
        let mut task = lock(&self.task);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("connect ignored: session already running");
            return false;
        }
        self.closing.store(false, Ordering::SeqCst);
        let this = Arc::clone(self);
        *task = Some(tokio::spawn(async move { this.run().await }));
        true
    }

    /// Whether the Socket.IO handshake has completed.
    pub fn is_connected(&self) -> bool {
        self.sid.read().map(|sid| sid.is_some()).unwrap_or(false)
    }

    /// Every session event from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Events of the given kinds only.  Dropping the handle unsubscribes.
    pub fn subscribe_to(&self, kinds: &[EventKind]) -> Subscription {
        Subscription::filtered(self.events_tx.subscribe(), kinds)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events_tx.receiver_count()
    }

    /// Sends the Socket.IO disconnect packet and stops reconnecting.
    pub async fn disconnect(&self) {
        self.closing.store(true, Ordering::SeqCst);
        let sender = lock(&self.outbound).clone();
        let handle = lock(&self.task).take();

        let Some(mut handle) = handle else { return };
        let graceful = match sender {
            Some(tx) => tx.send(Outbound::Disconnect).await.is_ok(),
            None => false,
        };
        if graceful {
            if time::timeout(Duration::from_secs(1), &mut handle).await.is_err() {
                warn!("session task did not stop in time; aborting");
                handle.abort();
            }
        } else {
            handle.abort();
        }
        self.reset_link();
        info!("disconnected from {}", self.url);
    }

    // ── Background task ──────────────────────────────────────────────────────

    async fn run(self: Arc<Self>) {
        while !self.closing.load(Ordering::SeqCst) {
            match tokio_tungstenite::connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    info!("websocket open to {}", self.url);
                    let end = self.drive(stream).await;
                    self.reset_link();
                    let _ = self.events_tx.send(SessionEvent::Disconnected);
                    if matches!(end, LinkEnd::Closed) {
                        break;
                    }
                    info!("connection lost; reconnecting in {:?}", self.config.reconnect_interval);
                }
                Err(e) => warn!("could not connect to {}: {e}", self.url),
            }
            if !self.closing.load(Ordering::SeqCst) {
                time::sleep(self.config.reconnect_interval).await;
            }
        }
    }

    async fn drive<S>(&self, stream: S) -> LinkEnd
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
            + Unpin,
    {
        let (mut write, mut read) = stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<Outbound>(64);
        *lock(&self.outbound) = Some(out_tx);
        let mut deadline: Option<time::Instant> = None;

        loop {
            tokio::select! {
                inbound = read.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let Some(reply) = self.handle_frame(&text) else {
                            return LinkEnd::Lost;
                        };
                        deadline = (*lock(&self.heartbeat)).map(|window| time::Instant::now() + window);
                        if let Some(reply) = reply {
                            if let Err(e) = write.send(Message::Text(reply)).await {
                                error!("failed to write frame: {e}");
                                return LinkEnd::Lost;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return LinkEnd::Lost,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("websocket read error: {e}");
                        return LinkEnd::Lost;
                    }
                },
                Some(outbound) = out_rx.recv() => match outbound {
                    Outbound::Frame(frame) => {
                        debug!(frame = %frame, "send");
                        if let Err(e) = write.send(Message::Text(frame)).await {
                            error!("failed to write frame: {e}");
                            return LinkEnd::Lost;
                        }
                    }
                    Outbound::Disconnect => {
                        let _ = write.send(Message::Text(codec::DISCONNECT.to_string())).await;
                        let _ = write.close().await;
                        return LinkEnd::Closed;
                    }
                },
                () = heartbeat_expired(deadline) => {
                    warn!("no ping from the server in time; treating the link as lost");
                    return LinkEnd::Lost;
                }
            }
        }
    }

    /// Handles one inbound text frame.
    ///
    /// Returns `None` when the link must end, otherwise an optional reply.
    fn handle_frame(&self, text: &str) -> Option<Option<String>> {
        debug!(frame = %text, "recv");
        match decode_frame(text) {
            Ok(Frame::Open(handshake)) => {
                debug!(engine_sid = %handshake.sid, "engine open");
                let window = Duration::from_millis(handshake.ping_interval.saturating_add(handshake.ping_timeout));
                *lock(&self.heartbeat) = Some(window);
                Some(Some(codec::CONNECT.to_string()))
            }
            Ok(Frame::Ping) => Some(Some(codec::PONG.to_string())),
            Ok(Frame::Connect { sid }) => {
                info!(%sid, "socket connected");
                if let Ok(mut guard) = self.sid.write() {
                    *guard = Some(sid.clone());
                }
                let _ = self.events_tx.send(SessionEvent::Connected { sid });
                Some(None)
            }
            Ok(Frame::Event(event)) => {
                let _ = self.events_tx.send(SessionEvent::Server(event));
                Some(None)
            }
            Ok(Frame::ConnectError { message }) => {
                warn!("server refused connection: {message}");
                None
            }
            Ok(Frame::Disconnect | Frame::Close) => {
                info!("server closed the session");
                None
            }
            Ok(Frame::Pong | Frame::Noop) => Some(None),
            Err(ProtocolError::UnknownEvent(name)) => {
                debug!(event = %name, "ignoring unknown event");
                Some(None)
            }
            Err(e) => {
                warn!("skipping malformed frame: {e}");
                Some(None)
            }
        }
    }

    fn reset_link(&self) {
        *lock(&self.outbound) = None;
        *lock(&self.heartbeat) = None;
        if let Ok(mut sid) = self.sid.write() {
            *sid = None;
        }
    }
}

#[async_trait]
impl EventEmitter for SocketSession {
    async fn emit(&self, event: ClientEvent) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        let frame = encode_event(&event)?;
        let sender = lock(&self.outbound).clone().ok_or(SessionError::NotConnected)?;
        debug!(event = event.name(), "emit");
        sender.send(Outbound::Frame(frame)).await.map_err(|_| SessionError::Closed)
    }

    fn connection_id(&self) -> Option<String> {
        self.sid.read().ok().and_then(|sid| sid.clone())
    }
}

/// Resolves at `deadline`; never resolves before the handshake set one.
async fn heartbeat_expired(deadline: Option<time::Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url_maps_http_to_ws() {
        let url = socket_url("http://localhost:3002").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:3002/socket.io/?EIO=4&transport=websocket");
    }

    #[test]
    fn test_socket_url_maps_https_to_wss_and_drops_path() {
        let url = socket_url("https://api.big2.prestontang.dev/some/path?x=1").unwrap();
        assert_eq!(url.as_str(), "wss://api.big2.prestontang.dev/socket.io/?EIO=4&transport=websocket");
    }

    #[test]
    fn test_socket_url_rejects_other_schemes() {
        assert!(matches!(socket_url("ftp://example.com"), Err(ConnectionError::UnsupportedScheme(_))));
        assert!(matches!(socket_url("not a url"), Err(ConnectionError::InvalidUrl(_))));
    }

    #[test]
    fn test_default_config_targets_local_server() {
        let cfg = SocketSessionConfig::default();
        assert_eq!(cfg.server_url, "http://localhost:3002");
        assert_eq!(cfg.reconnect_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_handle_frame_answers_ping_and_open() {
        // Arrange
        let session = SocketSession::new(SocketSessionConfig::default()).unwrap();

        // Act / Assert
        assert_eq!(session.handle_frame("2"), Some(Some("3".to_string())));
        assert_eq!(
            session.handle_frame(r#"0{"sid":"e1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#),
            Some(Some("40".to_string()))
        );
    }

    #[test]
    fn test_open_handshake_sets_heartbeat_window() {
        // Arrange
        let session = SocketSession::new(SocketSessionConfig::default()).unwrap();
        assert_eq!(*lock(&session.heartbeat), None);

        // Act
        session.handle_frame(r#"0{"sid":"e1","upgrades":[],"pingInterval":100,"pingTimeout":150}"#);

        // Assert
        assert_eq!(*lock(&session.heartbeat), Some(Duration::from_millis(250)));
        session.reset_link();
        assert_eq!(*lock(&session.heartbeat), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_expires_only_once_a_deadline_is_set() {
        let deadline = time::Instant::now() + Duration::from_millis(200);
        assert!(time::timeout(Duration::from_millis(199), heartbeat_expired(Some(deadline))).await.is_err());
        assert!(time::timeout(Duration::from_millis(2), heartbeat_expired(Some(deadline))).await.is_ok());
        assert!(time::timeout(Duration::from_secs(3600), heartbeat_expired(None)).await.is_err());
    }

    #[test]
    fn test_handle_frame_connect_records_sid_and_broadcasts() {
        // Arrange
        let session = SocketSession::new(SocketSessionConfig::default()).unwrap();
        let mut rx = session.subscribe();

        // Act
        let reply = session.handle_frame(r#"40{"sid":"abc"}"#);

        // Assert
        assert_eq!(reply, Some(None));
        assert_eq!(session.connection_id().as_deref(), Some("abc"));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Connected { sid: "abc".into() });
    }

    #[test]
    fn test_handle_frame_skips_unknown_and_malformed_frames() {
        let session = SocketSession::new(SocketSessionConfig::default()).unwrap();
        assert_eq!(session.handle_frame(r#"42["announcement",{}]"#), Some(None));
        assert_eq!(session.handle_frame("42[not json"), Some(None));
    }

    #[test]
    fn test_handle_frame_disconnect_ends_link() {
        let session = SocketSession::new(SocketSessionConfig::default()).unwrap();
        assert_eq!(session.handle_frame("41"), None);
        assert_eq!(session.handle_frame(r#"44{"message":"nope"}"#), None);
    }

    #[tokio::test]
    async fn test_emit_without_connection_is_not_connected() {
        let session = SocketSession::new(SocketSessionConfig::default()).unwrap();
        let result = session.emit(ClientEvent::RequestRoomList {}).await;
        assert!(matches!(result, Err(SessionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_second_connect_is_ignored_while_running() {
        // Arrange: nothing listens on port 1, so the task keeps retrying.
        let session = Arc::new(
            SocketSession::new(SocketSessionConfig {
                server_url: "http://127.0.0.1:1".into(),
                reconnect_interval: Duration::from_secs(60),
                ..Default::default()
            })
            .unwrap(),
        );

        // Act
        let first = session.connect();
        let second = session.connect();

        // Assert
        assert!(first);
        assert!(!second);
        session.disconnect().await;
        assert!(!session.is_connected());
    }

    #[test]
    fn test_subscriptions_are_counted_and_released() {
        let session = SocketSession::new(SocketSessionConfig::default()).unwrap();
        assert_eq!(session.subscriber_count(), 0);

        let sub = session.subscribe_to(&[EventKind::Room]);
        assert_eq!(session.subscriber_count(), 1);

        drop(sub);
        assert_eq!(session.subscriber_count(), 0);
    }
}
