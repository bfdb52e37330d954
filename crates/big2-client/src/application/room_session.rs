//! RoomSessionUseCase: drives [`SessionState`] through the injected ports.
//!
//! Every operation locks the state, runs the pure transition, releases the
//! lock and then executes the resulting [`Effect`]s in order.  Effects never
//! run while the lock is held, so a slow emit cannot stall readers.

use std::sync::Arc;

use big2_core::domain::card::Card;
use big2_core::domain::toast::Severity;
use big2_core::protocol::messages::ServerEvent;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::application::hand::SortMode;
use crate::application::ports::{EventEmitter, IdentityRepository, Notifier};
use crate::application::routes::Route;
use crate::application::session_state::{AiGameForm, Effect, JoinForm, SessionState};

/// The room session use case.
pub struct RoomSessionUseCase {
    emitter: Arc<dyn EventEmitter>,
    notifier: Arc<dyn Notifier>,
    identity: Arc<dyn IdentityRepository>,
    state: Mutex<SessionState>,
    route_tx: watch::Sender<Route>,
}

impl RoomSessionUseCase {
    pub fn new(
        emitter: Arc<dyn EventEmitter>,
        notifier: Arc<dyn Notifier>,
        identity: Arc<dyn IdentityRepository>,
    ) -> Self {
        let (route_tx, _) = watch::channel(Route::Lobby);
        Self { emitter, notifier, identity, state: Mutex::new(SessionState::new()), route_tx }
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub fn route(&self) -> Route {
        self.route_tx.borrow().clone()
    }

    /// Receiver that observes every navigation.
    pub fn subscribe_route(&self) -> watch::Receiver<Route> {
        self.route_tx.subscribe()
    }

    /// Whether this connection owns the current room.
    pub async fn is_creator(&self) -> bool {
        let connection_id = self.emitter.connection_id();
        self.state.lock().await.is_creator(connection_id.as_deref())
    }

    // ── Inbound ───────────────────────────────────────────────────────────────

    /// The socket (re)joined the server.
    pub async fn on_connected(&self) {
        let stored = self.identity.load();
        let effects = self.state.lock().await.on_connected(stored.username.as_deref());
        self.execute(effects).await;
    }

    pub async fn handle_server_event(&self, event: ServerEvent) {
        debug!(event = event.name(), "server event");
        let effects = self.state.lock().await.apply(event);
        self.execute(effects).await;
    }

    // ── User actions ──────────────────────────────────────────────────────────

    pub async fn join_room(&self, form: JoinForm) {
        let connection_id = self.emitter.connection_id();
        let effects = self.state.lock().await.join_room(form, connection_id.as_deref());
        self.execute(effects).await;
    }

    pub async fn quick_join(&self) {
        let connection_id = self.emitter.connection_id();
        let effects = {
            let mut state = self.state.lock().await;
            let mut rng = rand::thread_rng();
            state.quick_join(&mut rng, connection_id.as_deref())
        };
        self.execute(effects).await;
    }

    pub async fn start_ai_game(&self, form: AiGameForm) {
        let connection_id = self.emitter.connection_id();
        let effects = {
            let mut state = self.state.lock().await;
            let mut rng = rand::thread_rng();
            state.start_ai_game(form, &mut rng, connection_id.as_deref())
        };
        self.execute(effects).await;
    }

    pub async fn leave_room(&self) {
        let effects = self.state.lock().await.leave_room();
        self.execute(effects).await;
    }

    pub async fn update_username(&self, raw: &str) {
        let effects = self.state.lock().await.update_username(raw);
        self.execute(effects).await;
    }

    pub async fn start_game(&self) {
        let effects = self.state.lock().await.start_game();
        self.execute(effects).await;
    }

    pub async fn add_ai(&self, difficulty: Option<&str>) {
        let effects = self.state.lock().await.add_ai(difficulty);
        self.execute(effects).await;
    }

    pub async fn set_ai_difficulty(&self, difficulty: &str) {
        self.state.lock().await.set_ai_difficulty(difficulty);
    }

    pub async fn remove_player(&self, player_name: &str) {
        let effects = self.state.lock().await.remove_player(player_name);
        self.execute(effects).await;
    }

    pub async fn request_room_list(&self) {
        let effects = self.state.lock().await.request_room_list();
        self.execute(effects).await;
    }

    /// Selects or deselects a card.  Returns whether it ends up selected.
    pub async fn toggle_card(&self, card: Card) -> bool {
        self.state.lock().await.hand_mut().toggle(card)
    }

    pub async fn set_sort_mode(&self, mode: SortMode) {
        self.state.lock().await.hand_mut().set_sort_mode(mode);
    }

    pub async fn play_selected(&self) {
        let effects = self.state.lock().await.play_selected();
        self.execute(effects).await;
    }

    pub async fn pass(&self) {
        let effects = self.state.lock().await.pass();
        self.execute(effects).await;
    }

    /// Navigates without any server interaction.
    pub async fn navigate(&self, route: Route) {
        self.execute(vec![Effect::Navigate(route)]).await;
    }

    // ── Effects ───────────────────────────────────────────────────────────────

    async fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Emit(event) => {
                    let name = event.name();
                    if let Err(e) = self.emitter.emit(event).await {
                        warn!(event = name, "emit failed: {e}");
                        self.notifier.notify(&e.to_string(), Severity::Error, None);
                    }
                }
                Effect::Notify { message, severity, duration } => {
                    self.notifier.notify(&message, severity, duration);
                }
                Effect::Navigate(route) => {
                    info!(path = %route, "navigate");
                    self.state.lock().await.sync_route(&route);
                    self.route_tx.send_replace(route);
                }
                Effect::PersistUsername(username) => self.identity.save_username(&username),
                Effect::PersistRoomName(room_name) => self.identity.save_room_name(&room_name),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use big2_core::protocol::messages::{ClientEvent, GameState};

    use crate::application::ports::{
        MockEventEmitter, MockIdentityRepository, SessionError, StoredIdentity,
    };

    // ── Recording fakes ───────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingEmitter {
        sid: Option<String>,
        sent: StdMutex<Vec<ClientEvent>>,
    }

    impl RecordingEmitter {
        fn connected(sid: &str) -> Self {
            Self { sid: Some(sid.to_string()), ..Self::default() }
        }

        fn sent(&self) -> Vec<ClientEvent> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventEmitter for RecordingEmitter {
        async fn emit(&self, event: ClientEvent) -> Result<(), SessionError> {
            self.sent.lock().unwrap().push(event);
            Ok(())
        }

        fn connection_id(&self) -> Option<String> {
            self.sid.clone()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        shown: StdMutex<Vec<(String, Severity, Option<Duration>)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str, severity: Severity, duration: Option<Duration>) {
            self.shown.lock().unwrap().push((message.to_string(), severity, duration));
        }
    }

    #[derive(Default)]
    struct MemoryIdentity {
        stored: StdMutex<StoredIdentity>,
    }

    impl IdentityRepository for MemoryIdentity {
        fn load(&self) -> StoredIdentity {
            self.stored.lock().unwrap().clone()
        }
        fn save_username(&self, username: &str) {
            self.stored.lock().unwrap().username = Some(username.to_string());
        }
        fn save_room_name(&self, room_name: &str) {
            self.stored.lock().unwrap().room_name = Some(room_name.to_string());
        }
    }

    struct Harness {
        emitter: Arc<RecordingEmitter>,
        notifier: Arc<RecordingNotifier>,
        identity: Arc<MemoryIdentity>,
        session: RoomSessionUseCase,
    }

    fn harness(sid: &str) -> Harness {
        let emitter = Arc::new(RecordingEmitter::connected(sid));
        let notifier = Arc::new(RecordingNotifier::default());
        let identity = Arc::new(MemoryIdentity::default());
        let session = RoomSessionUseCase::new(emitter.clone(), notifier.clone(), identity.clone());
        Harness { emitter, notifier, identity, session }
    }

    // ── Connect ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_on_connected_reclaims_stored_username() {
        // Arrange
        let h = harness("sid-1");
        h.identity.save_username("Alice");

        // Act
        h.session.on_connected().await;

        // Assert
        assert_eq!(
            h.emitter.sent(),
            vec![
                ClientEvent::JoinOrReconnect { username: "Alice".into() },
                ClientEvent::RequestRoomList {},
            ]
        );
    }

    #[tokio::test]
    async fn test_assigned_username_is_persisted() {
        let h = harness("sid-1");

        h.session.handle_server_event(ServerEvent::AssignUsername { username: "Player-3".into() }).await;

        assert_eq!(h.identity.load().username.as_deref(), Some("Player-3"));
        assert_eq!(h.session.snapshot().await.username(), "Player-3");
    }

    // ── Join and creator ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_join_room_emits_persists_and_navigates() {
        // Arrange
        let h = harness("sid-alice");
        let mut routes = h.session.subscribe_route();

        // Act
        h.session
            .join_room(JoinForm { room_name: "Quick-42".into(), username: "Alice".into() })
            .await;

        // Assert
        assert_eq!(
            h.emitter.sent(),
            vec![ClientEvent::JoinRoom { room_name: "Quick-42".into(), player_name: "Alice".into() }]
        );
        assert_eq!(h.identity.load().room_name.as_deref(), Some("Quick-42"));
        assert!(routes.has_changed().unwrap());
        assert_eq!(*routes.borrow_and_update(), Route::Room("Quick-42".into()));
        assert!(h.session.is_creator().await, "creator is predicted on join");
    }

    #[tokio::test]
    async fn test_room_update_from_server_decides_creator() {
        let h = harness("sid-bob");
        h.session
            .join_room(JoinForm { room_name: "Quick-42".into(), username: "Bob".into() })
            .await;

        h.session
            .handle_server_event(ServerEvent::RoomUpdate {
                players: vec!["Alice".into(), "Bob".into()],
                creator_id: "sid-alice".into(),
            })
            .await;

        assert!(!h.session.is_creator().await);
    }

    #[tokio::test]
    async fn test_invalid_join_shows_warning_and_stays_put() {
        let h = harness("sid");

        h.session.join_room(JoinForm { room_name: "".into(), username: "Alice".into() }).await;

        assert!(h.emitter.sent().is_empty());
        assert_eq!(h.session.route(), Route::Lobby);
        let shown = h.notifier.shown.lock().unwrap().clone();
        assert_eq!(shown, vec![("Room name cannot be empty.".to_string(), Severity::Warning, None)]);
    }

    // ── Server-driven navigation ──────────────────────────────────────────────

    #[tokio::test]
    async fn test_force_leave_returns_to_lobby() {
        let h = harness("sid");
        h.session.join_room(JoinForm { room_name: "R".into(), username: "Alice".into() }).await;

        h.session.handle_server_event(ServerEvent::ForceLeave).await;

        assert_eq!(h.session.route(), Route::Lobby);
        assert!(!h.session.snapshot().await.in_room());
        let shown = h.notifier.shown.lock().unwrap().clone();
        assert_eq!(shown[0].1, Severity::Error);
    }

    #[tokio::test]
    async fn test_join_error_navigates_to_multiplayer_setup() {
        let h = harness("sid");
        h.session.join_room(JoinForm { room_name: "R".into(), username: "Alice".into() }).await;

        h.session.handle_server_event(ServerEvent::JoinError { message: "Room is full".into() }).await;

        assert_eq!(h.session.route(), Route::MultiplayerSetup);
        assert!(!h.session.snapshot().await.in_room());
    }

    // ── Game play ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_play_selected_sends_cards_once() {
        // Arrange
        let h = harness("sid");
        h.session.join_room(JoinForm { room_name: "R".into(), username: "Alice".into() }).await;
        let three: Card = "3♦".parse().unwrap();
        h.session
            .handle_server_event(ServerEvent::GameStateUpdate(GameState {
                hand: vec![three],
                current_player: "Alice".into(),
                ..GameState::default()
            }))
            .await;
        assert!(h.session.toggle_card(three).await);

        // Act
        h.session.play_selected().await;
        h.session.play_selected().await;

        // Assert
        let moves: Vec<ClientEvent> = h
            .emitter
            .sent()
            .into_iter()
            .filter(|e| matches!(e, ClientEvent::ProcessMove { .. }))
            .collect();
        assert_eq!(moves, vec![ClientEvent::ProcessMove { room_name: "R".into(), cards: vec![three] }]);
    }

    #[tokio::test]
    async fn test_game_ended_toast_uses_long_duration() {
        let h = harness("sid");

        h.session.handle_server_event(ServerEvent::GameEnded { winner: "Bot 2".into() }).await;

        let shown = h.notifier.shown.lock().unwrap().clone();
        assert_eq!(
            shown,
            vec![("Game over! Winner: Bot 2".to_string(), Severity::Success, Some(Duration::from_millis(5000)))]
        );
    }

    // ── Failure paths ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_emit_failure_is_reported_as_error_toast() {
        // Arrange
        let mut emitter = MockEventEmitter::new();
        emitter.expect_connection_id().return_const(None::<String>);
        emitter.expect_emit().times(1).returning(|_| Err(SessionError::NotConnected));
        let mut identity = MockIdentityRepository::new();
        identity.expect_load().returning(StoredIdentity::default);
        let notifier = Arc::new(RecordingNotifier::default());
        let session = RoomSessionUseCase::new(Arc::new(emitter), notifier.clone(), Arc::new(identity));

        // Act
        session.request_room_list().await;

        // Assert
        let shown = notifier.shown.lock().unwrap().clone();
        assert_eq!(shown, vec![("not connected to the game server".to_string(), Severity::Error, None)]);
    }

    #[tokio::test]
    async fn test_navigate_into_room_marks_in_room() {
        let h = harness("sid");
        h.session.navigate(Route::parse("/room/Late%20Room")).await;
        let state = h.session.snapshot().await;
        assert!(state.in_room());
        assert_eq!(state.room_name(), "Late Room");
    }
}
