//! Shared client state and the rules that change it.
//!
//! [`SessionState`] is a plain reducer.  Server events and user actions go
//! in; a list of [`Effect`]s comes out for the caller to carry out (emit an
//! event, show a toast, navigate, persist the identity).  Nothing here does
//! I/O, which keeps every transition testable without a socket.
//!
//! # Optimistic creator
//!
//! Joining a room marks this connection as the room's creator straight away,
//! so the owner controls appear without waiting for the server.  The claim is
//! only a prediction: the next `roomUpdate` replaces it unconditionally with
//! the server's `creatorID`.

use std::time::Duration;

use big2_core::domain::names::{validate, NameKind};
use big2_core::domain::toast::Severity;
use big2_core::protocol::messages::{ClientEvent, GameState, RoomSummary, ServerEvent};
use rand::Rng;
use tracing::warn;

use crate::application::hand::{self, HandView};
use crate::application::routes::Route;

/// Difficulty used by "Add AI" unless the player picks another.
pub const DEFAULT_AI_DIFFICULTY: &str = "standard";

/// Difficulty of a quick AI game when the form leaves it empty.
pub const DEFAULT_AI_GAME_DIFFICULTY: &str = "medium";

/// Bots seated in a quick AI game when the form leaves it empty.
pub const DEFAULT_AI_COUNT: u8 = 3;

/// The game-over toast stays longer than the default.
pub const GAME_OVER_TOAST_DURATION: Duration = Duration::from_millis(5000);

/// Something the caller must do after a state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Emit(ClientEvent),
    Notify {
        message: String,
        severity: Severity,
        /// `None` uses the notification queue's default.
        duration: Option<Duration>,
    },
    Navigate(Route),
    PersistUsername(String),
    PersistRoomName(String),
}

impl Effect {
    fn notify(message: impl Into<String>, severity: Severity) -> Self {
        Effect::Notify { message: message.into(), severity, duration: None }
    }
}

/// Input of the "join room" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinForm {
    pub room_name: String,
    pub username: String,
}

/// Input of the "play against AI" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiGameForm {
    pub username: String,
    pub ai_count: Option<u8>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum CreatorClaim {
    #[default]
    Unknown,
    Predicted(String),
    Confirmed(String),
}

/// Everything the views share: identity, room roster, lobby and game state.
#[derive(Debug, Clone)]
pub struct SessionState {
    username: String,
    room_name: String,
    players: Vec<String>,
    creator: CreatorClaim,
    in_room: bool,
    game_started: bool,
    rooms: Vec<RoomSummary>,
    game_state: GameState,
    ai_difficulty: String,
    hand: HandView,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            username: String::new(),
            room_name: String::new(),
            players: Vec::new(),
            creator: CreatorClaim::Unknown,
            in_room: false,
            game_started: false,
            rooms: Vec::new(),
            game_state: GameState::default(),
            ai_difficulty: DEFAULT_AI_DIFFICULTY.to_string(),
            hand: HandView::new(),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    /// Creator connection id, predicted or confirmed.
    pub fn creator_id(&self) -> Option<&str> {
        match &self.creator {
            CreatorClaim::Unknown => None,
            CreatorClaim::Predicted(id) | CreatorClaim::Confirmed(id) => Some(id),
        }
    }

    /// `true` while the creator is still the local guess.
    pub fn creator_is_predicted(&self) -> bool {
        matches!(self.creator, CreatorClaim::Predicted(_))
    }

    /// Whether `connection_id` owns the current room.
    pub fn is_creator(&self, connection_id: Option<&str>) -> bool {
        match (self.creator_id(), connection_id) {
            (Some(creator), Some(own)) => creator == own,
            _ => false,
        }
    }

    pub fn in_room(&self) -> bool {
        self.in_room
    }

    pub fn game_started(&self) -> bool {
        self.game_started
    }

    pub fn rooms(&self) -> &[RoomSummary] {
        &self.rooms
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn ai_difficulty(&self) -> &str {
        &self.ai_difficulty
    }

    pub fn hand(&self) -> &HandView {
        &self.hand
    }

    pub fn hand_mut(&mut self) -> &mut HandView {
        &mut self.hand
    }

    pub fn is_my_turn(&self) -> bool {
        hand::is_my_turn(&self.game_state, &self.username)
    }

    pub fn can_pass(&self) -> bool {
        hand::can_pass(&self.game_state, &self.username)
    }

    // ── Local edits ───────────────────────────────────────────────────────────

    /// Updates the username field without telling the server.
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn set_ai_difficulty(&mut self, difficulty: impl Into<String>) {
        self.ai_difficulty = difficulty.into();
    }

    /// Marks this connection as the creator until the next `roomUpdate`.
    pub fn predict_creator(&mut self, connection_id: Option<&str>) {
        self.creator = match connection_id {
            Some(id) => CreatorClaim::Predicted(id.to_string()),
            None => CreatorClaim::Unknown,
        };
    }

    /// Mirrors the room encoded in the current route.
    pub fn sync_route(&mut self, route: &Route) {
        match route.room_name() {
            Some(name) => {
                self.in_room = true;
                self.room_name = name.to_string();
            }
            None => self.in_room = false,
        }
    }

    // ── Server events ─────────────────────────────────────────────────────────

    /// Applies one server event.
    pub fn apply(&mut self, event: ServerEvent) -> Vec<Effect> {
        match event {
            ServerEvent::AssignUsername { username } => {
                self.username = username.clone();
                vec![Effect::PersistUsername(username)]
            }
            ServerEvent::RoomUpdate { players, creator_id } => {
                self.players = players;
                self.creator = CreatorClaim::Confirmed(creator_id);
                Vec::new()
            }
            ServerEvent::ForceLeave => {
                self.leave_room_locally();
                vec![
                    Effect::notify("You have been removed from the room.", Severity::Error),
                    Effect::Navigate(Route::Lobby),
                ]
            }
            ServerEvent::RoomList { rooms } => {
                self.rooms = rooms;
                Vec::new()
            }
            ServerEvent::GameStarted => {
                self.game_started = true;
                Vec::new()
            }
            ServerEvent::GameError { message } => vec![Effect::notify(message, Severity::Error)],
            ServerEvent::JoinError { message } => {
                self.creator = CreatorClaim::Unknown;
                vec![
                    Effect::notify(message, Severity::Error),
                    Effect::Navigate(Route::MultiplayerSetup),
                ]
            }
            ServerEvent::JoinAiGameError { message } => vec![
                Effect::notify(message, Severity::Error),
                Effect::Navigate(Route::AiSetup),
            ],
            ServerEvent::GameStateUpdate(state) => {
                self.game_state = state;
                self.hand.retain_held(&self.game_state);
                Vec::new()
            }
            ServerEvent::GameEnded { winner } => {
                self.game_started = false;
                vec![Effect::Notify {
                    message: format!("Game over! Winner: {winner}"),
                    severity: Severity::Success,
                    duration: Some(GAME_OVER_TOAST_DURATION),
                }]
            }
        }
    }

    // ── User actions ──────────────────────────────────────────────────────────

    /// The socket joined the server.  Reclaims `stored_username` if it is a
    /// valid name, otherwise asks for a generated one, then loads the lobby.
    pub fn on_connected(&mut self, stored_username: Option<&str>) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(2);
        let stored = stored_username.and_then(|raw| match validate(raw, NameKind::Username) {
            Ok(name) => Some(name),
            Err(e) => {
                warn!("ignoring remembered username: {e}");
                None
            }
        });
        match stored {
            Some(username) => {
                self.username = username.clone();
                effects.push(Effect::Emit(ClientEvent::JoinOrReconnect { username }));
            }
            None => effects.push(Effect::Emit(ClientEvent::RequestRandomUsername {})),
        }
        effects.push(Effect::Emit(ClientEvent::RequestRoomList {}));
        effects
    }

    pub fn request_room_list(&self) -> Vec<Effect> {
        vec![Effect::Emit(ClientEvent::RequestRoomList {})]
    }

    /// Validates the form, enters the room optimistically and asks to join.
    ///
    /// Invalid names produce a warning toast and nothing else.
    pub fn join_room(&mut self, form: JoinForm, connection_id: Option<&str>) -> Vec<Effect> {
        let room_name = match validate(form.room_name.as_str(), NameKind::RoomName) {
            Ok(name) => name,
            Err(e) => return vec![Effect::notify(e.to_string(), Severity::Warning)],
        };
        let username = match validate(form.username.as_str(), NameKind::Username) {
            Ok(name) => name,
            Err(e) => return vec![Effect::notify(e.to_string(), Severity::Warning)],
        };

        self.enter_room(&room_name, &username, connection_id);
        vec![
            Effect::PersistRoomName(room_name.clone()),
            Effect::PersistUsername(username.clone()),
            Effect::Emit(ClientEvent::JoinRoom { room_name: room_name.clone(), player_name: username }),
            Effect::Navigate(Route::Room(room_name)),
        ]
    }

    /// Joins a random waiting room with a free seat, or opens a new
    /// `Quick-<n>` room when there is none.
    pub fn quick_join<R: Rng + ?Sized>(&mut self, rng: &mut R, connection_id: Option<&str>) -> Vec<Effect> {
        let joinable: Vec<&RoomSummary> = self.rooms.iter().filter(|r| r.is_joinable()).collect();
        let room_name = if joinable.is_empty() {
            format!("Quick-{}", rng.gen_range(0..1000))
        } else {
            joinable[rng.gen_range(0..joinable.len())].name.clone()
        };
        let form = JoinForm { room_name, username: self.username.clone() };
        self.join_room(form, connection_id)
    }

    pub fn leave_room(&mut self) -> Vec<Effect> {
        self.leave_room_locally();
        vec![Effect::Emit(ClientEvent::LeaveRoom {}), Effect::Navigate(Route::Lobby)]
    }

    /// Renames the player on the server.
    pub fn update_username(&mut self, raw: &str) -> Vec<Effect> {
        match validate(raw, NameKind::Username) {
            Ok(username) => {
                self.username = username.clone();
                vec![
                    Effect::PersistUsername(username.clone()),
                    Effect::Emit(ClientEvent::UpdateUsername { username }),
                ]
            }
            Err(e) => vec![Effect::notify(e.to_string(), Severity::Warning)],
        }
    }

    pub fn start_game(&self) -> Vec<Effect> {
        self.room_event(|room_name| ClientEvent::StartGame { room_name })
    }

    /// Seats a bot.  `None` uses the selected [`ai_difficulty`](Self::ai_difficulty).
    pub fn add_ai(&self, difficulty: Option<&str>) -> Vec<Effect> {
        let difficulty = difficulty.unwrap_or(&self.ai_difficulty).to_string();
        self.room_event(|room_name| ClientEvent::AddAi { room_name, difficulty })
    }

    pub fn remove_player(&self, player_name: &str) -> Vec<Effect> {
        let mut effects = self.room_event(|room_name| ClientEvent::RemovePlayer {
            room_name,
            player_name: player_name.to_string(),
        });
        if !effects.is_empty() {
            effects.push(Effect::notify(format!("Player {player_name} has been removed"), Severity::Warning));
        }
        effects
    }

    /// Creates an `AI-Game-<n>` room, seats bots and starts right away.
    pub fn start_ai_game<R: Rng + ?Sized>(
        &mut self,
        form: AiGameForm,
        rng: &mut R,
        connection_id: Option<&str>,
    ) -> Vec<Effect> {
        let username = match validate(form.username.as_str(), NameKind::Username) {
            Ok(name) => name,
            Err(e) => return vec![Effect::notify(e.to_string(), Severity::Warning)],
        };
        let room_name = format!("AI-Game-{}", rng.gen_range(0..10000));
        let ai_count = form.ai_count.filter(|n| *n > 0).unwrap_or(DEFAULT_AI_COUNT);
        let difficulty = form
            .difficulty
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AI_GAME_DIFFICULTY.to_string());

        self.enter_room(&room_name, &username, connection_id);
        vec![
            Effect::PersistRoomName(room_name.clone()),
            Effect::PersistUsername(username.clone()),
            Effect::Emit(ClientEvent::UpdateUsername { username: username.clone() }),
            Effect::Emit(ClientEvent::StartAiGame {
                room_name: room_name.clone(),
                player_name: username,
                ai_count,
                difficulty,
            }),
            Effect::Navigate(Route::Room(room_name)),
        ]
    }

    /// Plays the selected cards.  Nothing happens when no card is selected.
    pub fn play_selected(&mut self) -> Vec<Effect> {
        if !self.in_room {
            return Vec::new();
        }
        let room_name = self.room_name.clone();
        self.hand.play(&room_name).map(Effect::Emit).into_iter().collect()
    }

    /// Passes, if passing is currently allowed.
    pub fn pass(&self) -> Vec<Effect> {
        if !self.in_room || !self.can_pass() {
            return Vec::new();
        }
        vec![Effect::Emit(self.hand.pass(&self.room_name))]
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn enter_room(&mut self, room_name: &str, username: &str, connection_id: Option<&str>) {
        self.room_name = room_name.to_string();
        self.username = username.to_string();
        self.in_room = true;
        self.game_started = false;
        self.game_state = GameState::default();
        self.hand.clear_selection();
        self.predict_creator(connection_id);
    }

    fn leave_room_locally(&mut self) {
        self.in_room = false;
        self.game_started = false;
        self.players.clear();
        self.creator = CreatorClaim::Unknown;
        self.game_state = GameState::default();
        self.hand.clear_selection();
    }

    fn room_event(&self, build: impl FnOnce(String) -> ClientEvent) -> Vec<Effect> {
        if !self.in_room || self.room_name.is_empty() {
            return Vec::new();
        }
        vec![Effect::Emit(build(self.room_name.clone()))]
    }
}
