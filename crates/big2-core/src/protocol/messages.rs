//! Named events exchanged with the Big 2 game server.
//!
//! The server speaks Socket.IO: every message is an event name plus one JSON
//! payload.  The two directions carry different events, so each direction has
//! its own enum.  Sending a server-only event is a compile-time error.
//!
//! # Serde representation
//!
//! Both enums use `tag = "event", content = "payload"` and camelCase names,
//! which the [`codec`](crate::protocol::codec) turns into Socket.IO's array
//! form:
//!
//! ```json
//! {"event":"joinRoom","payload":{"roomName":"Quick-42","playerName":"Alice"}}
//! ```
//! ```text
//! 42["joinRoom",{"roomName":"Quick-42","playerName":"Alice"}]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::card::Card;

/// Maximum number of seats in a room.
pub const MAX_PLAYERS: usize = 4;

// ── Client → Server ───────────────────────────────────────────────────────────

/// Every event the client can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Reclaims a stored identity after (re)connecting.
    JoinOrReconnect { username: String },

    /// Asks the server to assign a fresh username (answered by `assignUsername`).
    RequestRandomUsername {},

    JoinRoom { room_name: String, player_name: String },

    LeaveRoom {},

    UpdateUsername { username: String },

    /// Creator only.
    StartGame { room_name: String },

    /// Creator only.  `difficulty` is passed through to the server's AI.
    #[serde(rename = "addAI")]
    AddAi { room_name: String, difficulty: String },

    /// Creator only.
    RemovePlayer { room_name: String, player_name: String },

    /// Creates a room, seats `ai_count` bots next to the player and starts.
    #[serde(rename = "startAIGame")]
    StartAiGame {
        room_name: String,
        player_name: String,
        ai_count: u8,
        difficulty: String,
    },

    RequestRoomList {},

    /// Plays `cards`.  An empty list is a pass.
    ProcessMove { room_name: String, cards: Vec<Card> },
}

impl ClientEvent {
    /// The Socket.IO event name.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinOrReconnect { .. } => "joinOrReconnect",
            ClientEvent::RequestRandomUsername {} => "requestRandomUsername",
            ClientEvent::JoinRoom { .. } => "joinRoom",
            ClientEvent::LeaveRoom {} => "leaveRoom",
            ClientEvent::UpdateUsername { .. } => "updateUsername",
            ClientEvent::StartGame { .. } => "startGame",
            ClientEvent::AddAi { .. } => "addAI",
            ClientEvent::RemovePlayer { .. } => "removePlayer",
            ClientEvent::StartAiGame { .. } => "startAIGame",
            ClientEvent::RequestRoomList {} => "requestRoomList",
            ClientEvent::ProcessMove { .. } => "processMove",
        }
    }

    /// `true` for a `processMove` with no cards.
    pub fn is_pass(&self) -> bool {
        matches!(self, ClientEvent::ProcessMove { cards, .. } if cards.is_empty())
    }
}

// ── Server → Client ───────────────────────────────────────────────────────────

/// Lobby room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

/// One row of the lobby room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub name: String,
    #[serde(default)]
    pub players: Vec<String>,
    pub status: RoomStatus,
}

impl RoomSummary {
    /// Waiting and not full.
    pub fn is_joinable(&self) -> bool {
        self.status == RoomStatus::Waiting && self.players.len() < MAX_PLAYERS
    }
}

/// What the client knows about one seat during a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub name: String,
    #[serde(default)]
    pub card_count: u32,
    #[serde(default)]
    pub is_current_player: bool,
}

/// The server's view of a game, as seen by one player.
///
/// Older servers call `last_played_hand` `playedCards`; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default)]
    pub hand: Vec<Card>,
    #[serde(default, alias = "playedCards")]
    pub last_played_hand: Vec<Card>,
    #[serde(default)]
    pub current_player: String,
    #[serde(default)]
    pub players: Vec<PlayerView>,
    #[serde(default = "first_round")]
    pub round: u32,
    #[serde(default)]
    pub last_played_by: Option<String>,
}

fn first_round() -> u32 {
    1
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            hand: Vec::new(),
            last_played_hand: Vec::new(),
            current_player: String::new(),
            players: Vec::new(),
            round: first_round(),
            last_played_by: None,
        }
    }
}

/// Every event the server can push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    AssignUsername { username: String },

    /// Full roster plus the connection id of the room's creator.
    RoomUpdate {
        #[serde(default)]
        players: Vec<String>,
        #[serde(rename = "creatorID")]
        creator_id: String,
    },

    /// The client was removed from its room.
    ForceLeave,

    RoomList {
        #[serde(default)]
        rooms: Vec<RoomSummary>,
    },

    GameStarted,

    GameError { message: String },

    JoinError { message: String },

    #[serde(rename = "joinAIGameError")]
    JoinAiGameError { message: String },

    GameStateUpdate(GameState),

    GameEnded { winner: String },
}

impl ServerEvent {
    /// Every inbound event name.
    pub const NAMES: [&'static str; 10] = [
        "assignUsername",
        "roomUpdate",
        "forceLeave",
        "roomList",
        "gameStarted",
        "gameError",
        "joinError",
        "joinAIGameError",
        "gameStateUpdate",
        "gameEnded",
    ];

    /// Builds an event from its Socket.IO name and payload.
    ///
    /// Payload-less events ignore whatever payload arrives with them.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the name is unknown or the payload does
    /// not have the expected shape.
    pub fn from_parts(name: &str, payload: Option<Value>) -> Result<Self, serde_json::Error> {
        match name {
            "forceLeave" => Ok(ServerEvent::ForceLeave),
            "gameStarted" => Ok(ServerEvent::GameStarted),
            _ => {
                let payload = payload.unwrap_or_else(|| Value::Object(Default::default()));
                serde_json::from_value(serde_json::json!({ "event": name, "payload": payload }))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::AssignUsername { .. } => "assignUsername",
            ServerEvent::RoomUpdate { .. } => "roomUpdate",
            ServerEvent::ForceLeave => "forceLeave",
            ServerEvent::RoomList { .. } => "roomList",
            ServerEvent::GameStarted => "gameStarted",
            ServerEvent::GameError { .. } => "gameError",
            ServerEvent::JoinError { .. } => "joinError",
            ServerEvent::JoinAiGameError { .. } => "joinAIGameError",
            ServerEvent::GameStateUpdate(_) => "gameStateUpdate",
            ServerEvent::GameEnded { .. } => "gameEnded",
        }
    }

    /// Coarse category used to scope subscriptions.
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::AssignUsername { .. } => EventKind::Identity,
            ServerEvent::RoomUpdate { .. } | ServerEvent::ForceLeave => EventKind::Room,
            ServerEvent::RoomList { .. } => EventKind::Lobby,
            ServerEvent::GameStarted
            | ServerEvent::GameStateUpdate(_)
            | ServerEvent::GameEnded { .. } => EventKind::Game,
            ServerEvent::GameError { .. }
            | ServerEvent::JoinError { .. }
            | ServerEvent::JoinAiGameError { .. } => EventKind::Error,
        }
    }
}

/// Groups of server events a view can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Identity,
    Room,
    Lobby,
    Game,
    Error,
}
