//! Line-oriented terminal front end.
//!
//! The terminal plays the part of the views: it turns typed commands into
//! use case calls and prints the current screen after every change.
//!
//! - `command` – parsing of input lines.
//! - `render` – plain-text rendering of lobby, room, hand and toasts.

pub mod command;
pub mod render;

use std::sync::Arc;

use crate::application::room_session::RoomSessionUseCase;
use crate::application::routes::Route;
use crate::application::session_state::{AiGameForm, JoinForm};

use command::{Command, HELP};

/// What the prompt loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(Option<String>),
    Quit,
}

const OWNER_ONLY: &str = "only the room owner can do that";

/// Executes terminal commands against the room session.
pub struct Terminal {
    session: Arc<RoomSessionUseCase>,
}

impl Terminal {
    pub fn new(session: Arc<RoomSessionUseCase>) -> Self {
        Self { session }
    }

    pub async fn execute(&self, command: Command) -> Flow {
        let session = &self.session;
        let output = match command {
            Command::Join { room_name, username } => {
                let username = match username {
                    Some(name) => name,
                    None => session.snapshot().await.username().to_string(),
                };
                session.join_room(JoinForm { room_name, username }).await;
                None
            }
            Command::QuickJoin => {
                session.quick_join().await;
                None
            }
            Command::AiGame { ai_count, difficulty } => {
                let username = session.snapshot().await.username().to_string();
                session.start_ai_game(AiGameForm { username, ai_count, difficulty }).await;
                None
            }
            Command::Start | Command::AddAi { .. } | Command::Remove(_) if !session.is_creator().await => {
                Some(OWNER_ONLY.to_string())
            }
            Command::Start => {
                session.start_game().await;
                None
            }
            Command::AddAi { difficulty } => {
                session.add_ai(difficulty.as_deref()).await;
                None
            }
            Command::Difficulty(level) => {
                session.set_ai_difficulty(&level).await;
                Some(format!("bots will join as {level}"))
            }
            Command::Remove(player) => {
                session.remove_player(&player).await;
                None
            }
            Command::Leave => {
                session.leave_room().await;
                None
            }
            Command::Rooms => {
                session.request_room_list().await;
                None
            }
            Command::Hand => Some(render::render_hand(&session.snapshot().await)),
            Command::Select(cards) => {
                for card in cards {
                    session.toggle_card(card).await;
                }
                Some(render::render_hand(&session.snapshot().await))
            }
            Command::Play => {
                session.play_selected().await;
                None
            }
            Command::Pass => {
                let state = session.snapshot().await;
                if !state.can_pass() {
                    Some("you cannot pass right now".to_string())
                } else {
                    session.pass().await;
                    None
                }
            }
            Command::Sort(mode) => {
                session.set_sort_mode(mode).await;
                Some(render::render_hand(&session.snapshot().await))
            }
            Command::Name(name) => {
                session.update_username(&name).await;
                None
            }
            Command::Help => Some(HELP.to_string()),
            Command::Quit => return Flow::Quit,
        };
        Flow::Continue(output)
    }

    /// The screen for the current route.
    pub async fn screen(&self) -> String {
        let state = self.session.snapshot().await;
        match self.session.route() {
            Route::Room(_) => render::render_room(&state, self.session.is_creator().await),
            Route::Lobby => format!("{}\n{}", state.username(), render::render_lobby(state.rooms())),
            other => other.title(),
        }
    }
}
