//! Screens the client can navigate between.
//!
//! Room names travel inside the path, so they are percent-encoded on the way
//! out and normalized on the way back in.

use std::fmt;

use big2_core::domain::names::{decode_from_path, encode_for_path};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    /// `/`
    #[default]
    Lobby,
    /// `/play/multiplayer`
    MultiplayerSetup,
    /// `/play/ai`
    AiSetup,
    /// `/rules`
    Rules,
    /// `/room/<name>`
    Room(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Lobby => "/".to_string(),
            Route::MultiplayerSetup => "/play/multiplayer".to_string(),
            Route::AiSetup => "/play/ai".to_string(),
            Route::Rules => "/rules".to_string(),
            Route::Room(name) => format!("/room/{}", encode_for_path(name)),
        }
    }

    /// Maps a path back to a route.  Unknown paths land on the lobby.
    pub fn parse(path: &str) -> Route {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Lobby,
            "/play/multiplayer" => Route::MultiplayerSetup,
            "/play/ai" => Route::AiSetup,
            "/rules" => Route::Rules,
            _ => match trimmed.strip_prefix("/room/") {
                Some(segment) if !segment.contains('/') => {
                    let name = decode_from_path(segment);
                    if name.is_empty() {
                        Route::Lobby
                    } else {
                        Route::Room(name)
                    }
                }
                _ => Route::Lobby,
            },
        }
    }

    pub fn room_name(&self) -> Option<&str> {
        match self {
            Route::Room(name) => Some(name),
            _ => None,
        }
    }

    /// Window title for this screen.
    pub fn title(&self) -> String {
        match self {
            Route::Room(name) => format!("Playing in {name} | Big 2 Live"),
            _ => "Play Big 2 Card Game Online | Big 2 Live".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
