//! Parsing of the interactive commands typed at the prompt.

use big2_core::domain::card::{Card, CardError};
use thiserror::Error;

use crate::application::hand::SortMode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?} (type `help`)")]
    Unknown(String),

    #[error("`{command}` needs {argument}")]
    MissingArgument { command: &'static str, argument: &'static str },

    #[error("bad card {token:?}: {source}")]
    BadCard {
        token: String,
        #[source]
        source: CardError,
    },

    #[error("{0:?} is not a number between 1 and 3")]
    BadCount(String),

    #[error("sort mode must be `rank` or `suit`, got {0:?}")]
    BadSortMode(String),
}

/// One line typed by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `join <room> [as <username>]`
    Join { room_name: String, username: Option<String> },
    /// `quick`
    QuickJoin,
    /// `ai [count] [difficulty]`
    AiGame { ai_count: Option<u8>, difficulty: Option<String> },
    Start,
    /// `addai [difficulty]`
    AddAi { difficulty: Option<String> },
    /// `difficulty <level>`
    Difficulty(String),
    /// `remove <player>`
    Remove(String),
    Leave,
    Rooms,
    Hand,
    /// `select <card>...`, toggling each card.
    Select(Vec<Card>),
    Play,
    Pass,
    Sort(SortMode),
    /// `name <username>`
    Name(String),
    Help,
    Quit,
}

/// Parses one input line.  Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "join" | "j" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument { command: "join", argument: "a room name" });
            }
            match rest.rsplit_once(" as ") {
                Some((room, user)) => Command::Join {
                    room_name: room.trim().to_string(),
                    username: Some(user.trim().to_string()),
                },
                None => Command::Join { room_name: rest.to_string(), username: None },
            }
        }
        "quick" | "q" => Command::QuickJoin,
        "ai" => {
            let mut args = rest.split_whitespace();
            let mut ai_count = None;
            let mut difficulty = None;
            if let Some(first) = args.next() {
                match first.parse::<u8>() {
                    Ok(n) if (1..=3).contains(&n) => {
                        ai_count = Some(n);
                        difficulty = args.next().map(str::to_string);
                    }
                    Ok(_) => return Err(CommandError::BadCount(first.to_string())),
                    Err(_) => difficulty = Some(first.to_string()),
                }
            }
            Command::AiGame { ai_count, difficulty }
        }
        "start" => Command::Start,
        "addai" => Command::AddAi { difficulty: non_empty(rest) },
        "difficulty" => Command::Difficulty(required(rest, "difficulty", "a level")?),
        "remove" | "kick" => Command::Remove(required(rest, "remove", "a player name")?),
        "leave" => Command::Leave,
        "rooms" | "ls" => Command::Rooms,
        "hand" | "h" => Command::Hand,
        "select" | "s" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument { command: "select", argument: "one or more cards" });
            }
            Command::Select(rest.split_whitespace().map(parse_card).collect::<Result<_, _>>()?)
        }
        "play" | "p" => Command::Play,
        "pass" => Command::Pass,
        "sort" => match rest.to_ascii_lowercase().as_str() {
            "rank" => Command::Sort(SortMode::Rank),
            "suit" => Command::Sort(SortMode::Suit),
            _ => return Err(CommandError::BadSortMode(rest.to_string())),
        },
        "name" => Command::Name(required(rest, "name", "a username")?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Parses a card token.  Besides `10♥`, accepts ASCII suits (`10h`, `qs`).
pub fn parse_card(token: &str) -> Result<Card, CommandError> {
    let bad = |source| CommandError::BadCard { token: token.to_string(), source };
    let Some(last) = token.chars().last() else {
        return Err(bad(CardError::InvalidRank(String::new())));
    };
    let suit = match last.to_ascii_lowercase() {
        'd' => '♦',
        'c' => '♣',
        'h' => '♥',
        's' => '♠',
        other => other,
    };
    let rank = token[..token.len() - last.len_utf8()].to_ascii_uppercase();
    format!("{rank}{suit}").parse().map_err(bad)
}

/// Text shown for `help`.
pub const HELP: &str = "\
commands:
  join <room> [as <name>]   join or create a room
  quick                     join any open room
  ai [count] [difficulty]   start a game against bots
  start                     start the game (room owner)
  addai [difficulty]        seat a bot (room owner)
  difficulty <level>        default level for addai
  remove <player>           remove a player (room owner)
  leave                     leave the room
  rooms                     refresh the lobby
  hand                      show your hand
  select <card>...          toggle cards, e.g. `select 3d 3s`
  play | pass               play the selection or pass
  sort rank|suit            change hand order
  name <username>           change your name
  quit";

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn required(s: &str, command: &'static str, argument: &'static str) -> Result<String, CommandError> {
    non_empty(s).ok_or(CommandError::MissingArgument { command, argument })
}
