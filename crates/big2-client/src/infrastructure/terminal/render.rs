//! Plain-text views of the session state.

use std::fmt::Write;

use big2_core::domain::card::Card;
use big2_core::domain::toast::{Severity, Toast};
use big2_core::protocol::messages::{RoomStatus, RoomSummary, MAX_PLAYERS};

use crate::application::hand::opponents;
use crate::application::session_state::SessionState;

fn join_cards(cards: &[Card]) -> String {
    cards.iter().map(Card::to_string).collect::<Vec<_>>().join(" ")
}

fn status_label(status: RoomStatus) -> &'static str {
    match status {
        RoomStatus::Waiting => "waiting",
        RoomStatus::Playing => "playing",
        RoomStatus::Finished => "finished",
    }
}

fn room_line(room: &RoomSummary) -> String {
    format!("{:<24} {}/{}  {}", room.name, room.players.len(), MAX_PLAYERS, status_label(room.status))
}

/// The lobby listing.
pub fn render_lobby(rooms: &[RoomSummary]) -> String {
    if rooms.is_empty() {
        return "no rooms yet; `join <name>` creates one".to_string();
    }
    let mut out = String::from("rooms:\n");
    for room in rooms {
        let _ = writeln!(out, "  {}", room_line(room));
    }
    out.trim_end().to_string()
}

/// The waiting room or the game table.
pub fn render_room(state: &SessionState, is_creator: bool) -> String {
    let mut out = String::new();
    let owner = if is_creator { " (you own this room)" } else { "" };
    let _ = writeln!(out, "room {}{owner}", state.room_name());

    if !state.game_started() {
        let _ = writeln!(out, "players: {}", state.players().join(", "));
        if is_creator {
            let _ = writeln!(out, "`addai`, `remove <name>` or `start`");
        }
        return out.trim_end().to_string();
    }

    let game = state.game_state();
    let _ = writeln!(out, "round {}", game.round);
    for player in opponents(game, state.username()) {
        let turn = if player.is_current_player { "  <- turn" } else { "" };
        let _ = writeln!(out, "  {:<20} {:>2} cards{turn}", player.name, player.card_count);
    }
    let table = if game.last_played_hand.is_empty() { "-".to_string() } else { join_cards(&game.last_played_hand) };
    match &game.last_played_by {
        Some(by) => {
            let _ = writeln!(out, "table: {table} (by {by})");
        }
        None => {
            let _ = writeln!(out, "table: {table}");
        }
    }
    out.push_str(&render_hand(state));
    if state.is_my_turn() {
        out.push_str("\nyour turn");
        if state.can_pass() {
            out.push_str(" (`pass` allowed)");
        }
    }
    out
}

/// The player's hand in display order, selected cards in brackets.
pub fn render_hand(state: &SessionState) -> String {
    let hand = state.hand();
    let cards: Vec<String> = hand
        .sorted_hand(state.game_state())
        .into_iter()
        .map(|card| if hand.is_selected(card) { format!("[{card}]") } else { card.to_string() })
        .collect();
    format!("hand: {}", cards.join(" "))
}

pub fn render_toast(toast: &Toast) -> String {
    let tag = match toast.severity {
        Severity::Info => "info",
        Severity::Success => " ok ",
        Severity::Warning => "warn",
        Severity::Error => "FAIL",
    };
    format!("[{tag}] {}", toast.message)
}
