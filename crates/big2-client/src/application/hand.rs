//! The player's own hand: display order, card selection, play and pass.

use big2_core::domain::card::{sort_by_rank, sort_by_suit, Card};
use big2_core::protocol::messages::{ClientEvent, GameState, PlayerView};

/// How the hand is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Weakest to strongest, `3♦` first and `2♠` last.
    #[default]
    Rank,
    /// Grouped by suit, each group by rank.
    Suit,
}

/// Selection and layout state for the hand shown to the player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandView {
    sort_mode: SortMode,
    selected: Vec<Card>,
}

impl HandView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.sort_mode = mode;
    }

    /// The hand from `state` in display order.
    pub fn sorted_hand(&self, state: &GameState) -> Vec<Card> {
        let mut hand = state.hand.clone();
        match self.sort_mode {
            SortMode::Rank => sort_by_rank(&mut hand),
            SortMode::Suit => sort_by_suit(&mut hand),
        }
        hand
    }

    /// Selects `card`, or deselects it if already selected.
    ///
    /// Returns whether the card is selected afterwards.
    pub fn toggle(&mut self, card: Card) -> bool {
        if let Some(idx) = self.selected.iter().position(|c| *c == card) {
            self.selected.remove(idx);
            false
        } else {
            self.selected.push(card);
            true
        }
    }

    pub fn is_selected(&self, card: Card) -> bool {
        self.selected.contains(&card)
    }

    /// Selected cards in the order they were picked.
    pub fn selected(&self) -> &[Card] {
        &self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Drops selected cards that are no longer in the hand.
    pub fn retain_held(&mut self, state: &GameState) {
        self.selected.retain(|c| state.hand.contains(c));
    }

    /// Builds the move for the current selection and clears it.
    ///
    /// Returns `None` when nothing is selected, so an empty play is never
    /// sent by accident (an empty `processMove` means pass).
    pub fn play(&mut self, room_name: &str) -> Option<ClientEvent> {
        if self.selected.is_empty() {
            return None;
        }
        let cards = std::mem::take(&mut self.selected);
        Some(ClientEvent::ProcessMove { room_name: room_name.to_string(), cards })
    }

    /// Builds a pass.  The selection is kept.
    pub fn pass(&self, room_name: &str) -> ClientEvent {
        ClientEvent::ProcessMove { room_name: room_name.to_string(), cards: Vec::new() }
    }
}

pub fn is_my_turn(state: &GameState, username: &str) -> bool {
    !username.is_empty() && state.current_player == username
}

/// Passing is only allowed on your turn once a hand is on the table.
pub fn can_pass(state: &GameState, username: &str) -> bool {
    is_my_turn(state, username) && !state.last_played_hand.is_empty()
}

/// Everyone at the table except `username`.
pub fn opponents<'a>(state: &'a GameState, username: &'a str) -> impl Iterator<Item = &'a PlayerView> {
    state.players.iter().filter(move |p| p.name != username)
}
