//! Cards and the Big 2 ordering.
//!
//! Big 2 ranks cards `3 < 4 < … < K < A < 2`: the deuce is the highest card,
//! which is where the game gets its name.  Equal ranks are broken by suit,
//! `♦ < ♣ < ♥ < ♠`.
//!
//! On the wire the server describes a card as `{"suit": "♠", "value": "A"}`.
//! [`Card`] (de)serializes to exactly that shape and rejects unknown symbols
//! instead of coercing them, because a coerced card would sort in the wrong
//! place without anyone noticing.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when a rank or suit symbol is not part of the Big 2 deck.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CardError {
    /// The rank symbol is not one of `3`..`10`, `J`, `Q`, `K`, `A`, `2`.
    #[error("invalid card rank: {0:?}")]
    InvalidRank(String),

    /// The suit symbol is not one of `♦`, `♣`, `♥`, `♠`.
    #[error("invalid card suit: {0:?}")]
    InvalidSuit(String),
}

// ── Rank ──────────────────────────────────────────────────────────────────────

/// Card rank, declared from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
    Two,
}

impl Rank {
    /// Every rank, weakest first.
    pub const ALL: [Rank; 13] = [
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
        Rank::Two,
    ];

    /// Base ordering value: `3..=10` map to themselves, then J=11, Q=12,
    /// K=13, A=14 and 2=15.
    pub fn value(self) -> u32 {
        match self {
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten => 10,
            Rank::Jack => 11,
            Rank::Queen => 12,
            Rank::King => 13,
            Rank::Ace => 14,
            Rank::Two => 15,
        }
    }

    /// The symbol the server uses for this rank.
    pub fn symbol(self) -> &'static str {
        match self {
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
            Rank::Two => "2",
        }
    }
}

impl FromStr for Rank {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rank::ALL
            .into_iter()
            .find(|rank| rank.symbol() == s)
            .ok_or_else(|| CardError::InvalidRank(s.to_string()))
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ── Suit ──────────────────────────────────────────────────────────────────────

/// Card suit, declared from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Diamonds,
    Clubs,
    Hearts,
    Spades,
}

impl Suit {
    /// Every suit, weakest first.
    pub const ALL: [Suit; 4] = [Suit::Diamonds, Suit::Clubs, Suit::Hearts, Suit::Spades];

    /// Tiebreak weight: ♦=1, ♣=2, ♥=3, ♠=4.
    pub fn weight(self) -> u32 {
        match self {
            Suit::Diamonds => 1,
            Suit::Clubs => 2,
            Suit::Hearts => 3,
            Suit::Spades => 4,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
            Suit::Hearts => '♥',
            Suit::Spades => '♠',
        }
    }

    /// Red suits are rendered differently by most front ends.
    pub fn is_red(self) -> bool {
        matches!(self, Suit::Diamonds | Suit::Hearts)
    }
}

impl FromStr for Suit {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Suit::ALL
                .into_iter()
                .find(|suit| suit.symbol() == c)
                .ok_or_else(|| CardError::InvalidSuit(s.to_string())),
            _ => Err(CardError::InvalidSuit(s.to_string())),
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ── Card ──────────────────────────────────────────────────────────────────────

/// A single playing card.  Two cards are equal exactly when rank and suit are.
///
/// `Ord` follows the Big 2 ranking, so `cards.sort()` yields the same order
/// as [`sort_by_rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WireCard", into = "WireCard")]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

/// Server representation of a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireCard {
    suit: String,
    value: String,
}

impl TryFrom<WireCard> for Card {
    type Error = CardError;

    fn try_from(wire: WireCard) -> Result<Self, Self::Error> {
        Ok(Card::new(wire.value.parse()?, wire.suit.parse()?))
    }
}

impl From<Card> for WireCard {
    fn from(card: Card) -> Self {
        WireCard {
            suit: card.suit.symbol().to_string(),
            value: card.rank.symbol().to_string(),
        }
    }
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Parses a card from its rank and suit symbols as they appear on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`CardError`] if either symbol is unknown.
    pub fn from_symbols(value: &str, suit: &str) -> Result<Self, CardError> {
        Ok(Card::new(value.parse()?, suit.parse()?))
    }

    /// The 52 cards of a standard deck, weakest first.
    pub fn full_deck() -> Vec<Card> {
        Rank::ALL
            .into_iter()
            .flat_map(|rank| Suit::ALL.into_iter().map(move |suit| Card::new(rank, suit)))
            .collect()
    }

    /// Exact integer form of [`rank_key`]: `rank * 10 + suit weight`.
    fn ordering_key(self) -> u32 {
        self.rank.value() * 10 + self.suit.weight()
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordering_key().cmp(&other.ordering_key())
    }
}

/// Cards print as rank followed by suit, for example `10♥` or `A♠`.
impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Parses the [`Display`](fmt::Display) form, e.g. `"10♥"`.
impl FromStr for Card {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .char_indices()
            .last()
            .map(|(idx, _)| idx)
            .ok_or_else(|| CardError::InvalidRank(s.to_string()))?;
        let (rank, suit) = trimmed.split_at(split);
        Card::from_symbols(rank, suit)
    }
}

// ── Ordering functions ────────────────────────────────────────────────────────

/// Numeric ranking key: rank value plus a sub-unit suit weight
/// (♦ +0.1, ♣ +0.2, ♥ +0.3, ♠ +0.4).
///
/// # Examples
///
/// ```rust
/// use big2_core::domain::card::{rank_key, Card, Rank, Suit};
///
/// let two = Card::new(Rank::Two, Suit::Diamonds);
/// let ace = Card::new(Rank::Ace, Suit::Spades);
/// assert!(rank_key(two) > rank_key(ace));
/// ```
pub fn rank_key(card: Card) -> f64 {
    f64::from(card.ordering_key()) / 10.0
}

/// Compares two cards by [`rank_key`].
///
/// Equivalent to `sign(rank_key(a) - rank_key(b))`, computed on exact integers.
pub fn compare(a: Card, b: Card) -> Ordering {
    a.cmp(&b)
}

/// Key for the "sort by suit" display mode: `suit_weight * 100 + rank value`,
/// so suit groups never interleave.
pub fn suit_then_rank(card: Card) -> u32 {
    card.suit.weight() * 100 + card.rank.value()
}

/// Sorts a hand weakest first by Big 2 rank.
pub fn sort_by_rank(cards: &mut [Card]) {
    cards.sort_by_key(|card| card.ordering_key());
}

/// Sorts a hand grouped by suit, each group weakest first.
pub fn sort_by_suit(cards: &mut [Card]) {
    cards.sort_by_key(|card| suit_then_rank(*card));
}
