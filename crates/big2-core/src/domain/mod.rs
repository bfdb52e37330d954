//! Domain values for the Big 2 client.
//!
//! This module contains pure logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer holds the rules that make the application what it is.
//! Here those rules are small but exact: how two cards compare, how many
//! notifications may be visible at once and when they expire, and which
//! strings are acceptable as a player or room name.  None of it touches the
//! network or the real clock, so every rule can be tested in isolation.

/// Cards, ranks, suits, and the Big 2 ordering.
pub mod card;

/// Username and room-name normalization and validation.
pub mod names;

/// Bounded, wall-clock expiring notification queue.
pub mod toast;
