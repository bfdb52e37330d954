//! big2-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does big2-client do? (for beginners)
//!
//! Big 2 Live is played against a remote game server that owns every rule
//! and every room.  The client:
//!
//! 1. Keeps one Socket.IO connection open for the whole run and reconnects
//!    when it drops.
//! 2. Claims a username (a remembered one, or a generated one from the
//!    server) and shows the lobby's room list.
//! 3. Joins or creates rooms, seats bots, starts games and sends the cards
//!    the player selects.
//! 4. Applies the server's pushed events (`roomUpdate`, `gameStateUpdate`,
//!    …) to a local copy of the state and shows short notifications.
//!
//! It validates nothing about the game itself; an illegal move is simply
//! answered by a `gameError`.

/// Application layer: session state, use cases and ports.
pub mod application;

/// Infrastructure layer: socket session, notifications, storage, admin API,
/// terminal.
pub mod infrastructure;
