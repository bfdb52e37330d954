//! # big2-core
//!
//! Shared library for the Big 2 client containing the card ordering rules,
//! the bounded notification queue, identity-name validation, and the typed
//! event contract spoken with the game server.
//!
//! It has zero dependencies on sockets, timers, or an async runtime.  Anything
//! that needs the clock takes it through the [`domain::toast::Clock`] trait.
//!
//! # Architecture overview (for beginners)
//!
//! Big 2 is a four-player shedding card game.  The authoritative game engine
//! runs on a remote server; this workspace is the client side.  This crate is
//! the pure foundation the client is built on:
//!
//! - **`domain`** – Business values with no I/O: [`Card`] and its total order,
//!   the [`ToastQueue`] of user-facing notifications, and the
//!   [`names`](domain::names) normalizer used for usernames and room names.
//!
//! - **`protocol`** – How the client and server talk.  Typed
//!   [`ClientEvent`] / [`ServerEvent`] enums mirror the server's named events,
//!   and the [`codec`](protocol::codec) module frames them as Socket.IO v4
//!   text packets.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `big2_core::Card` instead of `big2_core::domain::card::Card`.
pub use domain::card::{Card, CardError, Rank, Suit};
pub use domain::names::{NameError, NameKind};
pub use domain::toast::{Clock, Severity, SystemClock, Toast, ToastId, ToastQueue, ToastState};
pub use protocol::codec::{decode_frame, encode_event, Frame, ProtocolError};
pub use protocol::messages::{ClientEvent, GameState, PlayerView, RoomStatus, RoomSummary, ServerEvent};
