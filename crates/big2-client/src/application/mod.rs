//! Application layer use cases for the Big 2 client.
//!
//! # What lives here? (for beginners)
//!
//! - **`session_state`** – The shared client state and a pure reducer over
//!   it.  Server events and user actions go in; a list of `Effect`s comes out.
//!
//! - **`room_session`** – The use case that owns a `SessionState`, executes
//!   its effects through the injected ports, and tracks the current route.
//!
//! - **`hand`** – Sorting and card selection for the player's own hand.
//!
//! - **`routes`** – The screens the client can be on.
//!
//! - **`ports`** – Traits the infrastructure layer implements (event
//!   emitter, notifier, identity repository).
//!
//! Nothing in this layer opens sockets or files.

pub mod hand;
pub mod ports;
pub mod room_session;
pub mod routes;
pub mod session_state;
