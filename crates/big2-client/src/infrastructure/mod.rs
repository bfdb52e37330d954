//! Infrastructure layer for the client.
//!
//! Contains the adapters behind the application ports plus the terminal
//! front end.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `big2_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`connection`** – The Socket.IO session over tokio-tungstenite.
//!   Implements `EventEmitter`.
//! - **`subscription`** – Scoped, filtered receivers of session events.
//! - **`dispatch`** – Pumps session events into the room session use case.
//! - **`toast_service`** – The notification queue with its expiry timer.
//!   Implements `Notifier`.
//! - **`storage`** – Config and identity files.  `IdentityStore` implements
//!   `IdentityRepository`.
//! - **`admin_api`** – HTTP client for the server's admin endpoints.
//! - **`terminal`** – Command parsing and text rendering.

pub mod admin_api;
pub mod connection;
pub mod dispatch;
pub mod storage;
pub mod subscription;
pub mod terminal;
pub mod toast_service;
