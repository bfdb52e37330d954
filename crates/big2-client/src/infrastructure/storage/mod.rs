//! Storage infrastructure: files under the platform config directory.
//!
//! - `config` – the TOML client configuration (server URL, toast limits, log
//!   level), with defaults on first run.
//! - `identity` – the remembered username and last room.

pub mod config;
pub mod identity;
