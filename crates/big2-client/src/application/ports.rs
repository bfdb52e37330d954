//! Seams between the application layer and the outside world.
//!
//! The use cases only see these traits.  The infrastructure layer provides
//! the real implementations (socket session, toast service, identity file);
//! tests provide recording fakes.

use std::time::Duration;

use async_trait::async_trait;
use big2_core::domain::toast::Severity;
use big2_core::protocol::codec::ProtocolError;
use big2_core::protocol::messages::ClientEvent;
use thiserror::Error;

/// Errors surfaced by the session use cases.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No live connection to the game server.
    #[error("not connected to the game server")]
    NotConnected,

    /// The event could not be framed for the wire.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The connection's outbound queue has shut down.
    #[error("connection closed")]
    Closed,
}

/// Sends client events to the game server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventEmitter: Send + Sync {
    async fn emit(&self, event: ClientEvent) -> Result<(), SessionError>;

    /// Server-assigned id of the current connection, if connected.
    fn connection_id(&self) -> Option<String>;
}

/// Shows transient notifications to the player.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// `duration` of `None` uses the notifier's default.
    fn notify(&self, message: &str, severity: Severity, duration: Option<Duration>);
}

/// Remembered identity between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredIdentity {
    pub username: Option<String>,
    pub room_name: Option<String>,
}

/// Persistence for the last username and room.
///
/// Implementations log and swallow their own failures; losing the stored
/// identity only costs a generated name on the next start.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityRepository: Send + Sync {
    fn load(&self) -> StoredIdentity;
    fn save_username(&self, username: &str);
    fn save_room_name(&self, room_name: &str);
}
