//! Scoped subscriptions to session events.
//!
//! A view takes a [`Subscription`] when it becomes visible and drops it when
//! it goes away.  There is no unsubscribe call to forget: dropping the handle
//! drops the underlying `broadcast::Receiver`, which is the release.

use big2_core::protocol::messages::EventKind;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::infrastructure::connection::SessionEvent;

/// Receives session events, optionally restricted to some event kinds.
///
/// Lifecycle events (`Connected`, `Disconnected`) always pass the filter.
pub struct Subscription {
    rx: broadcast::Receiver<SessionEvent>,
    kinds: Option<Vec<EventKind>>,
}

impl Subscription {
    /// Every event.
    pub fn all(rx: broadcast::Receiver<SessionEvent>) -> Self {
        Self { rx, kinds: None }
    }

    /// Only server events of `kinds`, plus lifecycle events.
    pub fn filtered(rx: broadcast::Receiver<SessionEvent>, kinds: &[EventKind]) -> Self {
        Self { rx, kinds: Some(kinds.to_vec()) }
    }

    fn accepts(&self, event: &SessionEvent) -> bool {
        match (&self.kinds, event.kind()) {
            (Some(kinds), Some(kind)) => kinds.contains(&kind),
            _ => true,
        }
    }

    /// Waits for the next matching event.
    ///
    /// Returns `None` once the session is gone.  A subscriber that falls
    /// behind skips the missed events and carries on.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "subscriber lagged; events dropped"),
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
