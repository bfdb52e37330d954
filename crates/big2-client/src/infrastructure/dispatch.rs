//! Feeds socket session events into the room session use case.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::room_session::RoomSessionUseCase;
use crate::infrastructure::connection::SessionEvent;
use crate::infrastructure::subscription::Subscription;

/// Applies every event from `subscription` to `session` until the socket
/// session goes away.
///
/// `after` runs once each event has been applied, e.g. to redraw a view.
pub async fn dispatch_session_events<F>(
    mut subscription: Subscription,
    session: Arc<RoomSessionUseCase>,
    mut after: F,
) where
    F: FnMut(&SessionEvent) + Send,
{
    while let Some(event) = subscription.recv().await {
        match &event {
            SessionEvent::Connected { sid } => {
                info!(%sid, "session ready");
                session.on_connected().await;
            }
            SessionEvent::Disconnected => debug!("session lost"),
            SessionEvent::Server(server_event) => session.handle_server_event(server_event.clone()).await,
        }
        after(&event);
    }
    debug!("session event stream closed");
}
