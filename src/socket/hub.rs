use std::collections::HashMap;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use crate::socket::protocol::{Notification, ServerEvent};

/// A handle to send events to one connected WebSocket session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub session_id: Uuid,
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

/// Tracks every open WebSocket session, grouped by user id.
///
/// A user may have several sessions (tabs, devices); events addressed to the
/// user reach all of them.
#[derive(Default)]
pub struct SocketHub {
    /// user_id -> connected session handles
    users: RwLock<HashMap<String, Vec<SessionHandle>>>,
}

impl SocketHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session for `user_id`.
    /// Returns the session id and the receiver the session should drain.
    pub async fn join(&self, user_id: &str) -> (Uuid, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session_id = Uuid::new_v4();

        let mut users = self.users.write().await;
        users
            .entry(user_id.to_string())
            .or_default()
            .push(SessionHandle {
                session_id,
                sender: tx,
            });

        debug!(user_id, %session_id, "Socket session joined");
        (session_id, rx)
    }

    /// Forget one session. Users with no sessions left are dropped.
    pub async fn leave(&self, user_id: &str, session_id: Uuid) {
        let mut users = self.users.write().await;

        if let Some(sessions) = users.get_mut(user_id) {
            sessions.retain(|s| s.session_id != session_id);
            if sessions.is_empty() {
                users.remove(user_id);
            }
        }
        debug!(user_id, %session_id, "Socket session left");
    }

    /// Deliver an event to every session of the addressed user.
    ///
    /// Delivery is best-effort: an offline user or a closed session is
    /// skipped silently.
    pub async fn emit_to_user(&self, notification: Notification) {
        let users = self.users.read().await;
        let Some(sessions) = users.get(&notification.user_id) else {
            debug!(
                user_id = %notification.user_id,
                kind = notification.event.kind(),
                "No socket session for user"
            );
            return;
        };

        for session in sessions {
            // A failed send means the session is closing; leave() will clean it up.
            if session.sender.send(notification.event.clone()).is_err() {
                debug!(session_id = %session.session_id, "Dropped event for closed session");
            }
        }
    }

    #[cfg(test)]
    async fn is_user_online(&self, user_id: &str) -> bool {
        let users = self.users.read().await;
        users.get(user_id).is_some_and(|sessions| !sessions.is_empty())
    }
}
