//! Session status snapshots.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use quizcast_core::Notification;

/// A point-in-time view of the session, as reported by `get_status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub connected: bool,
    pub streamer_username: Option<String>,
    pub game_active: bool,
    pub current_phrase: Option<String>,
    pub room_id: Option<String>,
    pub reconnect_attempts: u32,
}

impl SessionStatus {
    /// Wraps the snapshot in a `status` notification.
    pub fn to_notification(&self) -> Notification {
        Notification::new(
            "status",
            serde_json::to_value(self).unwrap_or(serde_json::Value::Null),
        )
    }
}

/// Shared, read-mostly status written by the runtime loop.
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    inner: Arc<RwLock<SessionStatus>>,
}

impl StatusHandle {
    /// Returns a copy of the current status.
    pub fn snapshot(&self) -> SessionStatus {
        self.inner.read().clone()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut SessionStatus)) {
        f(&mut self.inner.write());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_notification() {
        let handle = StatusHandle::default();
        handle.update(|s| {
            s.connected = true;
            s.streamer_username = Some("host".into());
            s.room_id = Some("42".into());
        });

        let n = handle.snapshot().to_notification();
        assert_eq!(n.event, "status");
        assert_eq!(n.data["connected"], true);
        assert_eq!(n.data["streamer_username"], "host");
        assert_eq!(n.data["game_active"], false);
        assert!(n.data["current_phrase"].is_null());
        assert_eq!(n.data["reconnect_attempts"], 0);
    }
}
