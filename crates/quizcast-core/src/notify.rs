//! Downstream notifications.
//!
//! Every forwarded event is wrapped in a [`Notification`] envelope
//! (`{event, data, timestamp}`) and handed to one or more [`Notifier`] sinks.
//! Delivery is best-effort: [`notify_best_effort`] logs failures and never
//! propagates them, so a slow or broken downstream cannot stop event intake.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::{NotifyError, NotifyResult};
use crate::event::{ChatUser, GiftEvent};
use crate::round::RoundContext;

// ============================================================================
// Notification
// ============================================================================

/// A notification envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Event name (`winner`, `gift`, `connect`, ...).
    pub event: String,
    /// Event payload.
    pub data: Value,
    /// Creation time, Unix epoch seconds.
    pub timestamp: i64,
}

impl Notification {
    /// Creates a notification stamped with the current time.
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
            timestamp: OffsetDateTime::now_utc().unix_timestamp(),
        }
    }

    /// The session attached to `username`.
    pub fn connected(username: &str, room_id: Option<&str>) -> Self {
        Self::new(
            "connect",
            json!({ "username": username, "room_id": room_id, "connected": true }),
        )
    }

    /// The session dropped. `reason` is `disconnect_event` or `manual`.
    pub fn disconnected(reason: &str) -> Self {
        Self::new("disconnect", json!({ "connected": false, "reason": reason }))
    }

    /// The broadcast ended.
    pub fn live_ended() -> Self {
        Self::new(
            "live_end",
            json!({ "connected": false, "reason": "live_ended" }),
        )
    }

    /// A comment answered the current round.
    pub fn winner(user: &ChatUser, comment: &str, round: &RoundContext) -> Self {
        Self::new(
            "winner",
            json!({
                "username": user.display_name,
                "unique_id": user.stable_id,
                "profile_picture": user.avatar_url,
                "comment": comment,
                "answer": round.answer,
                "phrase": round.phrase,
                "category": round.category,
            }),
        )
    }

    /// A final gift delivery.
    pub fn gift(gift: &GiftEvent) -> Self {
        Self::new(
            "gift",
            json!({
                "username": gift.sender.display_name,
                "unique_id": gift.sender.stable_id,
                "gift_name": gift.gift_name,
                "gift_id": gift.gift_id,
                "quantity": gift.quantity,
            }),
        )
    }

    /// Likes.
    pub fn like(user: &ChatUser, count: u32) -> Self {
        Self::new(
            "like",
            json!({
                "username": user.display_name,
                "unique_id": user.stable_id,
                "count": count,
            }),
        )
    }

    /// A new follower.
    pub fn follow(user: &ChatUser) -> Self {
        Self::new(
            "follow",
            json!({ "username": user.display_name, "unique_id": user.stable_id }),
        )
    }

    /// Automatic reconnection gave up.
    pub fn reconnect_failed(target: &str, attempts: u32, reason: &str) -> Self {
        Self::new(
            "reconnect_failed",
            json!({ "target": target, "attempts": attempts, "reason": reason }),
        )
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// A downstream sink for notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short sink name for logs.
    fn name(&self) -> &str;

    /// Delivers one notification.
    async fn notify(&self, notification: &Notification) -> NotifyResult<()>;
}

/// A shared notifier trait object.
pub type BoxedNotifier = Arc<dyn Notifier>;

/// Delivers `notification`, logging and discarding any failure.
///
/// Returns whether delivery succeeded, for callers that want to count.
pub async fn notify_best_effort(notifier: &dyn Notifier, notification: &Notification) -> bool {
    match notifier.notify(notification).await {
        Ok(()) => {
            debug!(sink = notifier.name(), event = %notification.event, "Notification delivered");
            true
        }
        Err(e) => {
            warn!(
                sink = notifier.name(),
                event = %notification.event,
                error = %e,
                "Notification failed"
            );
            false
        }
    }
}

/// Sends every notification to several sinks in turn.
///
/// Each sink is bounded by `timeout`; one failing sink does not prevent
/// delivery to the others.
pub struct FanoutNotifier {
    sinks: Vec<BoxedNotifier>,
    timeout: Duration,
}

impl FanoutNotifier {
    /// Creates a fan-out over `sinks`.
    pub fn new(sinks: Vec<BoxedNotifier>, timeout: Duration) -> Self {
        Self { sinks, timeout }
    }

    /// Returns the number of sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true when there are no sinks.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    fn name(&self) -> &str {
        "fanout"
    }

    async fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            let result = match tokio::time::timeout(self.timeout, sink.notify(notification)).await {
                Ok(result) => result,
                Err(_) => Err(NotifyError::Timeout(self.timeout)),
            };
            if let Err(e) = result {
                warn!(sink = sink.name(), event = %notification.event, error = %e, "Sink failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn notify(&self, notification: &Notification) -> NotifyResult<()> {
            self.seen.lock().await.push(notification.clone());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn notify(&self, _notification: &Notification) -> NotifyResult<()> {
            Err(NotifyError::Status {
                status: 500,
                body: String::new(),
            })
        }
    }

    fn user() -> ChatUser {
        ChatUser {
            display_name: "Ana".into(),
            stable_id: "ana_22".into(),
            avatar_url: Some("https://cdn.example/ana.webp".into()),
        }
    }

    #[test]
    fn test_winner_payload() {
        let round = RoundContext::active("Paris")
            .with_phrase("Capital of France")
            .with_category("Geography");
        let n = Notification::winner(&user(), "paris!", &round);
        assert_eq!(n.event, "winner");
        assert_eq!(n.data["username"], "Ana");
        assert_eq!(n.data["unique_id"], "ana_22");
        assert_eq!(n.data["profile_picture"], "https://cdn.example/ana.webp");
        assert_eq!(n.data["comment"], "paris!");
        assert_eq!(n.data["answer"], "Paris");
        assert_eq!(n.data["phrase"], "Capital of France");
        assert_eq!(n.data["category"], "Geography");
        assert!(n.timestamp > 0);
    }

    #[test]
    fn test_envelope_serialization() {
        let n = Notification::disconnected("manual");
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["event"], "disconnect");
        assert_eq!(value["data"]["connected"], false);
        assert_eq!(value["data"]["reason"], "manual");
        assert!(value["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        assert!(!notify_best_effort(&Failing, &Notification::live_ended()).await);
        let ok = Recording::default();
        assert!(notify_best_effort(&ok, &Notification::live_ended()).await);
    }

    #[tokio::test]
    async fn test_fanout_reaches_all_sinks() {
        let a = Arc::new(Recording::default());
        let b = Arc::new(Recording::default());
        let fanout = FanoutNotifier::new(
            vec![a.clone(), Arc::new(Failing), b.clone()],
            Duration::from_secs(1),
        );
        assert_eq!(fanout.len(), 3);

        let result = fanout.notify(&Notification::follow(&user())).await;
        assert!(matches!(result, Err(NotifyError::Status { status: 500, .. })));
        assert_eq!(a.seen.lock().await.len(), 1);
        assert_eq!(b.seen.lock().await.len(), 1);
    }

    struct Stalled;

    #[async_trait]
    impl Notifier for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn notify(&self, _notification: &Notification) -> NotifyResult<()> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fanout_bounds_stalled_sink() {
        let after = Arc::new(Recording::default());
        let fanout = FanoutNotifier::new(
            vec![Arc::new(Stalled), after.clone()],
            Duration::from_secs(5),
        );

        let started = tokio::time::Instant::now();
        let result = fanout.notify(&Notification::live_ended()).await;
        assert!(matches!(result, Err(NotifyError::Timeout(t)) if t == Duration::from_secs(5)));
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(after.seen.lock().await.len(), 1);
    }
}
