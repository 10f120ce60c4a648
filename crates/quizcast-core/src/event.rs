//! Chat events delivered by upstream sources.
//!
//! Every adapter maps its platform's callbacks into the single [`ChatEvent`]
//! sum type, so the router sees one ordered stream regardless of how the
//! platform client schedules its callbacks.
//!
//! ```text
//! ChatEvent
//! ├── Connected { target, room_id }
//! ├── Disconnected { reason }
//! ├── LiveEnded
//! ├── Comment(CommentEvent)
//! ├── Gift(GiftEvent)
//! ├── Like(LikeEvent)
//! └── Follow(FollowEvent)
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Display name used when the platform provides neither nickname nor id.
pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous user";

/// Stable id used when the platform provides none.
pub const UNKNOWN_USER_ID: &str = "unknown";

// ============================================================================
// ChatUser
// ============================================================================

/// A chat participant, as seen by the router.
///
/// Adapters build this from whatever user object their platform client
/// exposes; nothing downstream of the adapter inspects third-party shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    /// Name to show on screen.
    pub display_name: String,
    /// Platform handle that identifies the user across sessions.
    pub stable_id: String,
    /// Profile picture URL, when one could be resolved.
    pub avatar_url: Option<String>,
}

impl ChatUser {
    /// Builds a user from optional platform fields, applying the fallbacks
    /// (nickname, then handle, then a fixed anonymous name).
    pub fn from_parts(
        nickname: Option<&str>,
        handle: Option<&str>,
        avatar_url: Option<String>,
    ) -> Self {
        let nickname = nickname.filter(|s| !s.is_empty());
        let handle = handle.filter(|s| !s.is_empty());
        Self {
            display_name: nickname
                .or(handle)
                .unwrap_or(ANONYMOUS_DISPLAY_NAME)
                .to_string(),
            stable_id: handle.unwrap_or(UNKNOWN_USER_ID).to_string(),
            avatar_url,
        }
    }
}

// ============================================================================
// Payload events
// ============================================================================

/// A chat comment.
#[derive(Debug, Clone)]
pub struct CommentEvent {
    /// Who wrote it.
    pub sender: ChatUser,
    /// Raw comment text, untouched.
    pub text: String,
    /// When the comment reached this process.
    pub received_at: OffsetDateTime,
    /// The raw upstream frame, kept for diagnostics.
    pub raw: Option<Arc<str>>,
}

impl CommentEvent {
    /// Creates a comment received now.
    pub fn new(sender: ChatUser, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            received_at: OffsetDateTime::now_utc(),
            raw: None,
        }
    }

    /// Attaches the raw upstream frame.
    pub fn with_raw(mut self, raw: &str) -> Self {
        self.raw = Some(Arc::from(raw));
        self
    }
}

/// Where a gift stands in its streak.
///
/// Repeatable gifts are delivered once per repetition while the sender keeps
/// tapping; only the last delivery carries the final count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakState {
    /// The gift cannot streak; every delivery is final.
    NotStreakable,
    /// A streak is running; more deliveries will follow.
    InProgress,
    /// The streak finished with this delivery.
    Ended,
    /// The platform gave no streak information.
    Unknown,
}

impl StreakState {
    /// Returns true when this delivery should be treated as the final gift.
    pub fn is_final(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// A gift sent to the streamer.
#[derive(Debug, Clone)]
pub struct GiftEvent {
    /// Who sent it.
    pub sender: ChatUser,
    /// Platform gift id.
    pub gift_id: i64,
    /// Human-readable gift name.
    pub gift_name: String,
    /// How many were sent in this delivery (or the whole streak, when final).
    pub quantity: u32,
    /// Streak position.
    pub streak: StreakState,
}

/// One or more likes.
#[derive(Debug, Clone)]
pub struct LikeEvent {
    /// Who liked.
    pub sender: ChatUser,
    /// Number of likes in this batch.
    pub count: u32,
}

/// A new follower.
#[derive(Debug, Clone)]
pub struct FollowEvent {
    /// Who followed.
    pub sender: ChatUser,
}

// ============================================================================
// ChatEvent
// ============================================================================

/// Every event an upstream source can deliver.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// The session is live.
    Connected {
        /// The target the session is attached to.
        target: String,
        /// Platform room identifier.
        room_id: Option<String>,
    },
    /// The session dropped.
    Disconnected {
        /// Human-readable reason.
        reason: String,
    },
    /// The broadcast ended.
    LiveEnded,
    /// A chat comment.
    Comment(CommentEvent),
    /// A gift.
    Gift(GiftEvent),
    /// Likes.
    Like(LikeEvent),
    /// A follow.
    Follow(FollowEvent),
}

impl ChatEvent {
    /// Returns the short event name used in logs and notifications.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connect",
            Self::Disconnected { .. } => "disconnect",
            Self::LiveEnded => "live_end",
            Self::Comment(_) => "comment",
            Self::Gift(_) => "gift",
            Self::Like(_) => "like",
            Self::Follow(_) => "follow",
        }
    }

    /// Returns true for lifecycle events (connect, disconnect, live end).
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::Connected { .. } | Self::Disconnected { .. } | Self::LiveEnded
        )
    }

    /// Returns the sender for payload events.
    pub fn sender(&self) -> Option<&ChatUser> {
        match self {
            Self::Comment(e) => Some(&e.sender),
            Self::Gift(e) => Some(&e.sender),
            Self::Like(e) => Some(&e.sender),
            Self::Follow(e) => Some(&e.sender),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_fallbacks() {
        let user = ChatUser::from_parts(Some("María"), Some("maria_01"), None);
        assert_eq!(user.display_name, "María");
        assert_eq!(user.stable_id, "maria_01");

        let user = ChatUser::from_parts(None, Some("maria_01"), None);
        assert_eq!(user.display_name, "maria_01");

        let user = ChatUser::from_parts(Some(""), None, None);
        assert_eq!(user.display_name, ANONYMOUS_DISPLAY_NAME);
        assert_eq!(user.stable_id, UNKNOWN_USER_ID);
    }

    #[test]
    fn test_streak_finality() {
        assert!(StreakState::NotStreakable.is_final());
        assert!(StreakState::Ended.is_final());
        assert!(StreakState::Unknown.is_final());
        assert!(!StreakState::InProgress.is_final());
    }

    #[test]
    fn test_event_names() {
        let user = ChatUser::from_parts(Some("a"), Some("a"), None);
        assert_eq!(ChatEvent::LiveEnded.event_name(), "live_end");
        assert_eq!(
            ChatEvent::Comment(CommentEvent::new(user.clone(), "hi")).event_name(),
            "comment"
        );
        assert!(
            ChatEvent::Disconnected {
                reason: "x".into()
            }
            .is_lifecycle()
        );
        assert!(
            ChatEvent::Follow(FollowEvent { sender: user })
                .sender()
                .is_some()
        );
    }
}
