//! Frames relayed by the connector bridge.
//!
//! Every frame is a JSON object tagged by `type`:
//!
//! ```text
//! {"type":"connect","unique_id":"host","room_id":"7301..."}   session confirmed
//! {"type":"error","message":"User is offline"}                 session refused
//! {"type":"comment","user":{...},"comment":"paris"}
//! {"type":"gift","user":{...},"gift":{...},"repeat_end":1}
//! {"type":"like","user":{...},"count":15}
//! {"type":"follow","user":{...}}
//! {"type":"disconnect"}
//! {"type":"live_end"}
//! ```
//!
//! Unrecognised types parse as [`Frame::Unknown`] and are ignored.

use serde::Deserialize;
use serde_json::Value;

use quizcast_core::{
    ChatEvent, CommentEvent, FollowEvent, LikeEvent, SourceError, SourceResult,
};

use crate::model::{GiftFrame, UserSchema};

/// A connector frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// The connector attached to the broadcast.
    Connect {
        #[serde(default)]
        unique_id: Option<String>,
        #[serde(default)]
        room_id: Value,
    },
    /// The connector could not attach.
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    /// A chat comment.
    Comment {
        #[serde(default)]
        user: Value,
        #[serde(default)]
        comment: Option<String>,
    },
    /// A gift relay.
    Gift(GiftFrame),
    /// Likes.
    Like {
        #[serde(default)]
        user: Value,
        #[serde(default)]
        count: Option<u32>,
    },
    /// A follow.
    Follow {
        #[serde(default)]
        user: Value,
    },
    /// The platform connection dropped.
    Disconnect {
        #[serde(default)]
        reason: Option<String>,
    },
    /// The broadcast ended.
    LiveEnd,
    /// Anything else.
    #[serde(other)]
    Unknown,
}

impl Frame {
    /// Parses one text frame.
    pub fn parse(text: &str) -> SourceResult<Self> {
        serde_json::from_str(text).map_err(|e| SourceError::protocol(format!("bad frame: {e}")))
    }

    /// Returns the room id of a `connect` frame as a string.
    pub fn room_id(&self) -> Option<String> {
        match self {
            Self::Connect { room_id, .. } => match room_id {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Maps a payload or lifecycle frame into a [`ChatEvent`].
    ///
    /// Returns `None` for handshake frames and unknown types. `raw` is the
    /// frame text, attached to comments for diagnostics.
    pub fn into_event(self, schema: UserSchema, raw: &str) -> Option<ChatEvent> {
        match self {
            Self::Comment { user, comment } => Some(ChatEvent::Comment(
                CommentEvent::new(schema.resolve(&user), comment.unwrap_or_default()).with_raw(raw),
            )),
            Self::Gift(gift) => Some(ChatEvent::Gift(gift.into_event(schema))),
            Self::Like { user, count } => Some(ChatEvent::Like(LikeEvent {
                sender: schema.resolve(&user),
                count: count.unwrap_or(1),
            })),
            Self::Follow { user } => Some(ChatEvent::Follow(FollowEvent {
                sender: schema.resolve(&user),
            })),
            Self::Disconnect { reason } => Some(ChatEvent::Disconnected {
                reason: reason.unwrap_or_else(|| "disconnect_event".to_string()),
            }),
            Self::LiveEnd => Some(ChatEvent::LiveEnded),
            Self::Connect { .. } | Self::Error { .. } | Self::Unknown => None,
        }
    }
}

/// Extracts the `user` object from a raw `comment` frame.
///
/// Used by diagnostics that need the unmapped object.
pub fn raw_comment_user(raw: &str) -> Option<Value> {
    let value: Value = serde_json::from_str(raw).ok()?;
    if value.get("type")?.as_str()? != "comment" {
        return None;
    }
    value.get("user").cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizcast_core::StreakState;

    #[test]
    fn test_parse_connect() {
        let frame = Frame::parse(r#"{"type":"connect","unique_id":"host","room_id":7301234}"#).unwrap();
        assert_eq!(frame.room_id().as_deref(), Some("7301234"));

        let frame = Frame::parse(r#"{"type":"connect","room_id":"abc"}"#).unwrap();
        assert_eq!(frame.room_id().as_deref(), Some("abc"));
        assert!(frame.into_event(UserSchema::V1, "").is_none());
    }

    #[test]
    fn test_comment_event() {
        let raw = r#"{"type":"comment","user":{"nickname":"Ana","unique_id":"ana_22"},"comment":"Paris!"}"#;
        let event = Frame::parse(raw).unwrap().into_event(UserSchema::V1, raw);
        let Some(ChatEvent::Comment(comment)) = event else {
            panic!("expected comment");
        };
        assert_eq!(comment.text, "Paris!");
        assert_eq!(comment.sender.display_name, "Ana");
        assert_eq!(comment.raw.as_deref(), Some(raw));

        let user = raw_comment_user(raw).unwrap();
        assert_eq!(user["unique_id"], "ana_22");
    }

    #[test]
    fn test_null_fields_do_not_drop_frames() {
        let raw = r#"{"type":"comment","user":{"unique_id":"ana"},"comment":null}"#;
        let event = Frame::parse(raw).unwrap().into_event(UserSchema::V1, raw);
        let Some(ChatEvent::Comment(comment)) = event else {
            panic!("expected comment");
        };
        assert_eq!(comment.text, "");
        assert_eq!(comment.sender.stable_id, "ana");

        let frame = Frame::parse(r#"{"type":"error","message":null}"#).unwrap();
        assert!(matches!(frame, Frame::Error { message: None }));
    }

    #[test]
    fn test_activity_events() {
        let like = Frame::parse(r#"{"type":"like","user":{"unique_id":"a"}}"#)
            .unwrap()
            .into_event(UserSchema::V1, "");
        assert!(matches!(like, Some(ChatEvent::Like(LikeEvent { count: 1, .. }))));

        let gift = Frame::parse(
            r#"{"type":"gift","user":{"unique_id":"a"},"gift":{"name":"Rose","info":{"type":1}},"repeat_end":0}"#,
        )
        .unwrap()
        .into_event(UserSchema::V1, "");
        let Some(ChatEvent::Gift(gift)) = gift else {
            panic!("expected gift");
        };
        assert_eq!(gift.streak, StreakState::InProgress);

        let follow = Frame::parse(r#"{"type":"follow","user":{}}"#)
            .unwrap()
            .into_event(UserSchema::V1, "");
        assert!(matches!(follow, Some(ChatEvent::Follow(_))));
    }

    #[test]
    fn test_lifecycle_and_unknown() {
        let event = Frame::parse(r#"{"type":"disconnect"}"#)
            .unwrap()
            .into_event(UserSchema::V1, "");
        assert!(matches!(
            event,
            Some(ChatEvent::Disconnected { ref reason }) if reason == "disconnect_event"
        ));

        let event = Frame::parse(r#"{"type":"live_end"}"#)
            .unwrap()
            .into_event(UserSchema::V1, "");
        assert!(matches!(event, Some(ChatEvent::LiveEnded)));

        let frame = Frame::parse(r#"{"type":"room_user_seq","total":10}"#).unwrap();
        assert!(matches!(frame, Frame::Unknown));
    }

    #[test]
    fn test_bad_frames() {
        assert!(Frame::parse("not json").is_err());
        assert!(Frame::parse(r#"{"no_type":true}"#).is_err());
    }
}
