//! Gift frames and streak mapping.
//!
//! Streakable gifts are relayed once per repetition while the viewer keeps
//! sending; only the final relay should be forwarded downstream.
//!
//! | `gift.info.type` | `streakable` / `streaking` | `repeat_end` | streak state     |
//! |------------------|----------------------------|--------------|------------------|
//! | `1`              | -                          | `1`          | `Ended`          |
//! | `1`              | -                          | other        | `InProgress`     |
//! | other            | -                          | -            | `NotStreakable`  |
//! | absent           | `true` / `true`            | -            | `InProgress`     |
//! | absent           | `true` / not `true`        | -            | `Ended`          |
//! | absent           | `false`                    | -            | `NotStreakable`  |
//! | absent           | absent                     | -            | `Unknown`        |

use serde::Deserialize;
use serde_json::Value;

use quizcast_core::{GiftEvent, StreakState};

use crate::model::UserSchema;

/// Gift type code for streakable gifts.
pub const STREAKABLE_GIFT_TYPE: i64 = 1;

/// Name used when the connector sends none.
pub const UNKNOWN_GIFT_NAME: &str = "Unknown gift";

/// Payload of a `gift` frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GiftFrame {
    #[serde(default)]
    pub user: Value,
    #[serde(default)]
    pub gift: GiftInfo,
    #[serde(default)]
    pub repeat_count: Option<u32>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub repeat_end: Value,
    #[serde(default)]
    pub streaking: Option<bool>,
}

/// The `gift` object inside a gift frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GiftInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub info: Option<GiftMeta>,
    #[serde(default)]
    pub streakable: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GiftMeta {
    #[serde(default, rename = "type")]
    pub kind: Option<i64>,
}

impl GiftFrame {
    /// Determines where this relay stands in its streak.
    pub fn streak(&self) -> StreakState {
        match self.gift.info.as_ref().and_then(|i| i.kind) {
            Some(STREAKABLE_GIFT_TYPE) => {
                if is_set(&self.repeat_end) {
                    StreakState::Ended
                } else {
                    StreakState::InProgress
                }
            }
            Some(_) => StreakState::NotStreakable,
            None => match self.gift.streakable {
                Some(true) if self.streaking == Some(true) => StreakState::InProgress,
                Some(true) => StreakState::Ended,
                Some(false) => StreakState::NotStreakable,
                None => StreakState::Unknown,
            },
        }
    }

    /// Number of gifts in this relay.
    pub fn count(&self) -> u32 {
        self.repeat_count.or(self.quantity).unwrap_or(1)
    }

    /// Converts into a [`GiftEvent`].
    pub fn into_event(self, schema: UserSchema) -> GiftEvent {
        let streak = self.streak();
        let quantity = self.count();
        GiftEvent {
            sender: schema.resolve(&self.user),
            gift_id: self.gift.id.unwrap_or_default(),
            gift_name: self
                .gift
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNKNOWN_GIFT_NAME.to_string()),
            quantity,
            streak,
        }
    }
}

/// `repeat_end` arrives as `1`/`0` or as a boolean depending on the client.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(value: Value) -> GiftFrame {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_type_one_streak() {
        let running = frame(json!({ "gift": { "info": { "type": 1 } }, "repeat_end": 0, "repeat_count": 3 }));
        assert_eq!(running.streak(), StreakState::InProgress);

        let done = frame(json!({ "gift": { "info": { "type": 1 } }, "repeat_end": 1, "repeat_count": 7 }));
        assert_eq!(done.streak(), StreakState::Ended);
        assert_eq!(done.count(), 7);

        let done_bool = frame(json!({ "gift": { "info": { "type": 1 } }, "repeat_end": true }));
        assert_eq!(done_bool.streak(), StreakState::Ended);
    }

    #[test]
    fn test_other_types_are_final() {
        let gift = frame(json!({ "gift": { "info": { "type": 2 }, "streakable": true }, "streaking": true }));
        assert_eq!(gift.streak(), StreakState::NotStreakable);
    }

    #[test]
    fn test_streakable_flags_without_type() {
        let running = frame(json!({ "gift": { "streakable": true }, "streaking": true }));
        assert_eq!(running.streak(), StreakState::InProgress);

        let done = frame(json!({ "gift": { "streakable": true }, "streaking": false }));
        assert_eq!(done.streak(), StreakState::Ended);

        let single = frame(json!({ "gift": { "streakable": false } }));
        assert_eq!(single.streak(), StreakState::NotStreakable);

        let unknown = frame(json!({}));
        assert_eq!(unknown.streak(), StreakState::Unknown);
        assert!(unknown.streak().is_final());
    }

    #[test]
    fn test_into_event() {
        let event = frame(json!({
            "user": { "nickname": "Ana", "unique_id": "ana_22" },
            "gift": { "id": 5655, "name": "Rose", "info": { "type": 1 } },
            "repeat_end": 1,
            "quantity": 4
        }))
        .into_event(UserSchema::V1);
        assert_eq!(event.sender.stable_id, "ana_22");
        assert_eq!(event.gift_id, 5655);
        assert_eq!(event.gift_name, "Rose");
        assert_eq!(event.quantity, 4);
        assert_eq!(event.streak, StreakState::Ended);

        let event = frame(json!({})).into_event(UserSchema::V1);
        assert_eq!(event.gift_name, UNKNOWN_GIFT_NAME);
        assert_eq!(event.quantity, 1);
    }
}
