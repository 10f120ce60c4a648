//! Round context and the control messages that drive it.
//!
//! The round context is owned by a single writer (the router loop). Control
//! messages replace it wholesale; the matcher only ever sees an immutable
//! reference to the current value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ControlError, ControlResult};
use crate::matcher::{AnswerMatcher, MatchOutcome};

// ============================================================================
// RoundContext
// ============================================================================

/// The current round of the guessing game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundContext {
    /// Display phrase shown to viewers.
    pub phrase: Option<String>,
    /// The answer comments are compared against.
    pub answer: String,
    /// Category label.
    pub category: Option<String>,
    /// Whether the round currently accepts answers.
    pub active: bool,
}

impl RoundContext {
    /// Creates an active round for `answer`.
    pub fn active(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            active: true,
            ..Self::default()
        }
    }

    /// Sets the display phrase.
    pub fn with_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.phrase = Some(phrase.into());
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Returns true when comments should be compared with the answer.
    pub fn accepts_answers(&self) -> bool {
        self.active && !self.answer.trim().is_empty()
    }

    /// Classifies `comment` against this round.
    ///
    /// Inactive rounds and rounds without an answer never match, and the
    /// matcher is not consulted for them.
    pub fn evaluate(&self, matcher: &AnswerMatcher, comment: &str) -> MatchOutcome {
        if !self.accepts_answers() {
            return MatchOutcome::NONE;
        }
        matcher.evaluate(comment, &self.answer)
    }
}

/// Payload of an `update_game_state` control message.
///
/// Missing or null fields default to empty strings and an inactive round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundUpdate {
    #[serde(default)]
    pub phrase: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "isActive")]
    pub is_active: Option<bool>,
}

impl From<RoundUpdate> for RoundContext {
    fn from(update: RoundUpdate) -> Self {
        Self {
            phrase: update.phrase.filter(|s| !s.is_empty()),
            answer: update.answer.unwrap_or_default(),
            category: update.category.filter(|s| !s.is_empty()),
            active: update.is_active.unwrap_or(false),
        }
    }
}

// ============================================================================
// ControlMessage
// ============================================================================

/// A message received on the control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Replace the round context.
    UpdateRound(RoundUpdate),
    /// Connect to a new target.
    Connect {
        /// Target identifier (leading `@` allowed).
        username: String,
    },
    /// Close the current session without reconnecting.
    Disconnect,
    /// Emit a status snapshot.
    GetStatus,
}

#[derive(Deserialize)]
struct Envelope {
    action: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct ConnectData {
    username: String,
}

impl ControlMessage {
    /// Parses one line of the control channel.
    pub fn parse(line: &str) -> ControlResult<Self> {
        let envelope: Envelope = serde_json::from_str(line.trim())
            .map_err(|e| ControlError::InvalidJson(e.to_string()))?;
        let action = envelope.action.ok_or(ControlError::MissingAction)?;
        let data = envelope.data.unwrap_or(Value::Null);

        match action.as_str() {
            "update_game_state" => {
                let update = if data.is_null() {
                    RoundUpdate::default()
                } else {
                    serde_json::from_value(data).map_err(|e| ControlError::InvalidData {
                        action: action.clone(),
                        reason: e.to_string(),
                    })?
                };
                Ok(Self::UpdateRound(update))
            }
            "connect" => {
                let ConnectData { username } =
                    serde_json::from_value(data).map_err(|e| ControlError::InvalidData {
                        action: action.clone(),
                        reason: e.to_string(),
                    })?;
                if username.trim().trim_start_matches('@').is_empty() {
                    return Err(ControlError::InvalidData {
                        action,
                        reason: "username is empty".into(),
                    });
                }
                Ok(Self::Connect { username })
            }
            "disconnect" => Ok(Self::Disconnect),
            "get_status" => Ok(Self::GetStatus),
            _ => Err(ControlError::UnknownAction(action)),
        }
    }

    /// Returns the action name.
    pub fn action(&self) -> &'static str {
        match self {
            Self::UpdateRound(_) => "update_game_state",
            Self::Connect { .. } => "connect",
            Self::Disconnect => "disconnect",
            Self::GetStatus => "get_status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_round_never_matches() {
        let matcher = AnswerMatcher::default();
        let mut round = RoundContext::active("paris");
        assert!(round.evaluate(&matcher, "paris").matched);

        round.active = false;
        assert!(!round.evaluate(&matcher, "paris").matched);
    }

    #[test]
    fn test_round_without_answer_never_matches() {
        let matcher = AnswerMatcher::default();
        let round = RoundContext {
            active: true,
            ..RoundContext::default()
        };
        assert!(!round.accepts_answers());
        assert!(!round.evaluate(&matcher, "").matched);
    }

    #[test]
    fn test_parse_update_game_state() {
        let line = r#"{"action":"update_game_state","data":{"phrase":"Capital of France","answer":"Paris","category":"Geography","isActive":true}}"#;
        let msg = ControlMessage::parse(line).unwrap();
        let ControlMessage::UpdateRound(update) = msg else {
            panic!("expected update");
        };
        let round = RoundContext::from(update);
        assert_eq!(
            round,
            RoundContext::active("Paris")
                .with_phrase("Capital of France")
                .with_category("Geography")
        );
    }

    #[test]
    fn test_parse_update_defaults() {
        let msg = ControlMessage::parse(r#"{"action":"update_game_state","data":{"answer":null}}"#)
            .unwrap();
        let ControlMessage::UpdateRound(update) = msg else {
            panic!("expected update");
        };
        let round = RoundContext::from(update);
        assert_eq!(round, RoundContext::default());

        let msg = ControlMessage::parse(r#"{"action":"update_game_state"}"#).unwrap();
        assert_eq!(msg, ControlMessage::UpdateRound(RoundUpdate::default()));
    }

    #[test]
    fn test_parse_other_actions() {
        assert_eq!(
            ControlMessage::parse(r#"{"action":"connect","data":{"username":"@host"}}"#).unwrap(),
            ControlMessage::Connect {
                username: "@host".into()
            }
        );
        assert_eq!(
            ControlMessage::parse(r#"{"action":"disconnect"}"#).unwrap(),
            ControlMessage::Disconnect
        );
        assert_eq!(
            ControlMessage::parse(r#" {"action":"get_status"} "#).unwrap(),
            ControlMessage::GetStatus
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ControlMessage::parse("not json"),
            Err(ControlError::InvalidJson(_))
        ));
        assert!(matches!(
            ControlMessage::parse(r#"{"data":{}}"#),
            Err(ControlError::MissingAction)
        ));
        assert!(matches!(
            ControlMessage::parse(r#"{"action":"explode"}"#),
            Err(ControlError::UnknownAction(_))
        ));
        assert!(matches!(
            ControlMessage::parse(r#"{"action":"update_game_state","data":{"isActive":"yes"}}"#),
            Err(ControlError::InvalidData { .. })
        ));
        assert!(matches!(
            ControlMessage::parse(r#"{"action":"connect","data":{"username":"@"}}"#),
            Err(ControlError::InvalidData { .. })
        ));
        assert!(matches!(
            ControlMessage::parse(r#"{"action":"connect"}"#),
            Err(ControlError::InvalidData { .. })
        ));
    }
}
