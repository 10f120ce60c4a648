//! Maps chat events to notifications.

use quizcast_core::{AnswerMatcher, ChatEvent, MatchTier, Notification, RoundContext};
use tracing::{debug, info, trace};

/// Owns the round context and decides what each payload event produces.
///
/// Lifecycle events are handled by the runtime, not here.
#[derive(Debug, Clone, Default)]
pub struct Router {
    round: RoundContext,
    matcher: AnswerMatcher,
}

impl Router {
    pub fn new(matcher: AnswerMatcher) -> Self {
        Self {
            round: RoundContext::default(),
            matcher,
        }
    }

    /// The current round.
    pub fn round(&self) -> &RoundContext {
        &self.round
    }

    /// Replaces the round context as a whole.
    pub fn replace_round(&mut self, round: RoundContext) {
        info!(
            active = round.active,
            phrase = ?round.phrase,
            category = ?round.category,
            "Round updated"
        );
        self.round = round;
    }

    /// Returns the notification for a payload event, if any.
    ///
    /// A winning comment does not close the round: every matching comment
    /// while the round is active produces a `winner`.
    pub fn route(&self, event: &ChatEvent) -> Option<Notification> {
        match event {
            ChatEvent::Comment(comment) => {
                let outcome = self.round.evaluate(&self.matcher, &comment.text);
                if !outcome.matched {
                    trace!(user = %comment.sender.stable_id, "Comment did not match");
                    return None;
                }
                debug_assert_ne!(outcome.tier, MatchTier::None);
                info!(
                    user = %comment.sender.display_name,
                    unique_id = %comment.sender.stable_id,
                    tier = %outcome.tier,
                    "Correct answer"
                );
                Some(Notification::winner(
                    &comment.sender,
                    &comment.text,
                    &self.round,
                ))
            }
            ChatEvent::Gift(gift) => {
                if gift.streak.is_final() {
                    Some(Notification::gift(gift))
                } else {
                    debug!(gift = %gift.gift_name, "Gift streak in progress");
                    None
                }
            }
            ChatEvent::Like(like) => Some(Notification::like(&like.sender, like.count)),
            ChatEvent::Follow(follow) => Some(Notification::follow(&follow.sender)),
            ChatEvent::Connected { .. } | ChatEvent::Disconnected { .. } | ChatEvent::LiveEnded => {
                None
            }
        }
    }
}
