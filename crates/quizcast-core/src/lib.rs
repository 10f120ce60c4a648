//! # quizcast core
//!
//! Shared building blocks for the quizcast chat event router.
//!
//! ## Layers
//!
//! - **Events**: the typed [`ChatEvent`] sum type every adapter produces, and
//!   the [`ChatUser`] value adapters map third-party user objects into.
//! - **Round**: the guessing-game [`RoundContext`] and the control messages
//!   that replace it.
//! - **Matching**: the [`normalize`] text normalizer and the tiered
//!   [`AnswerMatcher`].
//! - **Integration**: the [`LiveSource`] trait upstream adapters implement and
//!   the [`Notifier`] trait downstream sinks implement.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌────────────┐
//! │  LiveSource  │────▶│  intake queue │────▶│   Router   │────▶ Notifier
//! │  (adapter)   │     │   (ordered)   │     │ (matching) │
//! └──────────────┘     └───────────────┘     └────────────┘
//!                             ▲
//!                  control ───┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use quizcast_core::{AnswerMatcher, MatchTier};
//!
//! let matcher = AnswerMatcher::default();
//! let outcome = matcher.evaluate("the answer is paris", "Paris");
//! assert!(outcome.matched);
//! assert_eq!(outcome.tier, MatchTier::Substring);
//! ```

pub mod error;
pub mod event;
pub mod matcher;
pub mod notify;
pub mod round;
pub mod source;

pub use error::{
    ControlError, ControlResult, NotifyError, NotifyResult, SourceError, SourceResult,
    TransportError, TransportResult,
};
pub use event::{
    ChatEvent, ChatUser, CommentEvent, FollowEvent, GiftEvent, LikeEvent, StreakState,
};
pub use matcher::{AnswerMatcher, MatchConfig, MatchOutcome, MatchTier, normalize};
pub use notify::{BoxedNotifier, FanoutNotifier, Notification, Notifier, notify_best_effort};
pub use round::{ControlMessage, RoundContext, RoundUpdate};
pub use source::{
    BoxedSource, ConfigurableSource, LiveSource, SessionHandle, SourceSession, clean_target,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::event::*;
    pub use super::matcher::{AnswerMatcher, MatchOutcome, MatchTier, normalize};
    pub use super::notify::{Notification, Notifier};
    pub use super::round::{ControlMessage, RoundContext};
    pub use super::source::{LiveSource, SourceSession};
}
