//! Tiered answer matching.
//!
//! A comment is compared against the round's answer through a sequence of
//! tiers. The first tier that succeeds decides the outcome:
//!
//! 1. [`MatchTier::Exact`]: normalized comment equals normalized answer.
//! 2. [`MatchTier::Substring`]: normalized answer occurs inside the
//!    normalized comment.
//! 3. [`MatchTier::WordOverlap`]: for multi-word answers, the share of answer
//!    words present in the comment reaches the configured threshold.
//!
//! The order of the tiers and the overlap threshold come from
//! [`MatchConfig`].

mod normalize;

pub use normalize::normalize;

use serde::{Deserialize, Serialize};

/// Default share of answer words that must appear in the comment.
pub const DEFAULT_WORD_OVERLAP_THRESHOLD: f64 = 0.7;

/// A matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Normalized strings are equal.
    Exact,
    /// Normalized answer is a substring of the normalized comment.
    Substring,
    /// Enough answer words appear in the comment.
    WordOverlap,
    /// No tier matched.
    None,
}

impl MatchTier {
    /// Returns the tier name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Substring => "substring",
            Self::WordOverlap => "word_overlap",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of comparing a comment with an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Whether the comment counts as a correct answer.
    pub matched: bool,
    /// The tier that decided it, or [`MatchTier::None`].
    pub tier: MatchTier,
}

impl MatchOutcome {
    /// A non-match.
    pub const NONE: Self = Self {
        matched: false,
        tier: MatchTier::None,
    };

    fn hit(tier: MatchTier) -> Self {
        Self {
            matched: true,
            tier,
        }
    }
}

/// Matching configuration (the `[matching]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum share of answer words that must appear in the comment.
    pub word_overlap_threshold: f64,
    /// Tiers to try, in order. [`MatchTier::None`] entries are ignored.
    pub tiers: Vec<MatchTier>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            word_overlap_threshold: DEFAULT_WORD_OVERLAP_THRESHOLD,
            tiers: vec![MatchTier::Exact, MatchTier::Substring, MatchTier::WordOverlap],
        }
    }
}

/// Compares chat comments with round answers.
#[derive(Debug, Clone, Default)]
pub struct AnswerMatcher {
    config: MatchConfig,
}

impl AnswerMatcher {
    /// Creates a matcher with the given configuration.
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Returns true when `comment` answers `answer`.
    pub fn is_match(&self, comment: &str, answer: &str) -> bool {
        self.evaluate(comment, answer).matched
    }

    /// Classifies `comment` against `answer`.
    ///
    /// An answer that is empty, or that normalizes to nothing, never matches.
    pub fn evaluate(&self, comment: &str, answer: &str) -> MatchOutcome {
        if answer.trim().is_empty() {
            return MatchOutcome::NONE;
        }
        let answer = normalize(answer);
        if answer.is_empty() {
            return MatchOutcome::NONE;
        }
        let comment = normalize(comment);

        for tier in &self.config.tiers {
            let hit = match tier {
                MatchTier::Exact => comment == answer,
                MatchTier::Substring => comment.contains(answer.as_str()),
                MatchTier::WordOverlap => {
                    word_overlap(&comment, &answer) >= self.config.word_overlap_threshold
                }
                MatchTier::None => false,
            };
            if hit {
                return MatchOutcome::hit(*tier);
            }
        }
        MatchOutcome::NONE
    }
}

/// Share of `answer` words that occur anywhere in `comment`.
///
/// Single-word answers always score zero; the exact and substring tiers
/// cover them.
fn word_overlap(comment: &str, answer: &str) -> f64 {
    let answer_words: Vec<&str> = answer.split(' ').collect();
    if answer_words.len() <= 1 {
        return 0.0;
    }
    let comment_words: Vec<&str> = comment.split(' ').collect();
    let present = answer_words
        .iter()
        .filter(|word| comment_words.contains(word))
        .count();
    present as f64 / answer_words.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> AnswerMatcher {
        AnswerMatcher::default()
    }

    #[test]
    fn test_exact_tier() {
        let outcome = matcher().evaluate("paris", "Paris");
        assert!(outcome.matched);
        assert_eq!(outcome.tier, MatchTier::Exact);

        let outcome = matcher().evaluate("¡PARÍS!", "paris");
        assert_eq!(outcome.tier, MatchTier::Exact);
    }

    #[test]
    fn test_substring_tier() {
        let outcome = matcher().evaluate("the answer is paris", "paris");
        assert!(outcome.matched);
        assert_eq!(outcome.tier, MatchTier::Substring);
    }

    #[test]
    fn test_word_overlap_tier() {
        let outcome = matcher().evaluate("juan carlos perez", "juan perez");
        assert!(outcome.matched);
        assert_eq!(outcome.tier, MatchTier::WordOverlap);
    }

    #[test]
    fn test_word_overlap_below_threshold() {
        assert!(!matcher().is_match("juan", "juan carlos perez"));
        assert!(!matcher().is_match("nothing in common", "juan carlos perez"));
    }

    #[test]
    fn test_empty_answer_fails_closed() {
        for comment in ["", "anything", "paris"] {
            assert!(!matcher().is_match(comment, ""));
            assert!(!matcher().is_match(comment, "   "));
            assert!(!matcher().is_match(comment, "?!"));
        }
    }

    #[test]
    fn test_single_word_answer_skips_overlap() {
        assert!(!matcher().is_match("lyon", "paris"));
        assert_eq!(word_overlap("PARIS FRANCE", "PARIS"), 0.0);
    }

    #[test]
    fn test_configurable_threshold() {
        let strict = AnswerMatcher::new(MatchConfig {
            word_overlap_threshold: 1.0,
            ..MatchConfig::default()
        });
        assert!(!strict.is_match("the great wall", "great wall of china"));

        let loose = AnswerMatcher::new(MatchConfig {
            word_overlap_threshold: 0.5,
            ..MatchConfig::default()
        });
        assert!(loose.is_match("the great wall", "great wall of china"));
    }

    #[test]
    fn test_configurable_tier_order() {
        let exact_only = AnswerMatcher::new(MatchConfig {
            tiers: vec![MatchTier::Exact],
            ..MatchConfig::default()
        });
        assert!(exact_only.is_match("Paris", "paris"));
        assert!(!exact_only.is_match("the answer is paris", "paris"));

        let overlap_first = AnswerMatcher::new(MatchConfig {
            tiers: vec![MatchTier::WordOverlap, MatchTier::Exact],
            ..MatchConfig::default()
        });
        let outcome = overlap_first.evaluate("new york", "new york");
        assert_eq!(outcome.tier, MatchTier::WordOverlap);
    }

    #[test]
    fn test_config_deserializes_tiers() {
        let config: MatchConfig =
            serde_json::from_str(r#"{"tiers":["substring","exact"]}"#).unwrap();
        assert_eq!(config.tiers, vec![MatchTier::Substring, MatchTier::Exact]);
        assert_eq!(config.word_overlap_threshold, DEFAULT_WORD_OVERLAP_THRESHOLD);
    }
}
