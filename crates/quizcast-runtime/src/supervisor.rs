//! Reconnect supervision.
//!
//! ```text
//!            start            connected
//!   Idle ───────────▶ (connecting) ───────▶ Connected
//!    ▲                    │  ▲                  │
//!    │ stop               │  │ retry            │ disconnected
//!    │                    ▼  │                  ▼
//!    └──────────── Reconnecting(n) ◀────────────┘
//!                         │
//!                         │ n > max_attempts, or user-correctable failure
//!                         ▼
//!                       Failed  (terminal until the next start)
//! ```
//!
//! The supervisor only decides. The runtime owns the timers and the
//! connection attempts.

use std::time::Duration;

use quizcast_core::SourceError;
use tracing::{debug, info, warn};

use crate::config::ReconnectConfig;

/// Linear backoff with a cap: `delay(n) = min(max_delay, step * n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Attempts allowed after a disconnect.
    pub max_attempts: u32,
    /// Backoff step.
    pub step: Duration,
    /// Backoff cap.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            step: Duration::from_secs(config.step_secs),
            max_delay: Duration::from_secs(config.max_delay_secs),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt).min(self.max_delay)
    }
}

/// Supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No session and none wanted.
    Idle,
    /// A session is up.
    Connected,
    /// Waiting for or running reconnect attempt `attempt`.
    Reconnecting { attempt: u32 },
    /// Gave up. Stays here until the next [`Supervisor::start`].
    Failed,
}

/// What the runtime should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Try again after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// Report the terminal failure. Returned exactly once per failure.
    GiveUp { attempts: u32 },
    /// Nothing to do.
    Stop,
}

/// Tracks the reconnect state for one target.
#[derive(Debug, Clone)]
pub struct Supervisor {
    policy: ReconnectPolicy,
    state: SupervisorState,
    target: Option<String>,
    attempts: u32,
}

impl Supervisor {
    /// Creates an idle supervisor.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: SupervisorState::Idle,
            target: None,
            attempts: 0,
        }
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// The last-known target.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Reconnect attempts made since the last successful connection.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The operator asked for `target`. Clears any previous failure.
    pub fn start(&mut self, target: impl Into<String>) {
        let target = target.into();
        debug!(target = %target, "Supervisor started");
        self.target = Some(target);
        self.attempts = 0;
        self.state = SupervisorState::Idle;
    }

    /// A session came up.
    pub fn on_connected(&mut self) {
        if self.attempts > 0 {
            info!(attempts = self.attempts, "Reconnected");
        }
        self.attempts = 0;
        self.state = SupervisorState::Connected;
    }

    /// The upstream dropped an established session, or a reconnect attempt
    /// failed transiently.
    pub fn on_disconnected(&mut self) -> Decision {
        if self.target.is_none() || self.state == SupervisorState::Failed {
            return Decision::Stop;
        }

        self.attempts += 1;
        if self.attempts > self.policy.max_attempts {
            let attempts = self.policy.max_attempts;
            warn!(attempts, "Reconnect attempts exhausted");
            self.state = SupervisorState::Failed;
            return Decision::GiveUp { attempts };
        }

        let delay = self.policy.delay_for(self.attempts);
        self.state = SupervisorState::Reconnecting {
            attempt: self.attempts,
        };
        Decision::Retry {
            attempt: self.attempts,
            delay,
        }
    }

    /// A connection attempt failed with `error`.
    ///
    /// User-correctable failures give up at once; others count as a
    /// disconnect.
    pub fn on_attempt_failed(&mut self, error: &SourceError) -> Decision {
        if self.target.is_none() || self.state == SupervisorState::Failed {
            return Decision::Stop;
        }

        if error.is_user_correctable() {
            warn!(error = %error, "Not retrying: target needs operator attention");
            self.state = SupervisorState::Failed;
            return Decision::GiveUp {
                attempts: self.attempts,
            };
        }

        self.on_disconnected()
    }

    /// Intentional stop (operator disconnect, broadcast ended). No
    /// reconnects follow.
    pub fn stop(&mut self) {
        self.attempts = 0;
        self.state = SupervisorState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supervisor() -> Supervisor {
        let mut sup = Supervisor::new(ReconnectPolicy::default());
        sup.start("host");
        sup.on_connected();
        sup
    }

    fn transient() -> SourceError {
        SourceError::ConnectionFailed {
            target: "host".into(),
            reason: "reset".into(),
        }
    }

    #[test]
    fn test_delay_sequence() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = (1..=7).map(|n| policy.delay_for(n).as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 15, 20, 25, 30, 30]);
    }

    #[test]
    fn test_exactly_max_attempts_then_one_give_up() {
        let mut sup = supervisor();
        let mut retries = 0;

        let mut decision = sup.on_disconnected();
        loop {
            match decision {
                Decision::Retry { attempt, delay } => {
                    retries += 1;
                    assert_eq!(attempt, retries);
                    assert_eq!(sup.state(), SupervisorState::Reconnecting { attempt });
                    assert_eq!(delay, sup.policy().delay_for(attempt));
                    decision = sup.on_attempt_failed(&transient());
                }
                Decision::GiveUp { attempts } => {
                    assert_eq!(attempts, 5);
                    break;
                }
                Decision::Stop => panic!("stopped before giving up"),
            }
        }
        assert_eq!(retries, 5);
        assert_eq!(sup.state(), SupervisorState::Failed);

        // Reported once.
        assert_eq!(sup.on_disconnected(), Decision::Stop);
        assert_eq!(sup.on_attempt_failed(&transient()), Decision::Stop);
    }

    #[test]
    fn test_success_resets_counter() {
        let mut sup = supervisor();
        sup.on_disconnected();
        sup.on_attempt_failed(&transient());
        assert_eq!(sup.attempts(), 2);

        sup.on_connected();
        assert_eq!(sup.attempts(), 0);
        assert_eq!(
            sup.on_disconnected(),
            Decision::Retry {
                attempt: 1,
                delay: Duration::from_secs(5)
            }
        );
    }

    #[test]
    fn test_user_correctable_failure_is_not_retried() {
        let mut sup = supervisor();
        sup.on_disconnected();
        let decision = sup.on_attempt_failed(&SourceError::TargetOffline {
            target: "host".into(),
        });
        assert_eq!(decision, Decision::GiveUp { attempts: 1 });
        assert_eq!(sup.state(), SupervisorState::Failed);
    }

    #[test]
    fn test_start_clears_failure() {
        let mut sup = supervisor();
        sup.on_attempt_failed(&SourceError::TargetNotFound {
            target: "host".into(),
        });
        assert_eq!(sup.state(), SupervisorState::Failed);

        sup.start("other");
        assert_eq!(sup.target(), Some("other"));
        assert_eq!(sup.state(), SupervisorState::Idle);
        assert!(matches!(sup.on_disconnected(), Decision::Retry { .. }));
    }

    #[test]
    fn test_no_target_means_stop() {
        let mut sup = Supervisor::new(ReconnectPolicy::default());
        assert_eq!(sup.on_disconnected(), Decision::Stop);
    }
}
