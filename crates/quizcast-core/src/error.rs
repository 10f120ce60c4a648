//! Error types shared across quizcast crates.
//!
//! Runtime-level errors (configuration, persisted state) live in
//! `quizcast-runtime`.

use std::time::Duration;

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// Connection closed.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// Operation did not complete in time.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors raised while establishing or running an upstream live session.
///
/// Failures are split into two classes. User-correctable failures (the target
/// is not live, or does not exist) are never retried automatically; every
/// other failure is transient.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The target exists but is not broadcasting.
    #[error("@{target} is not live right now")]
    TargetOffline {
        /// The target identifier.
        target: String,
    },

    /// The target does not exist.
    #[error("user @{target} was not found")]
    TargetNotFound {
        /// The target identifier.
        target: String,
    },

    /// The upstream refused or dropped the connection attempt.
    #[error("could not connect to @{target}: {reason}")]
    ConnectionFailed {
        /// The target identifier.
        target: String,
        /// Reason for failure.
        reason: String,
    },

    /// The upstream sent something the adapter did not expect.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SourceError {
    /// Classifies a free-form upstream failure message for `target`.
    ///
    /// Upstream client libraries report "not found" and "offline" conditions
    /// only through their error text, so the classification is textual.
    pub fn classify(target: impl Into<String>, message: &str) -> Self {
        let target = target.into();
        let lower = message.to_lowercase();
        if lower.contains("not found") {
            Self::TargetNotFound { target }
        } else if lower.contains("not live") || lower.contains("offline") {
            Self::TargetOffline { target }
        } else {
            Self::ConnectionFailed {
                target,
                reason: message.to_string(),
            }
        }
    }

    /// Creates a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Returns true when the operator has to fix something before retrying.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::TargetOffline { .. } | Self::TargetNotFound { .. }
        )
    }
}

// =============================================================================
// Notify Errors
// =============================================================================

/// Errors raised by downstream notifiers.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} from downstream: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (possibly empty).
        body: String,
    },

    /// The request could not be sent.
    #[error("request failed: {0}")]
    Request(String),

    /// The request did not complete in time.
    #[error("notification timed out after {0:?}")]
    Timeout(Duration),

    /// The notification could not be serialized.
    #[error("failed to serialize notification: {0}")]
    Serialize(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for NotifyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

// =============================================================================
// Control Errors
// =============================================================================

/// Errors raised while parsing control-channel messages.
#[derive(Debug, Clone, Error)]
pub enum ControlError {
    /// The line is not valid JSON.
    #[error("control message is not valid JSON: {0}")]
    InvalidJson(String),

    /// The message has no `action` field.
    #[error("control message has no action")]
    MissingAction,

    /// The action is not recognised.
    #[error("unknown control action: {0}")]
    UnknownAction(String),

    /// The action payload is malformed.
    #[error("invalid data for '{action}': {reason}")]
    InvalidData {
        /// The action whose payload failed to parse.
        action: String,
        /// Reason for failure.
        reason: String,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for upstream source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for notifier operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Result type for control message parsing.
pub type ControlResult<T> = Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        let err = SourceError::classify("someone", "User Not Found on the platform");
        assert!(matches!(err, SourceError::TargetNotFound { .. }));
        assert!(err.is_user_correctable());
    }

    #[test]
    fn test_classify_offline() {
        let err = SourceError::classify("someone", "The requested user isn't online (offline)");
        assert!(matches!(err, SourceError::TargetOffline { .. }));

        let err = SourceError::classify("someone", "host is not live");
        assert!(err.is_user_correctable());
    }

    #[test]
    fn test_classify_transient() {
        let err = SourceError::classify("someone", "connection reset by peer");
        assert!(matches!(err, SourceError::ConnectionFailed { .. }));
        assert!(!err.is_user_correctable());
    }

    #[test]
    fn test_transport_errors_are_transient() {
        let err: SourceError = TransportError::Timeout(Duration::from_secs(1)).into();
        assert!(!err.is_user_correctable());
    }
}
