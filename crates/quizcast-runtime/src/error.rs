//! Runtime error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use quizcast_core::{SourceError, TransportError};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Adapter configuration deserialization failed.
    #[error("Failed to deserialize adapter config: {0}")]
    AdapterConfigDeserialize(String),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connecting to the live source failed.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Persisted state could not be read or written.
    #[error(transparent)]
    State(#[from] StateError),

    /// A notification sink could not be built.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// `run` was called before any source was registered.
    #[error("No live source registered")]
    NoSource,
}

impl RuntimeError {
    /// Returns true if the failure is fixed by changing the target, not by
    /// retrying.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Source(e) if e.is_user_correctable())
    }
}

/// Errors reading or writing the persisted state file.
#[derive(Error, Debug)]
pub enum StateError {
    /// Filesystem access failed.
    #[error("State file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not valid state JSON.
    #[error("State file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_correctable() {
        let err = RuntimeError::from(SourceError::TargetOffline {
            target: "host".into(),
        });
        assert!(err.is_user_correctable());
        assert!(!RuntimeError::NoSource.is_user_correctable());
    }
}
