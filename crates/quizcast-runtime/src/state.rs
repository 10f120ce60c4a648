//! Persisted session state.
//!
//! The last-used target survives restarts in a small JSON file:
//!
//! ```json
//! { "streamer_username": "some_streamer" }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StateError, StateResult};

/// State kept across restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Last target the operator connected to.
    #[serde(default)]
    pub streamer_username: Option<String>,
}

/// Reads and writes [`PersistedState`] at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state. A missing file yields the default state.
    pub async fn load(&self) -> StateResult<PersistedState> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No state file, starting fresh");
                return Ok(PersistedState::default());
            }
            Err(source) => {
                return Err(StateError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StateError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the state, creating parent directories as needed.
    pub async fn save(&self, state: &PersistedState) -> StateResult<()> {
        let io_err = |source| StateError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(state).map_err(|source| StateError::Parse {
            path: self.path.clone(),
            source,
        })?;
        tokio::fs::write(&self.path, json).await.map_err(io_err)?;

        info!(
            path = %self.path.display(),
            target = ?state.streamer_username,
            "Saved session state"
        );
        Ok(())
    }

    /// Stores `target` as the last-used target.
    pub async fn remember_target(&self, target: &str) -> StateResult<()> {
        self.save(&PersistedState {
            streamer_username: Some(target.to_string()),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().await.unwrap(), PersistedState::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"));
        store.remember_target("host").await.unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.streamer_username.as_deref(), Some("host"));

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"streamer_username\": \"host\""));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = StateStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StateError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_null_username_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"streamer_username": null}"#).unwrap();

        let state = StateStore::new(&path).load().await.unwrap();
        assert!(state.streamer_username.is_none());
    }
}
