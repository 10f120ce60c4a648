//! Configuration types for the TikTok adapter.
//!
//! Loaded from the `[adapters.tiktok]` section of `quizcast.toml`.
//!
//! # Example Configuration
//!
//! ```toml
//! [adapters.tiktok]
//! # Connector bridge that owns the platform client
//! connector_url = "ws://127.0.0.1:8765/live"
//! connect_timeout_ms = 15000
//! # Shape of user objects sent by the connector: "v1" or "legacy"
//! user_schema = "v1"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::UserSchema;

/// TikTok adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TikTokConfig {
    /// WebSocket URL of the connector bridge.
    pub connector_url: String,

    /// How long to wait for the connector to confirm a session.
    pub connect_timeout_ms: u64,

    /// Which user object layout the connector sends.
    pub user_schema: UserSchema,

    /// Capacity of the per-session event queue.
    pub event_buffer: usize,
}

impl Default for TikTokConfig {
    fn default() -> Self {
        Self {
            connector_url: "ws://127.0.0.1:8765/live".to_string(),
            connect_timeout_ms: 15_000,
            user_schema: UserSchema::default(),
            event_buffer: 256,
        }
    }
}

impl TikTokConfig {
    /// Returns the connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
