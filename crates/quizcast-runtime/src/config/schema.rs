//! Configuration schema definitions.
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [session]
//! target = "some_streamer"
//! auto_start = true
//!
//! [notifier]
//! timeout_ms = 5000
//! [notifier.http]
//! url = "http://localhost:3002/tiktok-live-event"
//! [notifier.file]
//! enabled = true
//! path = "live_events.jsonl"
//!
//! [reconnect]
//! max_attempts = 5
//! step_secs = 5
//! max_delay_secs = 30
//!
//! [matching]
//! word_overlap_threshold = 0.7
//! tiers = ["exact", "substring", "word_overlap"]
//!
//! [adapters.tiktok]
//! connector_url = "ws://127.0.0.1:8765/live"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use quizcast_core::MatchConfig;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QuizcastConfig {
    /// Logging settings.
    pub logging: LoggingConfig,

    /// Which broadcast to attach to and when.
    pub session: SessionConfig,

    /// Downstream notification sinks.
    pub notifier: NotifierConfig,

    /// Automatic reconnect policy.
    pub reconnect: ReconnectConfig,

    /// Answer matching.
    pub matching: MatchConfig,

    /// Persisted state file.
    pub state: StateConfig,

    /// Control channel.
    pub control: ControlConfig,

    /// Adapter sections, keyed by adapter name.
    pub adapters: HashMap<String, figment::value::Value>,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a [`tracing::Level`].
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// File rotation for [`LogOutput::File`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events to log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level. `RUST_LOG` takes precedence when set.
    pub level: LogLevel,
    /// Line format.
    pub format: LogFormat,
    /// Destination.
    pub output: LogOutput,
    /// Span events to log.
    pub span_events: SpanEventConfig,
    /// Include thread ids.
    pub thread_ids: bool,
    /// Include file and line.
    pub file_location: bool,
    /// Log file path for [`LogOutput::File`].
    pub file_path: Option<PathBuf>,
    /// Rotation for file output.
    pub rotation: LogRotation,
    /// Per-module levels, e.g. `quizcast_transport = "debug"`.
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            rotation: LogRotation::Never,
            filters: HashMap::new(),
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Session startup settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Target to use instead of the persisted one.
    pub target: Option<String>,

    /// Connect as soon as the runtime starts.
    pub auto_start: bool,

    /// Stop the runtime if the startup connection fails.
    pub exit_on_connect_failure: bool,
}

// =============================================================================
// Notifier
// =============================================================================

/// Notification sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Per-sink delivery timeout in milliseconds.
    pub timeout_ms: u64,
    /// HTTP sink.
    pub http: HttpSinkConfig,
    /// JSON-lines file sink.
    pub file: FileSinkConfig,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            http: HttpSinkConfig::default(),
            file: FileSinkConfig::default(),
        }
    }
}

impl NotifierConfig {
    /// Returns the delivery timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// HTTP sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSinkConfig {
    pub enabled: bool,
    pub url: String,
}

impl Default for HttpSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://localhost:3002/tiktok-live-event".to_string(),
        }
    }
}

/// File sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSinkConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("live_events.jsonl"),
        }
    }
}

// =============================================================================
// Reconnect / State / Control
// =============================================================================

/// Reconnect policy: `delay(n) = min(max_delay, step * n)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Attempts before giving up.
    pub max_attempts: u32,
    /// Linear backoff step in seconds.
    pub step_secs: u64,
    /// Backoff cap in seconds.
    pub max_delay_secs: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            step_secs: 5,
            max_delay_secs: 30,
        }
    }
}

/// Persisted state location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("quizcast_state.json"),
        }
    }
}

/// Control channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Read control messages from standard input.
    pub stdin: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self { stdin: true }
    }
}
