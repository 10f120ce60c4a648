//! quizcast runtime: the orchestration layer.
//!
//! This crate provides:
//! - Configuration loading and validation ([`config`])
//! - The single-writer event loop ([`QuizRuntime`])
//! - Reconnect supervision ([`Supervisor`])
//! - Event routing against the current round ([`Router`])
//! - Persisted session state ([`StateStore`])
//! - Logging setup ([`logging`])
//!
//! # Transport Features
//!
//! Notification sinks are compiled in according to cargo features:
//!
//! - `http-client`: HTTP POST sink
//! - `ws-client`: WebSocket client used by connector-based adapters
//! - `full-transport`: both
//!
//! The JSON-lines file sink is always available.
//!
//! ```ignore
//! use quizcast_adapter_tiktok::TikTokAdapter;
//! use quizcast_runtime::QuizRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = QuizRuntime::load_config()?;
//!     runtime.register_source::<TikTokAdapter>()?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod router;
pub mod runtime;
pub mod state;
pub mod status;
pub mod supervisor;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, Profile, QuizcastConfig};
pub use error::{RuntimeError, RuntimeResult, StateError, StateResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use router::Router;
pub use runtime::{ControlSender, QuizRuntime, RuntimeBuilder, build_notifiers, build_source};
pub use state::{PersistedState, StateStore};
pub use status::{SessionStatus, StatusHandle};
pub use supervisor::{Decision, ReconnectPolicy, Supervisor, SupervisorState};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
