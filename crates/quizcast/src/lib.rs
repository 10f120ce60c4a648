//! # quizcast
//!
//! Routes live-stream chat into a word-guessing game. Comments are compared
//! with the current round's answer; correct guesses, gifts, likes, follows
//! and session changes are forwarded to downstream notification sinks.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ChatEvent   ┌─────────────────────────────┐  Notification  ┌───────────┐
//! │ TikTok       │──────────────▶│ QuizRuntime                 │───────────────▶│ HTTP sink │
//! │ adapter      │               │  Router ─ AnswerMatcher     │                │ file sink │
//! │ (connector)  │◀── connect ───│  Supervisor (reconnects)    │                └───────────┘
//! └──────────────┘               └─────────────────────────────┘
//!                                         ▲ control (stdin JSON lines)
//! ```
//!
//! - **Core** ([`core`]): events, round context, matcher, traits
//! - **Runtime** ([`runtime`]): config, event loop, supervision, logging
//! - **Transport** ([`transport`]): WebSocket client, HTTP/file sinks, control reader
//! - **Adapter** ([`tiktok`]): connector frames and user schema mapping
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quizcast::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = QuizRuntime::load_config()?;
//!     runtime.register_source::<TikTokAdapter>()?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: `quizcast.toml` configuration files
//! - `full-transport` *(default)*: HTTP sink and WebSocket connector link
//! - `json-log`: JSON log output

pub use quizcast_adapter_tiktok as tiktok;
pub use quizcast_core as core;
pub use quizcast_runtime as runtime;
pub use quizcast_transport as transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use quizcast_adapter_tiktok::{TikTokAdapter, TikTokConfig, UserSchema};
    pub use quizcast_core::prelude::*;
    pub use quizcast_runtime::{QuizRuntime, QuizcastConfig, RuntimeError, RuntimeResult};

    pub use quizcast_runtime::prelude::*;
}
