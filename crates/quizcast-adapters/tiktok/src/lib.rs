//! # quizcast adapter for TikTok Live
//!
//! This crate connects quizcast to TikTok Live broadcasts through a
//! connector bridge: an external process that owns the platform client and
//! relays its events as JSON frames over a WebSocket.
//!
//! ## Overview
//!
//! The adapter handles:
//!
//! - The connect handshake and failure classification (offline / not found
//!   / transient)
//! - Frame parsing into [`ChatEvent`](quizcast_core::ChatEvent)s
//! - Versioned user object mapping and avatar URL resolution
//! - Gift streak detection
//!
//! ## Quick Start
//!
//! ```rust,ignore
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

mod adapter;
pub mod config;
pub mod model;

pub use adapter::TikTokAdapter;
pub use config::TikTokConfig;
pub use model::frame::raw_comment_user;
pub use model::{AvatarCandidate, Frame, GiftFrame, UserInspection, UserSchema};
