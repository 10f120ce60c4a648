//! # quizcast transport
//!
//! I/O implementations used by the quizcast runtime and adapters.
//!
//! ## Features
//!
//! - `ws-client`: WebSocket client used to reach a connector bridge
//! - `http-client`: HTTP notification sink
//! - `full`: All of the above
//!
//! The JSON-lines file sink and the control channel reader are always
//! available.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  quizcast-runtime   │  (router, supervisor)
//! ├─────────────────────┤
//! │  quizcast-core      │  (Notifier / LiveSource traits)
//! ├─────────────────────┤
//! │  quizcast-transport │  <- This crate (implementations)
//! ├─────────────────────┤
//! │  Network / files    │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quizcast_transport::http::HttpNotifier;
//! use quizcast_core::{Notification, Notifier};
//!
//! let sink = HttpNotifier::new("http://localhost:3002/tiktok-live-event", Duration::from_secs(5))?;
//! sink.notify(&Notification::live_ended()).await?;
//! ```

pub mod control;
pub mod file;

#[cfg(feature = "http-client")]
pub mod http;

#[cfg(feature = "ws-client")]
pub mod websocket;

pub use control::ControlReader;
pub use file::FileNotifier;

#[cfg(feature = "http-client")]
pub use http::HttpNotifier;

#[cfg(feature = "ws-client")]
pub use websocket::{WsClient, WsConnection, WsIncoming};
