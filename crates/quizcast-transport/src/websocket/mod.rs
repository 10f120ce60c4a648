//! WebSocket transport.
//!
//! This module provides the WebSocket client used to talk to connector
//! bridges.

mod client;
pub use client::{WsClient, WsConnection, WsIncoming};
