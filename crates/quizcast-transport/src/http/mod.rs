//! HTTP transport.
//!
//! This module provides the HTTP notification sink.

mod client;
pub use client::HttpNotifier;
