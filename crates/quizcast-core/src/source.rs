//! Upstream live sources.
//!
//! A [`LiveSource`] attaches to a broadcast and yields a [`SourceSession`]:
//! a room id, an ordered receiver of [`ChatEvent`]s and a [`SessionHandle`]
//! that closes the session. The first event on a fresh session is always
//! [`ChatEvent::Connected`]; the stream ends after a
//! [`ChatEvent::Disconnected`] or [`ChatEvent::LiveEnded`], or when the
//! handle is closed.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut session = source.connect("some_streamer").await?;
//! while let Some(event) = session.events.recv().await {
//!     println!("{}", event.event_name());
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::error::SourceResult;
use crate::event::ChatEvent;

// =============================================================================
// LiveSource Trait
// =============================================================================

/// An upstream that produces chat events for a target broadcast.
#[async_trait]
pub trait LiveSource: Send + Sync {
    /// Attaches to `target`'s broadcast.
    ///
    /// Fails with a user-correctable [`SourceError`](crate::SourceError) when
    /// the target is offline or does not exist.
    async fn connect(&self, target: &str) -> SourceResult<SourceSession>;
}

/// A shared live source trait object.
pub type BoxedSource = Arc<dyn LiveSource>;

/// Trait for sources that can be created from configuration.
///
/// Separates compile-time concerns (`Config` type, `from_config()`)
/// from the object-safe [`LiveSource`] trait.
pub trait ConfigurableSource: LiveSource {
    /// The configuration type, deserialized from `[adapters.<name>]`.
    type Config: serde::de::DeserializeOwned + Default;

    /// Returns the adapter name used as the config key.
    fn name() -> &'static str
    where
        Self: Sized;

    /// Creates a source from its deserialized configuration.
    fn from_config(config: Self::Config) -> Self
    where
        Self: Sized;
}

/// Strips whitespace and a leading `@` from a target handle.
///
/// ```rust
/// assert_eq!(quizcast_core::source::clean_target("  @host "), "host");
/// ```
pub fn clean_target(target: &str) -> String {
    target.trim().trim_start_matches('@').trim().to_string()
}

// =============================================================================
// Session
// =============================================================================

/// An attached upstream session.
#[derive(Debug)]
pub struct SourceSession {
    /// The target this session is attached to.
    pub target: String,
    /// Platform room identifier, if the upstream reported one.
    pub room_id: Option<String>,
    /// Ordered event stream.
    pub events: mpsc::Receiver<ChatEvent>,
    /// Close handle.
    pub handle: SessionHandle,
}

/// Handle used to close a session from outside its event pump.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    shutdown: Arc<watch::Sender<bool>>,
}

impl SessionHandle {
    /// Creates a handle and the receiver the event pump should watch.
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                shutdown: Arc::new(tx),
            },
            rx,
        )
    }

    /// Asks the session to close. Idempotent.
    pub fn close(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_target() {
        assert_eq!(clean_target("@streamer"), "streamer");
        assert_eq!(clean_target("streamer"), "streamer");
        assert_eq!(clean_target(" @ "), "");
    }

    #[tokio::test]
    async fn test_handle_close_signals_pump() {
        let (handle, mut rx) = SessionHandle::new();
        assert!(!handle.is_closed());

        let clone = handle.clone();
        clone.close();
        clone.close();

        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert!(handle.is_closed());
    }
}
