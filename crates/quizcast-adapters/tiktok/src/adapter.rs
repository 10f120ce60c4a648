//! TikTok Live adapter.
//!
//! The adapter attaches to a broadcast through a connector bridge: it opens a
//! WebSocket to the bridge, asks it to join the target's room, and maps the
//! relayed frames into [`ChatEvent`]s.
//!
//! ```text
//! adapter ──{"action":"connect","unique_id":"host"}──▶ connector
//! adapter ◀──{"type":"connect","room_id":"…"}───────── connector
//! adapter ◀──{"type":"comment",…} …──────────────────── connector
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let adapter = TikTokAdapter::from_config(TikTokConfig::default());
//! let mut session = adapter.connect("@some_streamer").await?;
//! while let Some(event) = session.events.recv().await { /* ... */ }
//! ```

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use quizcast_core::{
    ChatEvent, ConfigurableSource, LiveSource, SessionHandle, SourceError, SourceResult,
    SourceSession, clean_target,
};
use quizcast_transport::{WsClient, WsConnection, WsIncoming};

use crate::config::TikTokConfig;
use crate::model::{Frame, UserSchema};

/// The TikTok Live adapter.
#[derive(Debug, Clone, Default)]
pub struct TikTokAdapter {
    config: TikTokConfig,
    client: WsClient,
}

impl TikTokAdapter {
    /// Creates an adapter with the given configuration.
    pub fn new(config: TikTokConfig) -> Self {
        let client = WsClient::new().with_buffer(config.event_buffer);
        Self { config, client }
    }

    /// Returns the adapter configuration.
    pub fn config(&self) -> &TikTokConfig {
        &self.config
    }

    /// Waits for the connector's handshake answer.
    async fn handshake(&self, conn: &mut WsConnection, target: &str) -> SourceResult<Frame> {
        loop {
            match conn.recv().await {
                Some(WsIncoming::Text(text)) => match Frame::parse(&text) {
                    Ok(frame @ Frame::Connect { .. }) => return Ok(frame),
                    Ok(Frame::Error { message }) => {
                        return Err(SourceError::classify(
                            target,
                            message.as_deref().unwrap_or_default(),
                        ));
                    }
                    Ok(Frame::Unknown) => {
                        trace!(target = %target, "Ignoring frame before handshake");
                    }
                    Err(e) => {
                        warn!(
                            target = %target,
                            error = %e,
                            "Dropping connector frame before handshake"
                        );
                    }
                    Ok(other) => {
                        return Err(SourceError::protocol(format!(
                            "expected connect frame, got {:?}",
                            other
                        )));
                    }
                },
                Some(WsIncoming::Closed { reason }) => {
                    return Err(SourceError::ConnectionFailed {
                        target: target.to_string(),
                        reason,
                    });
                }
                None => {
                    return Err(SourceError::ConnectionFailed {
                        target: target.to_string(),
                        reason: "connector went away".to_string(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl LiveSource for TikTokAdapter {
    async fn connect(&self, target: &str) -> SourceResult<SourceSession> {
        let target = clean_target(target);
        if target.is_empty() {
            return Err(SourceError::TargetNotFound { target });
        }

        info!(target = %target, connector = %self.config.connector_url, "Connecting to live");
        let mut conn = self.client.connect(&self.config.connector_url).await?;
        conn.send_json(&json!({ "action": "connect", "unique_id": target }))
            .await?;

        let timeout = self.config.connect_timeout();
        let frame = match tokio::time::timeout(timeout, self.handshake(&mut conn, &target)).await {
            Ok(result) => result?,
            Err(_) => {
                conn.close();
                return Err(SourceError::ConnectionFailed {
                    target,
                    reason: format!("no answer from connector within {:?}", timeout),
                });
            }
        };
        let room_id = frame.room_id();
        info!(target = %target, room_id = ?room_id, "Connected to live");

        let (events_tx, events_rx) = mpsc::channel(self.config.event_buffer.max(1));
        let (handle, shutdown_rx) = SessionHandle::new();

        // The receiver has capacity for this first event.
        let _ = events_tx
            .send(ChatEvent::Connected {
                target: target.clone(),
                room_id: room_id.clone(),
            })
            .await;

        tokio::spawn(pump(
            conn,
            events_tx,
            shutdown_rx,
            self.config.user_schema,
            target.clone(),
        ));

        Ok(SourceSession {
            target,
            room_id,
            events: events_rx,
            handle,
        })
    }
}

impl ConfigurableSource for TikTokAdapter {
    type Config = TikTokConfig;

    fn name() -> &'static str {
        "tiktok"
    }

    fn from_config(config: Self::Config) -> Self {
        Self::new(config)
    }
}

/// Relays connector frames into the session's event queue until the
/// connection ends, a terminal frame arrives, or the handle is closed.
async fn pump(
    mut conn: WsConnection,
    events: mpsc::Sender<ChatEvent>,
    mut shutdown: watch::Receiver<bool>,
    schema: UserSchema,
    target: String,
) {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!(target = %target, "Session closed by handle");
                    conn.close();
                    break;
                }
            }

            incoming = conn.recv() => {
                let event = match incoming {
                    Some(WsIncoming::Text(text)) => match Frame::parse(&text) {
                        Ok(frame) => frame.into_event(schema, &text),
                        Err(e) => {
                            warn!(target = %target, error = %e, "Dropping connector frame");
                            None
                        }
                    },
                    Some(WsIncoming::Closed { reason }) => Some(ChatEvent::Disconnected { reason }),
                    None => Some(ChatEvent::Disconnected {
                        reason: "connector went away".to_string(),
                    }),
                };
                let Some(event) = event else {
                    continue;
                };
                let terminal = matches!(
                    event,
                    ChatEvent::Disconnected { .. } | ChatEvent::LiveEnded
                );
                trace!(target = %target, event = event.event_name(), "Relaying event");
                if events.send(event).await.is_err() || terminal {
                    conn.close();
                    break;
                }
            }
        }
    }
}
