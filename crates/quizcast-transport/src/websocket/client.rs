//! WebSocket client.
//!
//! [`WsClient::connect`] performs the handshake and spawns a background loop
//! that owns the socket. The returned [`WsConnection`] talks to that loop
//! through channels: text frames go out through an mpsc sender, received
//! frames come back as [`WsIncoming`] values, and a watch channel stops the
//! loop. The client does not reconnect; reconnect policy belongs to the
//! caller.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::{Error, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use quizcast_core::{TransportError, TransportResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

const DEFAULT_BUFFER: usize = 256;

/// Something received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsIncoming {
    /// A text frame (binary frames are decoded lossily).
    Text(String),
    /// The connection ended. No further items follow.
    Closed {
        /// Why the connection ended.
        reason: String,
    },
}

/// An open WebSocket connection.
#[derive(Debug)]
pub struct WsConnection {
    url: String,
    outgoing: mpsc::Sender<String>,
    incoming: mpsc::Receiver<WsIncoming>,
    shutdown: watch::Sender<bool>,
}

impl WsConnection {
    /// Returns the URL this connection was opened against.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Queues a text frame.
    pub async fn send_text(&self, text: impl Into<String>) -> TransportResult<()> {
        self.outgoing
            .send(text.into())
            .await
            .map_err(|_| TransportError::ConnectionClosed {
                reason: "client loop stopped".into(),
            })
    }

    /// Serializes `value` and queues it as a text frame.
    pub async fn send_json(&self, value: &serde_json::Value) -> TransportResult<()> {
        let text =
            serde_json::to_string(value).map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.send_text(text).await
    }

    /// Waits for the next incoming item. Returns `None` once the loop has
    /// stopped and every buffered item has been read.
    pub async fn recv(&mut self) -> Option<WsIncoming> {
        self.incoming.recv().await
    }

    /// Closes the connection. Idempotent.
    pub fn close(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.close();
    }
}

/// WebSocket client.
#[derive(Debug, Clone)]
pub struct WsClient {
    buffer: usize,
}

impl WsClient {
    /// Creates a client with the default channel capacity.
    pub fn new() -> Self {
        Self {
            buffer: DEFAULT_BUFFER,
        }
    }

    /// Sets the capacity of the incoming and outgoing channels.
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    /// Connects to `url` and spawns the connection loop.
    pub async fn connect(&self, url: &str) -> TransportResult<WsConnection> {
        info!(url = %url, "Connecting to WebSocket server");

        let (ws_stream, _response) =
            connect_async(url)
                .await
                .map_err(|e| TransportError::ConnectionFailed {
                    url: url.to_string(),
                    reason: format!("WebSocket connection failed: {}", e),
                })?;

        info!(url = %url, "WebSocket client connected");

        let (outgoing_tx, outgoing_rx) = mpsc::channel::<String>(self.buffer);
        let (incoming_tx, incoming_rx) = mpsc::channel::<WsIncoming>(self.buffer);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let state = ClientLoopState::new(url.to_string(), ws_stream, incoming_tx);
        tokio::spawn(state.run(outgoing_rx, shutdown_rx));

        Ok(WsConnection {
            url: url.to_string(),
            outgoing: outgoing_tx,
            incoming: incoming_rx,
            shutdown: shutdown_tx,
        })
    }
}

impl Default for WsClient {
    fn default() -> Self {
        Self::new()
    }
}

/// State owned by the background connection loop.
struct ClientLoopState {
    url: String,
    ws_tx: WsSink,
    ws_rx: WsSource,
    incoming: mpsc::Sender<WsIncoming>,
}

impl ClientLoopState {
    fn new(url: String, ws_stream: WsStream, incoming: mpsc::Sender<WsIncoming>) -> Self {
        let (ws_tx, ws_rx) = ws_stream.split();
        Self {
            url,
            ws_tx,
            ws_rx,
            incoming,
        }
    }

    async fn run(
        mut self,
        mut outgoing: mpsc::Receiver<String>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!(url = %self.url, "WebSocket client shutting down");
                        let _ = self.ws_tx.close().await;
                        self.finish("closed by client").await;
                        break;
                    }
                }

                Some(text) = outgoing.recv() => {
                    if let Err(e) = self.ws_tx.send(Message::Text(text.into())).await {
                        warn!(url = %self.url, error = %e, "Failed to send message");
                    }
                }

                msg = self.ws_rx.next() => {
                    if !self.handle_message(msg).await {
                        break;
                    }
                }
            }
        }
    }

    /// Handles one item from the socket.
    /// Returns true if the loop should continue.
    async fn handle_message(&mut self, msg: Option<Result<Message, Error>>) -> bool {
        match msg {
            Some(Ok(Message::Text(text))) => {
                trace!(url = %self.url, len = text.len(), "Received text");
                self.forward(WsIncoming::Text(text.to_string())).await
            }
            Some(Ok(Message::Binary(data))) => {
                trace!(url = %self.url, len = data.len(), "Received binary");
                self.forward(WsIncoming::Text(String::from_utf8_lossy(&data).into_owned()))
                    .await
            }
            Some(Ok(Message::Ping(data))) => {
                trace!(url = %self.url, "Received ping, sending pong");
                let _ = self.ws_tx.send(Message::Pong(data)).await;
                true
            }
            Some(Ok(Message::Pong(_))) => true,
            Some(Ok(Message::Close(frame))) => {
                let reason = frame
                    .map(|f| f.reason.to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "closed by server".to_string());
                info!(url = %self.url, reason = %reason, "Server closed connection");
                self.finish(&reason).await;
                false
            }
            Some(Ok(Message::Frame(_))) => true,
            Some(Err(e)) => {
                warn!(url = %self.url, error = %e, "WebSocket error");
                self.finish(&e.to_string()).await;
                false
            }
            None => {
                info!(url = %self.url, "WebSocket stream ended");
                self.finish("stream ended").await;
                false
            }
        }
    }

    /// Returns false when the consumer has gone away.
    async fn forward(&self, item: WsIncoming) -> bool {
        self.incoming.send(item).await.is_ok()
    }

    async fn finish(&self, reason: &str) {
        let _ = self
            .incoming
            .send(WsIncoming::Closed {
                reason: reason.to_string(),
            })
            .await;
    }
}
