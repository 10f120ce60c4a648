//! HTTP notification sink.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, info};

use quizcast_core::{Notification, Notifier, NotifyError, NotifyResult, TransportError};

/// Posts each notification as a JSON body to a fixed endpoint.
///
/// The request timeout bounds the whole exchange; a non-success status is
/// reported as [`NotifyError::Status`].
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpNotifier {
    /// Creates a sink posting to `url`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;
        let url = url.into();
        info!(url = %url, timeout = ?timeout, "HTTP notifier ready");
        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    /// Returns the endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout(self.timeout)
                } else {
                    NotifyError::Request(e.to_string())
                }
            })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(event = %notification.event, url = %self.url, "Event posted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one request with `status_line` and returns the raw request.
    async fn one_shot_server(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!("{status_line}\r\nContent-Length: 4\r\nConnection: close\r\n\r\nnope");
            stream.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{}/tiktok-live-event", addr), task)
    }

    #[tokio::test]
    async fn test_posts_json_envelope() {
        let (url, server) = one_shot_server("HTTP/1.1 200 OK").await;
        let sink = HttpNotifier::new(url, Duration::from_secs(5)).unwrap();

        sink.notify(&Notification::live_ended()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /tiktok-live-event"));
        assert!(request.contains(r#""event":"live_end""#));
        assert!(request.contains(r#""reason":"live_ended""#));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let (url, _server) = one_shot_server("HTTP/1.1 500 Internal Server Error").await;
        let sink = HttpNotifier::new(url, Duration::from_secs(5)).unwrap();

        let err = sink.notify(&Notification::live_ended()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sink =
            HttpNotifier::new(format!("http://{}/x", addr), Duration::from_secs(2)).unwrap();
        let err = sink.notify(&Notification::live_ended()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Request(_) | NotifyError::Timeout(_)));
    }
}
