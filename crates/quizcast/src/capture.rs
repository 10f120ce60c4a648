//! Capture mode: records the raw user objects behind the first comments of
//! a broadcast, with every avatar URL found in them. Useful when the
//! connector's user layout changes.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::{info, warn};

use quizcast_adapter_tiktok::{UserInspection, UserSchema, raw_comment_user};
use quizcast_core::{ChatEvent, CommentEvent, LiveSource};

/// One captured comment.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedComment {
    /// Unix epoch seconds.
    pub timestamp: i64,
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub readable_timestamp: String,
    pub streamer: String,
    pub event_type: &'static str,
    pub comment: String,
    pub user: UserInspection,
}

impl CapturedComment {
    fn new(streamer: &str, comment: &CommentEvent, schema: UserSchema) -> Self {
        let raw_user = comment
            .raw
            .as_deref()
            .and_then(raw_comment_user)
            .unwrap_or(Value::Null);
        Self {
            timestamp: comment.received_at.unix_timestamp(),
            readable_timestamp: readable(comment.received_at),
            streamer: streamer.to_string(),
            event_type: "comment",
            comment: comment.text.clone(),
            user: UserInspection::new(schema, &raw_user),
        }
    }
}

/// The report written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    pub streamer: String,
    pub captured_at: String,
    pub requested: usize,
    pub comments: Vec<CapturedComment>,
}

/// Attaches to `target` and collects up to `count` comments.
///
/// Stops early when the session ends or `stop` completes; whatever was
/// captured so far is returned.
pub async fn capture_comments<F>(
    source: &dyn LiveSource,
    schema: UserSchema,
    target: &str,
    count: usize,
    stop: F,
) -> Result<CaptureReport>
where
    F: Future<Output = ()>,
{
    let mut session = source.connect(target).await?;
    info!(target = %session.target, count, "Capturing comments");

    let mut comments = Vec::with_capacity(count);
    tokio::pin!(stop);
    while comments.len() < count {
        let event = tokio::select! {
            biased;
            _ = &mut stop => {
                warn!(captured = comments.len(), "Capture interrupted");
                break;
            }
            event = session.events.recv() => event,
        };
        match event {
            Some(ChatEvent::Comment(comment)) => {
                let captured = CapturedComment::new(&session.target, &comment, schema);
                info!(
                    n = comments.len() + 1,
                    user = %captured.user.resolved.display_name,
                    avatars = captured.user.avatar_candidates.len(),
                    "Captured comment"
                );
                comments.push(captured);
            }
            Some(ChatEvent::Disconnected { reason }) => {
                warn!(reason = %reason, "Session dropped during capture");
                break;
            }
            Some(ChatEvent::LiveEnded) | None => break,
            Some(_) => {}
        }
    }
    session.handle.close();

    Ok(CaptureReport {
        streamer: session.target,
        captured_at: readable(OffsetDateTime::now_utc()),
        requested: count,
        comments,
    })
}

/// Default report path: `capture_<target>_<unix>.json`.
pub fn default_output(target: &str) -> PathBuf {
    PathBuf::from(format!(
        "capture_{}_{}.json",
        target,
        OffsetDateTime::now_utc().unix_timestamp()
    ))
}

/// Writes `report` as pretty JSON.
pub async fn write_report(report: &CaptureReport, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(report)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write capture report to {}", path.display()))?;
    info!(path = %path.display(), comments = report.comments.len(), "Capture report written");
    Ok(())
}

fn readable(at: OffsetDateTime) -> String {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    at.to_offset(offset)
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}
