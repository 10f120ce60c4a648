//! Line-delimited JSON control channel.
//!
//! Each line is one [`ControlMessage`]. Blank lines are skipped; malformed
//! lines and unknown actions are logged and skipped, so the caller only
//! ever sees valid messages.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{trace, warn};

use quizcast_core::ControlMessage;

/// Reads control messages from a line-oriented stream.
pub struct ControlReader<R> {
    lines: Lines<R>,
    skipped: u64,
}

impl ControlReader<BufReader<Stdin>> {
    /// Reads from the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> ControlReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            skipped: 0,
        }
    }

    /// Returns how many non-blank lines were rejected so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Returns the next valid message, or `None` at end of input.
    ///
    /// A read error ends the stream.
    pub async fn next_message(&mut self) -> Option<ControlMessage> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    warn!(error = %e, "Control channel read failed");
                    return None;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match ControlMessage::parse(&line) {
                Ok(msg) => {
                    trace!(action = msg.action(), "Control message received");
                    return Some(msg);
                }
                Err(e) => {
                    self.skipped += 1;
                    warn!(error = %e, line = %line, "Ignoring control message");
                }
            }
        }
    }
}
