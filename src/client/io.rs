//! Low-level I/O: command transmission and response reading
//!
//! Single-line responses are read with a 60 second timeout, multi-line
//! responses with 180 seconds. Garbage on the wire marks the connection
//! broken so the session replaces it before the next operation.

use super::NntpClient;
use crate::commands;
use crate::error::{MirrorError, Result};
use crate::response::NntpResponse;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tracing::trace;

const SINGLE_LINE_TIMEOUT: Duration = Duration::from_secs(60);
const MULTILINE_TIMEOUT: Duration = Duration::from_secs(180);

/// Strip NNTP dot-stuffing from a line (leading ".." becomes ".").
fn strip_dot_stuffing(line: &str) -> &str {
    if line.starts_with("..") {
        &line[1..]
    } else {
        line
    }
}

impl NntpClient {
    /// Send a command to the server
    pub(super) async fn send_command(&mut self, command: &str) -> Result<()> {
        trace!("Sending command: {}", command.trim());
        let result = async {
            self.stream.get_mut().write_all(command.as_bytes()).await?;
            self.stream.get_mut().flush().await
        }
        .await;

        if result.is_err() {
            self.mark_broken();
        }
        Ok(result?)
    }

    /// Read one CRLF-terminated line, lossily decoded, without the terminator
    async fn read_line(&mut self) -> Result<String> {
        let mut line_bytes = Vec::with_capacity(512);
        self.stream.read_until(b'\n', &mut line_bytes).await?;

        if line_bytes.is_empty() {
            return Err(MirrorError::ConnectionClosed);
        }

        let line = String::from_utf8_lossy(&line_bytes);
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read a single-line response
    pub(super) async fn read_response(&mut self) -> Result<NntpResponse> {
        let result = timeout(SINGLE_LINE_TIMEOUT, async {
            let line = self.read_line().await?;
            trace!("Received: {}", line);
            commands::parse_single_response(&line)
        })
        .await
        .map_err(|_| MirrorError::Timeout)
        .and_then(|inner| inner);

        self.note_failure(&result);
        result
    }

    /// Read a multi-line response (ending with ".\r\n")
    ///
    /// Error statuses (4xx/5xx) carry no body and return immediately.
    pub(super) async fn read_multiline_response(&mut self) -> Result<NntpResponse> {
        let result = timeout(MULTILINE_TIMEOUT, async {
            let first_line = self.read_line().await?;
            trace!("Received: {}", first_line);

            let (code, message) = commands::parse_response_line(&first_line)?;
            if code >= 400 {
                return Ok(NntpResponse {
                    code,
                    message,
                    lines: vec![],
                });
            }

            let mut lines = Vec::with_capacity(64);
            loop {
                let line = self.read_line().await?;
                if line == "." {
                    break;
                }
                lines.push(strip_dot_stuffing(&line).to_string());
            }
            trace!("Received {} body lines", lines.len());

            Ok(NntpResponse {
                code,
                message,
                lines,
            })
        })
        .await
        .map_err(|_| MirrorError::Timeout)
        .and_then(|inner| inner);

        self.note_failure(&result);
        result
    }

    /// A connection that timed out or produced garbage cannot be trusted
    /// to be in sync with the server any more.
    fn note_failure(&mut self, result: &Result<NntpResponse>) {
        if let Err(e) = result
            && e.is_connection_error()
        {
            self.mark_broken();
        }
    }
}
