//! Session-level commands: DATE (RFC 3977 §7.1) and QUIT (§5.4)

use super::NntpClient;
use super::state::ConnectionState;
use crate::commands;
use crate::error::{MirrorError, Result};
use crate::response::codes;
use tracing::debug;

impl NntpClient {
    /// Request the server's date and time
    ///
    /// Returns the raw `yyyymmddhhmmss` timestamp. The session uses this as
    /// its liveness probe before reusing a connection.
    ///
    /// # Errors
    ///
    /// - [`MirrorError::Protocol`] - Server returned an unexpected status
    /// - [`MirrorError::Timeout`] - Server did not respond in time
    pub async fn date(&mut self) -> Result<String> {
        self.send_command(commands::date()).await?;
        let response = self.read_response().await?;

        if response.code != codes::SERVER_DATE {
            return Err(MirrorError::Protocol {
                code: response.code,
                message: response.message,
            });
        }

        let timestamp = response
            .message
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();

        debug!("Server date/time: {}", timestamp);
        Ok(timestamp)
    }

    /// Close the session with QUIT
    ///
    /// The connection counts as closed even if the server hangs up before
    /// acknowledging.
    pub async fn quit(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        debug!("Closing NNTP connection");

        self.state = ConnectionState::Closed;
        self.send_command(commands::quit()).await?;
        match self.read_response().await {
            Ok(_) | Err(MirrorError::ConnectionClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
