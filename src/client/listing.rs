//! Newsgroup listing (RFC 3977 Section 7.6.3)

use super::NntpClient;
use crate::commands;
use crate::error::{MirrorError, Result};
use crate::response::codes;
use tracing::debug;

impl NntpClient {
    /// List active newsgroups matching a wildmat pattern (`*` for all)
    ///
    /// # Errors
    ///
    /// - [`MirrorError::Protocol`] - Server returned an unexpected error
    /// - [`MirrorError::Timeout`] - Server did not respond in time
    pub async fn list_active(&mut self, wildmat: &str) -> Result<Vec<commands::ActiveGroup>> {
        debug!("Listing active groups matching: {}", wildmat);

        self.send_command(&commands::list_active(wildmat)).await?;
        let response = self.read_multiline_response().await?;

        if response.code != codes::LIST_INFORMATION_FOLLOWS {
            return Err(MirrorError::Protocol {
                code: response.code,
                message: response.message,
            });
        }

        let groups = commands::parse_list_active_response(response)?;
        debug!("Retrieved {} active groups", groups.len());
        Ok(groups)
    }
}
