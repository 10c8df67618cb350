use crate::error::{MirrorError, Result};
use crate::{NntpClient, codes, commands};
use tracing::debug;

impl NntpClient {
    /// Select a newsgroup
    ///
    /// Returns [`GroupInfo`](crate::commands::GroupInfo) with article count and range.
    ///
    /// # Errors
    ///
    /// - [`MirrorError::GroupNotFound`] - The server does not carry the group (411)
    /// - [`MirrorError::Protocol`] - Server returned an unexpected error
    /// - [`MirrorError::InvalidResponse`] - Could not parse the server response
    pub async fn select_group(&mut self, newsgroup: &str) -> Result<commands::GroupInfo> {
        debug!("Selecting newsgroup: {}", newsgroup);

        self.send_command(&commands::group(newsgroup)).await?;
        let response = self.read_response().await?;

        if response.code == codes::NO_SUCH_GROUP {
            return Err(MirrorError::GroupNotFound(newsgroup.to_string()));
        }

        let info = commands::parse_group_response(response)?;
        self.current_group = Some(newsgroup.to_string());

        debug!(
            "Group {} selected: {} articles ({}-{})",
            newsgroup, info.count, info.first, info.last
        );
        Ok(info)
    }
}
