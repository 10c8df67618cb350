//! Header field retrieval (HDR, with XHDR fallback)

use crate::commands::{self, HdrEntry};
use crate::error::{MirrorError, Result};
use crate::response::codes;
use tracing::{debug, trace};

use super::NntpClient;

impl NntpClient {
    /// Retrieve one header field for a range of articles in the selected group
    ///
    /// Sends `HDR field range` (RFC 3977 §8.5). Servers that predate RFC 3977
    /// answer 500; the client then repeats the request as `XHDR` (RFC 2980)
    /// and keeps using XHDR for the rest of the connection.
    ///
    /// Articles without the header may be omitted by the server. A range with
    /// no articles at all (423) yields an empty list.
    ///
    /// # Errors
    ///
    /// - [`MirrorError::NoGroupSelected`] - No newsgroup has been selected (412)
    /// - [`MirrorError::Protocol`] - Server returned an unexpected error
    /// - [`MirrorError::Timeout`] - Server did not respond in time
    pub async fn hdr(&mut self, field: &str, range: &str) -> Result<Vec<HdrEntry>> {
        trace!("Fetching HDR {}: {}", field, range);

        let cmd = if self.hdr_unsupported {
            commands::xhdr(field, range)
        } else {
            commands::hdr(field, range)
        };
        self.send_command(&cmd).await?;
        let mut response = self.read_multiline_response().await?;

        if response.code == codes::COMMAND_NOT_RECOGNIZED && !self.hdr_unsupported {
            debug!("Server does not recognize HDR, falling back to XHDR");
            self.hdr_unsupported = true;
            self.send_command(&commands::xhdr(field, range)).await?;
            response = self.read_multiline_response().await?;
        }

        match response.code {
            codes::NO_GROUP_SELECTED => Err(MirrorError::NoGroupSelected),
            codes::NO_SUCH_ARTICLE_NUMBER | codes::NO_CURRENT_ARTICLE => Ok(Vec::new()),
            codes::HEADERS_FOLLOW | codes::XHDR_FOLLOWS => commands::parse_hdr_response(response),
            _ => Err(MirrorError::Protocol {
                code: response.code,
                message: response.message,
            }),
        }
    }
}
