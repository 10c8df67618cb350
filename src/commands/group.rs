//! Group selection

use crate::error::{MirrorError, Result};
use crate::range::ArticleRange;
use crate::response::NntpResponse;

/// Build GROUP command
pub fn group(newsgroup: &str) -> String {
    format!("GROUP {}\r\n", newsgroup)
}

/// Group information returned by the GROUP command
///
/// Contains article count and range information for a newsgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupInfo {
    /// Estimated number of articles in the group
    pub count: u64,
    /// Number of the first article
    pub first: u64,
    /// Number of the last article
    pub last: u64,
}

impl GroupInfo {
    /// The article bounds the server currently reports
    ///
    /// Passed through unchanged. RFC 3977 lets an empty group answer with
    /// `last = first - 1`, which keeps the low-water mark in `min` while
    /// the range itself is empty.
    pub fn range(&self) -> ArticleRange {
        ArticleRange::new(self.first, self.last)
    }
}

/// Parse GROUP response to extract article count and range
///
/// Response format: "211 count first last group-name"
pub fn parse_group_response(response: NntpResponse) -> Result<GroupInfo> {
    if !response.is_success() {
        return Err(MirrorError::Protocol {
            code: response.code,
            message: response.message,
        });
    }

    let parts: Vec<&str> = response.message.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(MirrorError::InvalidResponse(response.message));
    }

    let count = parts[0]
        .parse()
        .map_err(|_| MirrorError::InvalidResponse(response.message.clone()))?;
    let first = parts[1]
        .parse()
        .map_err(|_| MirrorError::InvalidResponse(response.message.clone()))?;
    let last = parts[2]
        .parse()
        .map_err(|_| MirrorError::InvalidResponse(response.message.clone()))?;

    Ok(GroupInfo { count, first, last })
}
