//! HDR / XHDR commands for header field retrieval

use crate::error::{MirrorError, Result};
use crate::response::NntpResponse;

/// Build HDR command (RFC 3977 §8.5)
///
/// Format: HDR header-name range
pub fn hdr(header: &str, range: &str) -> String {
    format!("HDR {} {}\r\n", header, range)
}

/// Build XHDR command (RFC 2980 §2.6)
///
/// Pre-RFC 3977 spelling of HDR. Same response body, status code 221.
pub fn xhdr(header: &str, range: &str) -> String {
    format!("XHDR {} {}\r\n", header, range)
}

/// HDR entry containing article number and header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdrEntry {
    /// Article number within the newsgroup
    pub article_number: u64,
    /// Header field value for this article
    pub value: String,
}

/// Parse HDR/XHDR response line into HdrEntry
///
/// Format: "article-number header-value". Values may contain spaces, so
/// everything after the first space is the value. A line holding only the
/// article number means the header is absent and yields an empty value.
///
/// # Examples
///
/// ```
/// # use nntp_mirror::commands::parse_hdr_line;
/// let entry = parse_hdr_line("12345 Re: Test Subject").unwrap();
/// assert_eq!(entry.article_number, 12345);
/// assert_eq!(entry.value, "Re: Test Subject");
/// ```
pub fn parse_hdr_line(line: &str) -> Result<HdrEntry> {
    let mut parts = line.splitn(2, [' ', '\t']);
    let number = parts.next().unwrap_or_default();

    let article_number = number
        .parse()
        .map_err(|_| MirrorError::InvalidResponse(line.to_string()))?;

    Ok(HdrEntry {
        article_number,
        value: parts.next().unwrap_or_default().trim().to_string(),
    })
}

/// Parse HDR/XHDR response into HdrEntry list
///
/// Malformed lines are skipped.
pub fn parse_hdr_response(response: NntpResponse) -> Result<Vec<HdrEntry>> {
    if !response.is_success() {
        return Err(MirrorError::Protocol {
            code: response.code,
            message: response.message,
        });
    }

    Ok(response
        .lines
        .iter()
        .filter_map(|line| parse_hdr_line(line).ok())
        .collect())
}
