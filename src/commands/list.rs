//! LIST ACTIVE for newsgroup discovery

use crate::error::{MirrorError, Result};
use crate::response::NntpResponse;

/// Build LIST ACTIVE command (RFC 3977 §7.6.3)
pub fn list_active(wildmat: &str) -> String {
    format!("LIST ACTIVE {}\r\n", wildmat)
}

/// Active newsgroup entry from LIST ACTIVE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveGroup {
    /// Newsgroup name
    pub name: String,
    /// Highest article number
    pub high: u64,
    /// Lowest article number
    pub low: u64,
    /// Posting status ("y", "n", "m", or an "=alias")
    pub status: String,
}

/// Parse LIST ACTIVE response into ActiveGroup entries
///
/// Format: "group high low status"
/// Example: "comp.lang.rust 12345 1000 y"
pub fn parse_list_active_response(response: NntpResponse) -> Result<Vec<ActiveGroup>> {
    if !response.is_success() {
        return Err(MirrorError::Protocol {
            code: response.code,
            message: response.message,
        });
    }

    let mut groups = Vec::with_capacity(response.lines.len());
    for line in &response.lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue; // Skip malformed lines
        }

        groups.push(ActiveGroup {
            name: parts[0].to_string(),
            high: parts[1].parse().unwrap_or(0),
            low: parts[2].parse().unwrap_or(0),
            status: parts[3].to_string(),
        });
    }

    Ok(groups)
}
