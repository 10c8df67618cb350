//! The fixed set of mirrored header fields and the batches that carry them
//!
//! Every field maps to exactly one column of the message store. A
//! [`HeaderBatch`] holds, per field, the `(article, value)` pairs one
//! retrieval produced; values are stored exactly as the server sent them
//! except for `Date`, which is normalized to RFC 3339 in UTC.

use crate::error::{MirrorError, Result};
use crate::filter::Column;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// A header field mirrored into the store, in retrieval order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderField {
    MessageId,
    Date,
    Subject,
    From,
    Organization,
    Path,
    Newsgroups,
    References,
    Expires,
    Distribution,
}

impl HeaderField {
    /// All mirrored fields, in the order they are requested from the server
    pub const ALL: [HeaderField; 10] = [
        HeaderField::MessageId,
        HeaderField::Date,
        HeaderField::Subject,
        HeaderField::From,
        HeaderField::Organization,
        HeaderField::Path,
        HeaderField::Newsgroups,
        HeaderField::References,
        HeaderField::Expires,
        HeaderField::Distribution,
    ];

    /// Header name as sent in HDR/XHDR
    pub const fn name(self) -> &'static str {
        match self {
            HeaderField::MessageId => "Message-Id",
            HeaderField::Date => "Date",
            HeaderField::Subject => "Subject",
            HeaderField::From => "From",
            HeaderField::Organization => "Organization",
            HeaderField::Path => "Path",
            HeaderField::Newsgroups => "Newsgroups",
            HeaderField::References => "References",
            HeaderField::Expires => "Expires",
            HeaderField::Distribution => "Distribution",
        }
    }

    /// Store column holding this field
    pub const fn column(self) -> Column {
        match self {
            HeaderField::MessageId => Column::MessageId,
            HeaderField::Date => Column::Date,
            HeaderField::Subject => Column::Subject,
            HeaderField::From => Column::From,
            HeaderField::Organization => Column::Organization,
            HeaderField::Path => Column::Path,
            HeaderField::Newsgroups => Column::Newsgroups,
            HeaderField::References => Column::References,
            HeaderField::Expires => Column::Expires,
            HeaderField::Distribution => Column::Distribution,
        }
    }

    /// Look a field up by header name, case-insensitively
    pub fn from_name(name: &str) -> Option<HeaderField> {
        HeaderField::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A header value that was dropped from a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedHeader {
    /// Article the value belonged to
    pub article: u64,
    /// Field it was retrieved for
    pub field: HeaderField,
    /// Value as received
    pub raw: String,
}

/// Header values retrieved for one article range, grouped by field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBatch {
    values: BTreeMap<HeaderField, Vec<(u64, String)>>,
    rejected: Vec<RejectedHeader>,
}

impl HeaderBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an already-normalized value
    pub fn insert(&mut self, field: HeaderField, article: u64, value: impl Into<String>) {
        self.values
            .entry(field)
            .or_default()
            .push((article, value.into()));
    }

    /// Add a value as received from the server, normalizing it first
    ///
    /// Only `Date` values are rewritten. A date that cannot be parsed is
    /// left out of the batch, remembered in [`rejected`](Self::rejected), and
    /// reported as [`MirrorError::MalformedHeader`]; the batch stays usable.
    pub fn push_raw(&mut self, field: HeaderField, article: u64, raw: &str) -> Result<()> {
        if field != HeaderField::Date {
            self.insert(field, article, raw);
            return Ok(());
        }

        match normalize_date(raw) {
            Some(iso) => {
                self.insert(field, article, iso);
                Ok(())
            }
            None => {
                self.rejected.push(RejectedHeader {
                    article,
                    field,
                    raw: raw.to_string(),
                });
                Err(MirrorError::MalformedHeader {
                    article,
                    header: field.name(),
                    reason: format!("unparseable date {:?}", raw),
                })
            }
        }
    }

    /// Values retrieved for `field` (empty if none)
    pub fn get(&self, field: HeaderField) -> &[(u64, String)] {
        self.values.get(&field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Fields that carry at least one value, in retrieval order
    pub fn iter(&self) -> impl Iterator<Item = (HeaderField, &[(u64, String)])> {
        self.values
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(field, values)| (*field, values.as_slice()))
    }

    /// Number of fields that carry at least one value
    pub fn field_count(&self) -> usize {
        self.iter().count()
    }

    /// Total number of `(field, article)` pairs
    pub fn len(&self) -> usize {
        self.values.values().map(Vec::len).sum()
    }

    /// True when no value was retrieved
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values dropped during normalization
    pub fn rejected(&self) -> &[RejectedHeader] {
        &self.rejected
    }
}

/// Date layouts seen in the wild that carry a numeric offset
const OFFSET_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M %z",
    "%a, %d %b %y %H:%M:%S %z",
    "%d %b %y %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Layouts without any zone; read as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%a %b %e %H:%M:%S %Y",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Zone names that mean UTC when they trail a date
const UTC_NAMES: &[&str] = &["GMT", "UTC", "UT", "Z"];

/// Remove RFC 5322 comments such as "(PST)" and collapse whitespace
fn strip_comments(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for c in raw.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a Date header value, leniently
///
/// Tries RFC 5322, then RFC 3339, then a handful of common deviations
/// (missing weekday or seconds, two-digit years, zone names instead of
/// offsets, asctime layout).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let cleaned = strip_comments(raw);
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(&cleaned) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(dt.with_timezone(&Utc));
    }

    let with_offset = match cleaned.rsplit_once(' ') {
        Some((head, zone)) if UTC_NAMES.iter().any(|n| n.eq_ignore_ascii_case(zone)) => {
            format!("{} +0000", head)
        }
        _ => cleaned.clone(),
    };
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&cleaned, format).ok())
        .map(|naive| naive.and_utc())
}

/// Normalize a Date header value to RFC 3339 in UTC, e.g. `2026-01-20T12:00:00+00:00`
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, false))
}
