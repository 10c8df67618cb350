//! Persistent message storage
//!
//! Rows are scoped by `(server, newsgroup)`; the server identity is fixed
//! when a store is opened, so every operation takes only the group name.
//! Each header column is written independently, which lets a retrieval
//! fill one column at a time without clobbering the others.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::filter::{Column, MessageFilter};
use crate::headers::HeaderBatch;
use crate::range::ArticleRange;

/// One stored message: the article number plus every mirrored header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageRecord {
    pub article: u64,
    pub message_id: Option<String>,
    /// RFC 3339, UTC
    pub date: Option<String>,
    pub subject: Option<String>,
    pub from: Option<String>,
    pub organization: Option<String>,
    pub path: Option<String>,
    pub newsgroups: Option<String>,
    pub references: Option<String>,
    pub expires: Option<String>,
    pub distribution: Option<String>,
}

impl MessageRecord {
    /// An empty row for `article`
    pub fn new(article: u64) -> Self {
        Self {
            article,
            ..Self::default()
        }
    }

    /// Text value of a header column; `None` for [`Column::Article`]
    pub fn text(&self, column: Column) -> Option<&str> {
        let value = match column {
            Column::Article => return None,
            Column::MessageId => &self.message_id,
            Column::Date => &self.date,
            Column::Subject => &self.subject,
            Column::From => &self.from,
            Column::Organization => &self.organization,
            Column::Path => &self.path,
            Column::Newsgroups => &self.newsgroups,
            Column::References => &self.references,
            Column::Expires => &self.expires,
            Column::Distribution => &self.distribution,
        };
        value.as_deref()
    }

    /// Overwrite one header column; writes to [`Column::Article`] are ignored
    pub fn set_text(&mut self, column: Column, value: impl Into<String>) {
        let slot = match column {
            Column::Article => return,
            Column::MessageId => &mut self.message_id,
            Column::Date => &mut self.date,
            Column::Subject => &mut self.subject,
            Column::From => &mut self.from,
            Column::Organization => &mut self.organization,
            Column::Path => &mut self.path,
            Column::Newsgroups => &mut self.newsgroups,
            Column::References => &mut self.references,
            Column::Expires => &mut self.expires,
            Column::Distribution => &mut self.distribution,
        };
        *slot = Some(value.into());
    }
}

/// Trait for message store implementations
///
/// Any persistence failure is reported as
/// [`MirrorError::StorageUnavailable`](crate::MirrorError::StorageUnavailable),
/// as is every call made after [`close`](Self::close).
pub trait Storage {
    /// Record newsgroup names, ignoring ones already known
    ///
    /// Returns how many names were new.
    fn upsert_newsgroups(&mut self, names: &[String]) -> Result<usize>;

    /// All known newsgroup names, sorted
    fn list_newsgroups(&self) -> Result<Vec<String>>;

    /// Make `group` usable and return the article range it holds
    ///
    /// Idempotent. An empty group yields [`ArticleRange::EMPTY`].
    fn ensure_group(&mut self, group: &str) -> Result<ArticleRange>;

    /// Apply a batch, one column at a time, atomically
    ///
    /// Missing rows are created; existing rows only have the batch's
    /// columns overwritten. Returns the number of `(field, article)` pairs
    /// applied.
    fn update_messages(&mut self, group: &str, batch: &HeaderBatch) -> Result<usize>;

    /// Rows of `group` matching every clause of `filter`, ascending by article
    fn query_messages(&self, group: &str, filter: &MessageFilter) -> Result<Vec<MessageRecord>>;

    /// Release the store; calling it again is a no-op
    fn close(&mut self) -> Result<()>;
}
