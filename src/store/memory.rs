//! In-memory message store
//!
//! Behaves like [`SqliteStore`](super::SqliteStore) for a single process:
//! same scoping, same column-wise upsert, same filter semantics. Nothing
//! survives the value.

use super::{MessageRecord, Storage};
use crate::error::{MirrorError, Result};
use crate::filter::{Cell, Column, MessageFilter};
use crate::headers::HeaderBatch;
use crate::range::ArticleRange;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Default)]
struct Contents {
    newsgroups: BTreeSet<String>,
    groups: HashMap<String, BTreeMap<u64, MessageRecord>>,
}

/// Message store held in process memory
#[derive(Debug)]
pub struct MemoryStore {
    contents: Option<Contents>,
    updates: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            contents: Some(Contents::default()),
            updates: 0,
        }
    }

    /// Number of `update_messages` calls that applied a batch
    pub fn update_count(&self) -> usize {
        self.updates
    }

    fn contents(&self) -> Result<&Contents> {
        self.contents
            .as_ref()
            .ok_or_else(|| MirrorError::StorageUnavailable("store is closed".to_string()))
    }

    fn contents_mut(&mut self) -> Result<&mut Contents> {
        self.contents
            .as_mut()
            .ok_or_else(|| MirrorError::StorageUnavailable("store is closed".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn cell(record: &MessageRecord, column: Column) -> Option<Cell<'_>> {
    match column {
        Column::Article => i64::try_from(record.article).ok().map(Cell::Integer),
        _ => record.text(column).map(Cell::Text),
    }
}

impl Storage for MemoryStore {
    fn upsert_newsgroups(&mut self, names: &[String]) -> Result<usize> {
        let contents = self.contents_mut()?;
        Ok(names
            .iter()
            .filter(|name| contents.newsgroups.insert((*name).clone()))
            .count())
    }

    fn list_newsgroups(&self) -> Result<Vec<String>> {
        Ok(self.contents()?.newsgroups.iter().cloned().collect())
    }

    fn ensure_group(&mut self, group: &str) -> Result<ArticleRange> {
        let rows = self
            .contents_mut()?
            .groups
            .entry(group.to_string())
            .or_default();
        Ok(match (rows.keys().next(), rows.keys().next_back()) {
            (Some(&min), Some(&max)) => ArticleRange::new(min, max),
            _ => ArticleRange::EMPTY,
        })
    }

    fn update_messages(&mut self, group: &str, batch: &HeaderBatch) -> Result<usize> {
        let rows = self
            .contents_mut()?
            .groups
            .entry(group.to_string())
            .or_default();

        let mut applied = 0;
        for (field, values) in batch.iter() {
            for (article, value) in values {
                rows.entry(*article)
                    .or_insert_with(|| MessageRecord::new(*article))
                    .set_text(field.column(), value.as_str());
            }
            applied += values.len();
        }
        self.updates += 1;
        Ok(applied)
    }

    fn query_messages(&self, group: &str, filter: &MessageFilter) -> Result<Vec<MessageRecord>> {
        filter.validate()?;
        let Some(rows) = self.contents()?.groups.get(group) else {
            return Ok(Vec::new());
        };

        Ok(rows
            .values()
            .filter(|record| {
                filter
                    .clauses()
                    .iter()
                    .all(|(column, predicate)| predicate.matches(*column, cell(record, *column)))
            })
            .cloned()
            .collect())
    }

    fn close(&mut self) -> Result<()> {
        self.contents = None;
        Ok(())
    }
}
