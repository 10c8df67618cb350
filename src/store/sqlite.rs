//! SQLite-backed message store
//!
//! All servers and groups share two tables; rows are scoped by the
//! `(server, newsgroup)` key prefix. The database runs in WAL mode with a
//! busy timeout so several mirrors can share one file.

use super::{MessageRecord, Storage};
use crate::error::{MirrorError, Result};
use crate::filter::{Column, FilterValue, MessageFilter, Predicate};
use crate::headers::{HeaderBatch, HeaderField};
use crate::range::ArticleRange;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace};

/// How long a writer waits for another process's lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS newsgroups (
    server      TEXT NOT NULL,
    newsgroup   TEXT NOT NULL,
    PRIMARY KEY (server, newsgroup)
);

CREATE TABLE IF NOT EXISTS messages (
    server          TEXT NOT NULL,
    newsgroup       TEXT NOT NULL,
    article         INTEGER NOT NULL,
    message_id      TEXT,
    \"date\"        TEXT,
    subject         TEXT,
    \"from\"        TEXT,
    organization    TEXT,
    path            TEXT,
    newsgroups      TEXT,
    \"references\"  TEXT,
    expires         TEXT,
    distribution    TEXT,
    PRIMARY KEY (server, newsgroup, article DESC)
);
";

/// Lookup indexes, all scoped by group
const INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_messages_subject    ON messages(server, newsgroup, subject COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_messages_from       ON messages(server, newsgroup, \"from\" COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_messages_article    ON messages(server, newsgroup, article ASC);
CREATE INDEX IF NOT EXISTS idx_messages_message_id ON messages(server, newsgroup, message_id);
CREATE INDEX IF NOT EXISTS idx_messages_date       ON messages(server, newsgroup, \"date\");
";

const SELECT_MESSAGES: &str = "SELECT article, message_id, \"date\", subject, \"from\", \
     organization, path, newsgroups, \"references\", expires, distribution \
     FROM messages WHERE server = ?1 AND newsgroup = ?2";

/// Insert-or-overwrite of a single header column
macro_rules! upsert_column {
    ($column:literal) => {
        concat!(
            "INSERT INTO messages (server, newsgroup, article, ",
            $column,
            ") VALUES (?1, ?2, ?3, ?4) ON CONFLICT(server, newsgroup, article) DO UPDATE SET ",
            $column,
            " = excluded.",
            $column
        )
    };
}

const fn upsert_sql(field: HeaderField) -> &'static str {
    match field {
        HeaderField::MessageId => upsert_column!("message_id"),
        HeaderField::Date => upsert_column!("\"date\""),
        HeaderField::Subject => upsert_column!("subject"),
        HeaderField::From => upsert_column!("\"from\""),
        HeaderField::Organization => upsert_column!("organization"),
        HeaderField::Path => upsert_column!("path"),
        HeaderField::Newsgroups => upsert_column!("newsgroups"),
        HeaderField::References => upsert_column!("\"references\""),
        HeaderField::Expires => upsert_column!("expires"),
        HeaderField::Distribution => upsert_column!("distribution"),
    }
}

fn to_db_article(article: u64) -> Result<i64> {
    i64::try_from(article).map_err(|_| {
        MirrorError::StorageUnavailable(format!("article number {} out of range", article))
    })
}

fn from_db_article(article: i64) -> u64 {
    u64::try_from(article).unwrap_or(0)
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<MessageRecord> {
    Ok(MessageRecord {
        article: from_db_article(row.get(0)?),
        message_id: row.get(1)?,
        date: row.get(2)?,
        subject: row.get(3)?,
        from: row.get(4)?,
        organization: row.get(5)?,
        path: row.get(6)?,
        newsgroups: row.get(7)?,
        references: row.get(8)?,
        expires: row.get(9)?,
        distribution: row.get(10)?,
    })
}

/// Render one filter clause, appending its parameters
fn clause_sql(column: Column, predicate: &Predicate, args: &mut Vec<FilterValue>) -> String {
    let name = column.sql();
    match predicate {
        Predicate::Compare(op, value) => {
            args.push(value.clone());
            format!("{} {} ?", name, op.sql())
        }
        Predicate::Range(min, max) => {
            args.push(min.clone());
            args.push(max.clone());
            format!("{} BETWEEN ? AND ?", name)
        }
        Predicate::InSet(values) => {
            args.extend(values.iter().cloned());
            let marks = vec!["?"; values.len()].join(", ");
            format!("{} IN ({})", name, marks)
        }
        Predicate::SuffixGlob(pattern) => {
            args.push(FilterValue::Text(pattern.clone()));
            format!("{} GLOB '*' || ?", name)
        }
    }
}

/// Message store in a SQLite database
pub struct SqliteStore {
    conn: Option<Connection>,
    server: String,
}

impl SqliteStore {
    /// Open or create the database at `path` for the server `server`
    ///
    /// # Errors
    ///
    /// [`MirrorError::StorageUnavailable`] if the file cannot be opened,
    /// is not a database, or the schema cannot be created.
    pub fn open(path: impl AsRef<Path>, server: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening message store {}", path.display());
        let conn = Connection::open(path)?;
        Self::init(conn, server.into())
    }

    /// A private database that lives as long as the store
    pub fn open_in_memory(server: impl Into<String>) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, server.into())
    }

    fn init(conn: Connection, server: String) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // In-memory databases answer "memory"; only files switch to WAL
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        trace!("Journal mode: {}", mode);
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(INDEXES)?;

        Ok(Self {
            conn: Some(conn),
            server,
        })
    }

    /// Server identity every row is scoped by
    pub fn server(&self) -> &str {
        &self.server
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| MirrorError::StorageUnavailable("store is closed".to_string()))
    }

    fn conn_mut(&mut self) -> Result<&mut Connection> {
        self.conn
            .as_mut()
            .ok_or_else(|| MirrorError::StorageUnavailable("store is closed".to_string()))
    }

    fn stat(&self, group: &str) -> Result<ArticleRange> {
        let (min, max): (i64, i64) = self.conn()?.query_row(
            "SELECT coalesce(min(article), 0), coalesce(max(article), 0) \
             FROM messages WHERE server = ?1 AND newsgroup = ?2",
            params![self.server, group],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(ArticleRange::new(from_db_article(min), from_db_article(max)))
    }

    /// Look up a single row
    pub fn message(&self, group: &str, article: u64) -> Result<Option<MessageRecord>> {
        let sql = format!("{} AND article = ?3", SELECT_MESSAGES);
        let record = self
            .conn()?
            .query_row(&sql, params![self.server, group, to_db_article(article)?], read_record)
            .optional()?;
        Ok(record)
    }
}

impl Storage for SqliteStore {
    fn upsert_newsgroups(&mut self, names: &[String]) -> Result<usize> {
        let server = self.server.clone();
        let tx = self.conn_mut()?.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO newsgroups (server, newsgroup) VALUES (?1, ?2)",
            )?;
            for name in names {
                inserted += stmt.execute(params![server, name])?;
            }
        }
        tx.commit()?;

        debug!("Recorded {} new of {} newsgroups", inserted, names.len());
        Ok(inserted)
    }

    fn list_newsgroups(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT newsgroup FROM newsgroups WHERE server = ?1 ORDER BY newsgroup")?;
        let names = stmt
            .query_map(params![self.server], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    fn ensure_group(&mut self, group: &str) -> Result<ArticleRange> {
        self.conn()?.execute_batch(INDEXES)?;
        self.stat(group)
    }

    fn update_messages(&mut self, group: &str, batch: &HeaderBatch) -> Result<usize> {
        let server = self.server.clone();
        let tx = self.conn_mut()?.transaction()?;
        let mut applied = 0;

        for (field, values) in batch.iter() {
            let mut stmt = tx.prepare_cached(upsert_sql(field))?;
            let mut changed = 0;
            for (article, value) in values {
                changed += stmt.execute(params![server, group, to_db_article(*article)?, value])?;
            }
            trace!("Inserted or updated {} rows for header {}", changed, field);
            applied += values.len();
        }

        tx.commit()?;
        debug!("Applied {} header values to {}", applied, group);
        Ok(applied)
    }

    fn query_messages(&self, group: &str, filter: &MessageFilter) -> Result<Vec<MessageRecord>> {
        filter.validate()?;

        let mut sql = String::from(SELECT_MESSAGES);
        let mut args = vec![
            FilterValue::Text(self.server.clone()),
            FilterValue::Text(group.to_string()),
        ];
        for (column, predicate) in filter.clauses() {
            sql.push_str(" AND ");
            sql.push_str(&clause_sql(*column, predicate, &mut args));
        }
        sql.push_str(" ORDER BY article ASC");
        trace!("Query: {}", sql);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(args.iter()), read_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            debug!("Closing message store");
            conn.close().map_err(|(_, e)| MirrorError::from(e))?;
        }
        Ok(())
    }
}
