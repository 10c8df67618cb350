//! Per-column filters for message queries
//!
//! A [`MessageFilter`] is a conjunction of `(Column, Predicate)` clauses.
//! Columns come from a fixed enumeration, so an unknown name is rejected
//! when the filter is built rather than when the query runs.
//!
//! ```
//! use nntp_mirror::{MessageFilter, Predicate};
//!
//! let filter = MessageFilter::new()
//!     .with("subject", Predicate::like("%kernel%"))?
//!     .with("article", Predicate::in_set([5, 8, 13]))?;
//! assert_eq!(filter.clauses().len(), 2);
//! # Ok::<(), nntp_mirror::MirrorError>(())
//! ```

use crate::error::{MirrorError, Result};
use glob::{MatchOptions, Pattern};
use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A column of the message store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Article,
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

impl Column {
    /// All columns, in row order
    pub const ALL: [Column; 11] = [
        Column::Article,
        Column::MessageId,
        Column::Date,
        Column::Subject,
        Column::From,
        Column::Organization,
        Column::Path,
        Column::Newsgroups,
        Column::References,
        Column::Expires,
        Column::Distribution,
    ];

    /// Column name as used by callers
    pub const fn name(self) -> &'static str {
        match self {
            Column::Article => "article",
            Column::MessageId => "message_id",
            Column::Date => "date",
            Column::Subject => "subject",
            Column::From => "from",
            Column::Organization => "organization",
            Column::Path => "path",
            Column::Newsgroups => "newsgroups",
            Column::References => "references",
            Column::Expires => "expires",
            Column::Distribution => "distribution",
        }
    }

    /// Quoted SQL identifier (several names are SQL keywords)
    pub(crate) const fn sql(self) -> &'static str {
        match self {
            Column::Article => "article",
            Column::MessageId => "message_id",
            Column::Date => "\"date\"",
            Column::Subject => "subject",
            Column::From => "\"from\"",
            Column::Organization => "organization",
            Column::Path => "path",
            Column::Newsgroups => "newsgroups",
            Column::References => "\"references\"",
            Column::Expires => "expires",
            Column::Distribution => "distribution",
        }
    }
}

impl FromStr for Column {
    type Err = MirrorError;

    fn from_str(name: &str) -> Result<Self> {
        Column::ALL
            .into_iter()
            .find(|column| column.name() == name)
            .ok_or_else(|| MirrorError::InvalidFilter(format!("unknown column {:?}", name)))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Binary operator of a [`Predicate::Compare`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
    /// Null-aware equality
    Is,
    /// Null-aware inequality
    IsNot,
    /// Case-insensitive pattern with `%` and `_`
    Like,
    /// Case-sensitive pattern with `*`, `?` and `[...]`
    Glob,
}

impl CompareOp {
    pub(crate) const fn sql(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Is => "IS",
            CompareOp::IsNot => "IS NOT",
            CompareOp::Like => "LIKE",
            CompareOp::Glob => "GLOB",
        }
    }
}

/// A literal compared against a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Null,
    Integer(i64),
    Text(String),
}

impl FilterValue {
    /// Integer if the text is one, text otherwise
    fn infer(raw: &str) -> FilterValue {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("null") {
            FilterValue::Null
        } else if let Ok(n) = raw.parse::<i64>() {
            FilterValue::Integer(n)
        } else {
            FilterValue::Text(raw.to_string())
        }
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Integer(n)
    }
}

/// Article numbers past `i64::MAX` cannot be stored, so they cannot be asked for
impl TryFrom<u64> for FilterValue {
    type Error = MirrorError;

    fn try_from(n: u64) -> Result<Self> {
        i64::try_from(n)
            .map(FilterValue::Integer)
            .map_err(|_| MirrorError::InvalidFilter(format!("{} is out of range", n)))
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Integer(n.into())
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl ToSql for FilterValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            FilterValue::Null => Ok(ToSqlOutput::from(rusqlite::types::Null)),
            FilterValue::Integer(n) => Ok(ToSqlOutput::from(*n)),
            FilterValue::Text(s) => Ok(ToSqlOutput::from(s.as_str())),
        }
    }
}

/// Condition on a single column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `column <op> value`
    Compare(CompareOp, FilterValue),
    /// Inclusive `min <= column <= max`
    Range(FilterValue, FilterValue),
    /// Column equals one of the values
    InSet(Vec<FilterValue>),
    /// Column ends with the given glob pattern (`'*' || pattern`)
    SuffixGlob(String),
}

impl Predicate {
    pub fn compare(op: CompareOp, value: impl Into<FilterValue>) -> Self {
        Predicate::Compare(op, value.into())
    }

    pub fn eq(value: impl Into<FilterValue>) -> Self {
        Predicate::compare(CompareOp::Eq, value)
    }

    pub fn like(pattern: impl Into<String>) -> Self {
        Predicate::Compare(CompareOp::Like, FilterValue::Text(pattern.into()))
    }

    pub fn glob(pattern: impl Into<String>) -> Self {
        Predicate::Compare(CompareOp::Glob, FilterValue::Text(pattern.into()))
    }

    pub fn is_null() -> Self {
        Predicate::Compare(CompareOp::Is, FilterValue::Null)
    }

    pub fn is_not_null() -> Self {
        Predicate::Compare(CompareOp::IsNot, FilterValue::Null)
    }

    pub fn between(min: impl Into<FilterValue>, max: impl Into<FilterValue>) -> Self {
        Predicate::Range(min.into(), max.into())
    }

    pub fn in_set<V: Into<FilterValue>>(values: impl IntoIterator<Item = V>) -> Self {
        Predicate::InSet(values.into_iter().map(Into::into).collect())
    }

    pub fn suffix(pattern: impl Into<String>) -> Self {
        Predicate::SuffixGlob(pattern.into())
    }

    /// Read a predicate from command-line text
    ///
    /// Recognized forms, tried in order:
    /// - an operator prefix followed by a space: `> 100`, `<= 5`, `!= x`,
    ///   `<> x`, `is not null`, `is null`, `like %rust%`, `glob *[Rr]ust*`
    /// - `between MIN and MAX`
    /// - `in A,B,C`
    ///
    /// Anything else becomes [`Predicate::SuffixGlob`] of the whole text.
    /// Values that parse as integers are compared as integers.
    pub fn parse(expr: &str) -> Predicate {
        const PREFIXES: &[(&str, CompareOp)] = &[
            ("> ", CompareOp::Gt),
            ("< ", CompareOp::Lt),
            (">= ", CompareOp::Ge),
            ("<= ", CompareOp::Le),
            ("= ", CompareOp::Eq),
            ("!= ", CompareOp::Ne),
            ("<> ", CompareOp::Ne),
            ("is not ", CompareOp::IsNot),
            ("is ", CompareOp::Is),
        ];

        for (prefix, op) in PREFIXES {
            if let Some(rest) = strip_prefix_ignore_case(expr, prefix) {
                return Predicate::Compare(*op, FilterValue::infer(rest));
            }
        }
        // Patterns keep their exact text
        if let Some(rest) = strip_prefix_ignore_case(expr, "like ") {
            return Predicate::like(rest);
        }
        if let Some(rest) = strip_prefix_ignore_case(expr, "glob ") {
            return Predicate::glob(rest);
        }
        if let Some(rest) = strip_prefix_ignore_case(expr, "between ") {
            let lower = rest.to_ascii_lowercase();
            if let Some(split) = lower.find(" and ") {
                return Predicate::Range(
                    FilterValue::infer(&rest[..split]),
                    FilterValue::infer(&rest[split + " and ".len()..]),
                );
            }
        }
        if let Some(rest) = strip_prefix_ignore_case(expr, "in ") {
            return Predicate::InSet(rest.split(',').map(FilterValue::infer).collect());
        }

        Predicate::SuffixGlob(expr.to_string())
    }

    /// Reject predicates no store can evaluate
    pub fn validate(&self, column: Column) -> Result<()> {
        match self {
            Predicate::InSet(values) if values.is_empty() => Err(MirrorError::InvalidFilter(
                format!("empty value set for column {}", column),
            )),
            Predicate::Compare(CompareOp::Like | CompareOp::Glob, FilterValue::Null) => Err(
                MirrorError::InvalidFilter(format!("null pattern for column {}", column)),
            ),
            _ => Ok(()),
        }
    }

    /// Evaluate against one cell with SQLite semantics
    ///
    /// Used by stores that do not run SQL. `NULL` only satisfies `IS`/`IS NOT`.
    pub(crate) fn matches(&self, column: Column, cell: Option<Cell<'_>>) -> bool {
        match self {
            Predicate::Compare(CompareOp::Is, value) => is_same(column, cell, value),
            Predicate::Compare(CompareOp::IsNot, value) => !is_same(column, cell, value),
            Predicate::Compare(CompareOp::Like, value) => match (cell, value) {
                (Some(cell), FilterValue::Text(p)) => like_match(p, &cell.as_text()),
                (Some(cell), FilterValue::Integer(n)) => like_match(&n.to_string(), &cell.as_text()),
                _ => false,
            },
            Predicate::Compare(CompareOp::Glob, value) => match (cell, value) {
                (Some(cell), FilterValue::Text(p)) => glob_match(p, &cell.as_text()),
                (Some(cell), FilterValue::Integer(n)) => glob_match(&n.to_string(), &cell.as_text()),
                _ => false,
            },
            Predicate::Compare(op, value) => match compare(column, cell, value) {
                Some(ordering) => match op {
                    CompareOp::Gt => ordering == Ordering::Greater,
                    CompareOp::Lt => ordering == Ordering::Less,
                    CompareOp::Ge => ordering != Ordering::Less,
                    CompareOp::Le => ordering != Ordering::Greater,
                    CompareOp::Eq => ordering == Ordering::Equal,
                    _ => ordering != Ordering::Equal,
                },
                None => false,
            },
            Predicate::Range(min, max) => {
                matches!(compare(column, cell, min), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(column, cell, max), Some(Ordering::Less | Ordering::Equal))
            }
            Predicate::InSet(values) => values
                .iter()
                .any(|value| compare(column, cell, value) == Some(Ordering::Equal)),
            Predicate::SuffixGlob(pattern) => match cell {
                Some(cell) => glob_match(&format!("*{}", pattern), &cell.as_text()),
                None => false,
            },
        }
    }
}

fn strip_prefix_ignore_case<'a>(expr: &'a str, prefix: &str) -> Option<&'a str> {
    let head = expr.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &expr[prefix.len()..])
}

/// A stored value as seen by [`Predicate::matches`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cell<'a> {
    Integer(i64),
    Text(&'a str),
}

impl Cell<'_> {
    fn as_text(&self) -> String {
        match self {
            Cell::Integer(n) => n.to_string(),
            Cell::Text(s) => s.to_string(),
        }
    }
}

/// Apply the column's affinity to the literal, then order cell against it
///
/// Integers sort before text, as in SQLite.
fn compare(column: Column, cell: Option<Cell<'_>>, value: &FilterValue) -> Option<Ordering> {
    let cell = cell?;
    let value = match (column, value) {
        (_, FilterValue::Null) => return None,
        (Column::Article, FilterValue::Text(s)) => match s.trim().parse::<i64>() {
            Ok(n) => Cell::Integer(n),
            Err(_) => Cell::Text(s),
        },
        (Column::Article, FilterValue::Integer(n)) => Cell::Integer(*n),
        (_, FilterValue::Integer(n)) => return compare_cells(cell, Cell::Text(&n.to_string())),
        (_, FilterValue::Text(s)) => Cell::Text(s),
    };
    compare_cells(cell, value)
}

fn compare_cells(left: Cell<'_>, right: Cell<'_>) -> Option<Ordering> {
    Some(match (left, right) {
        (Cell::Integer(a), Cell::Integer(b)) => a.cmp(&b),
        (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
        (Cell::Integer(_), Cell::Text(_)) => Ordering::Less,
        (Cell::Text(_), Cell::Integer(_)) => Ordering::Greater,
    })
}

fn is_same(column: Column, cell: Option<Cell<'_>>, value: &FilterValue) -> bool {
    match (cell, value) {
        (None, FilterValue::Null) => true,
        (None, _) | (_, FilterValue::Null) => false,
        (cell, value) => compare(column, cell, value) == Some(Ordering::Equal),
    }
}

/// SQL LIKE: `%` any run, `_` any char, ASCII case-insensitive
fn like_match(pattern: &str, text: &str) -> bool {
    let mut translated = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '%' => translated.push('*'),
            '_' => translated.push('?'),
            c => translated.push_str(&Pattern::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    compile(&translated).is_some_and(|p| p.matches_with(text, options))
}

/// SQLite GLOB: `*` any run, `?` any char, `[...]` classes negated with `^`
fn glob_match(pattern: &str, text: &str) -> bool {
    compile(&pattern.replace("[^", "[!")).is_some_and(|p| p.matches(text))
}

/// `glob` reserves `**` for path components; a run of stars means one here.
/// An invalid pattern, such as an unterminated class, matches nothing.
fn compile(pattern: &str) -> Option<Pattern> {
    let mut collapsed = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c != '*' || !collapsed.ends_with('*') {
            collapsed.push(c);
        }
    }
    Pattern::new(&collapsed).ok()
}

/// Conjunction of per-column predicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    clauses: Vec<(Column, Predicate)>,
}

impl MessageFilter {
    /// A filter that matches every row
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause for the column called `name`
    ///
    /// # Errors
    ///
    /// [`MirrorError::InvalidFilter`] for an unknown column or an unusable predicate.
    pub fn with(self, name: &str, predicate: Predicate) -> Result<Self> {
        let column: Column = name.parse()?;
        predicate.validate(column)?;
        Ok(self.and(column, predicate))
    }

    /// Add a clause for a known column
    pub fn and(mut self, column: Column, predicate: Predicate) -> Self {
        self.clauses.push((column, predicate));
        self
    }

    /// Clauses in the order they were added
    pub fn clauses(&self) -> &[(Column, Predicate)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Check every clause before any work is done with the filter
    pub fn validate(&self) -> Result<()> {
        self.clauses
            .iter()
            .try_for_each(|(column, predicate)| predicate.validate(*column))
    }
}
