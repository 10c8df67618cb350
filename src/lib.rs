#![doc = include_str!("../README.md")]

mod client;
/// NNTP command builders and response parsers
pub mod commands;
mod config;
/// Reconciliation of stored and live article ranges
pub mod engine;
mod error;
/// Per-column query filters
pub mod filter;
/// Mirrored header fields and date normalization
pub mod headers;
mod range;
mod response;
mod session;
/// Message storage backends
pub mod store;

pub use client::NntpClient;
pub use commands::{ActiveGroup, GroupInfo, HdrEntry};
pub use config::{Credentials, ServerConfig};
pub use engine::{Edge, Plan, RangeInconsistency, SyncEngine, SyncReport, SyncRequest, plan};
pub use error::{MirrorError, Result};
pub use filter::{Column, CompareOp, FilterValue, MessageFilter, Predicate};
pub use headers::{HeaderBatch, HeaderField, RejectedHeader, normalize_date, parse_date};
pub use range::ArticleRange;
pub use response::{NntpResponse, codes};
pub use session::{HeaderSource, Session};
pub use store::{MemoryStore, MessageRecord, SqliteStore, Storage};
