//! Range reconciliation between the local store and the server
//!
//! The engine compares the article range the store already holds with the
//! range the server reports, widens it by at most `older` articles
//! downwards and `newer` articles upwards, fetches the missing gaps and
//! persists each one before touching the next.
//!
//! ```text
//!          desired.min   current.min        current.max   desired.max
//!  live.min     |             |                   |            |    live.max
//!     |---------[=============|-------------------|============]-------|
//!                backward gap      already stored    forward gap
//! ```

use crate::error::Result;
use crate::filter::MessageFilter;
use crate::headers::RejectedHeader;
use crate::range::ArticleRange;
use crate::session::HeaderSource;
use crate::store::{MessageRecord, Storage};
use std::fmt;
use tracing::{debug, info, warn};

/// How far a sync may reach beyond what is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRequest {
    /// Articles to add below the stored minimum
    pub older: u64,
    /// Articles to add above the stored maximum; also the bootstrap window
    pub newer: u64,
    /// Consult the server; without this the store is read as-is
    pub refresh: bool,
}

impl SyncRequest {
    /// Read what is stored, never touching the network
    pub const fn cached() -> Self {
        Self {
            older: 0,
            newer: 0,
            refresh: false,
        }
    }

    /// Ask the server and extend the stored range
    pub const fn refresh(older: u64, newer: u64) -> Self {
        Self {
            older,
            newer,
            refresh: true,
        }
    }
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self::cached()
    }
}

/// Which end of the desired range was not reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Lower,
    Upper,
}

/// The store ended up narrower than planned; reported, never raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeInconsistency {
    pub edge: Edge,
    pub desired: u64,
    pub achieved: u64,
}

impl fmt::Display for RangeInconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.edge {
            Edge::Lower => write!(
                f,
                "desired article #{} is less than actual minimum #{}",
                self.desired, self.achieved
            ),
            Edge::Upper => write!(
                f,
                "desired article #{} is greater than actual maximum #{}",
                self.desired, self.achieved
            ),
        }
    }
}

/// Target range and the gaps to fetch, backward gap first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub desired: ArticleRange,
    pub gaps: Vec<ArticleRange>,
}

/// Work out which articles a request needs
///
/// All arithmetic saturates at zero. When refreshing a group with nothing
/// stored, the window is the newest `newer` articles, whatever the
/// server's low-water mark. An empty desired range fetches nothing.
pub fn plan(current: ArticleRange, live: ArticleRange, request: SyncRequest) -> Plan {
    let (older, newer) = if request.refresh {
        (request.older, request.newer)
    } else {
        (0, 0)
    };

    let mut desired = ArticleRange::new(
        live.min.max(current.min.saturating_sub(older)),
        live.max.min(current.max.saturating_add(newer)),
    );
    if request.refresh && current.max < 1 && !live.is_empty() {
        desired = ArticleRange::new(
            live.max.saturating_sub(request.newer).max(current.min),
            live.max,
        );
    }

    let mut gaps = Vec::with_capacity(2);
    if desired.is_empty() {
        return Plan { desired, gaps };
    }
    if desired.min < current.min {
        gaps.push(ArticleRange::new(desired.min, current.min - 1));
    }
    if desired.max > current.max {
        let start = if current.max == 0 {
            desired.min
        } else {
            current.max + 1
        };
        gaps.push(ArticleRange::new(start, desired.max));
    }

    Plan { desired, gaps }
}

/// Outcome of one [`SyncEngine::sync`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Stored range before the sync
    pub current: ArticleRange,
    /// Range the server reported (equals `current` without refresh)
    pub live: ArticleRange,
    pub desired: ArticleRange,
    /// Stored range after the sync
    pub achieved: ArticleRange,
    /// Gaps retrieved, in order
    pub fetched: Vec<ArticleRange>,
    /// `(field, article)` pairs written
    pub applied: usize,
    pub rejected: Vec<RejectedHeader>,
    pub inconsistencies: Vec<RangeInconsistency>,
}

impl SyncReport {
    pub fn is_consistent(&self) -> bool {
        self.inconsistencies.is_empty()
    }
}

/// Keeps a store in step with a header source, one group at a time
pub struct SyncEngine<S, P> {
    store: S,
    source: P,
}

impl<S: Storage, P: HeaderSource> SyncEngine<S, P> {
    pub fn new(store: S, source: P) -> Self {
        Self { store, source }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    /// Take the engine apart without closing anything
    pub fn into_parts(self) -> (S, P) {
        (self.store, self.source)
    }

    /// Bring the stored range of `group` up to what `request` asks for
    ///
    /// Each gap is written in its own transaction before the next one is
    /// fetched, so an error leaves earlier gaps stored.
    ///
    /// # Errors
    ///
    /// Storage and network errors propagate unchanged. Malformed headers
    /// and a short final range are only reported.
    pub async fn sync(&mut self, group: &str, request: SyncRequest) -> Result<SyncReport> {
        let current = self.store.ensure_group(group)?;
        let live = if request.refresh {
            self.source.live_range(group).await?
        } else {
            current
        };

        let Plan { desired, gaps } = plan(current, live, request);
        debug!(
            "Group {}: stored {}, live {}, desired {}",
            group, current, live, desired
        );

        let mut report = SyncReport {
            current,
            live,
            desired,
            ..SyncReport::default()
        };

        for gap in gaps {
            let batch = self.source.retrieve_headers(group, gap).await?;
            let applied = self.store.update_messages(group, &batch)?;
            info!(
                "Updated {} values over {} headers",
                applied,
                batch.field_count()
            );

            report.applied += applied;
            report.rejected.extend_from_slice(batch.rejected());
            report.fetched.push(gap);
        }

        let achieved = self.store.ensure_group(group)?;
        if !desired.is_empty() && desired.min < achieved.min {
            report.inconsistencies.push(RangeInconsistency {
                edge: Edge::Lower,
                desired: desired.min,
                achieved: achieved.min,
            });
        }
        if !desired.is_empty() && desired.max > achieved.max {
            report.inconsistencies.push(RangeInconsistency {
                edge: Edge::Upper,
                desired: desired.max,
                achieved: achieved.max,
            });
        }
        for inconsistency in &report.inconsistencies {
            warn!("Group {}: {}", group, inconsistency);
        }

        report.achieved = achieved;
        Ok(report)
    }

    /// Sync `group`, then return its stored rows matching `filter`
    ///
    /// The filter is checked first; an invalid one fails with
    /// [`MirrorError::InvalidFilter`](crate::MirrorError::InvalidFilter)
    /// before any storage or network work.
    pub async fn messages(
        &mut self,
        group: &str,
        request: SyncRequest,
        filter: &MessageFilter,
    ) -> Result<Vec<MessageRecord>> {
        filter.validate()?;
        self.sync(group, request).await?;
        self.store.query_messages(group, filter)
    }

    /// Known newsgroups, first refreshed from the server if asked
    pub async fn groups(&mut self, refresh: bool) -> Result<Vec<String>> {
        if refresh {
            let names = self.source.list_groups().await?;
            let inserted = self.store.upsert_newsgroups(&names)?;
            info!("Server lists {} groups, {} new", names.len(), inserted);
        }
        self.store.list_newsgroups()
    }

    /// Close the store, then the connection
    ///
    /// Both are attempted; the first error is returned.
    pub async fn close(&mut self) -> Result<()> {
        let stored = self.store.close();
        let network = self.source.close().await;
        stored.and(network)
    }
}
