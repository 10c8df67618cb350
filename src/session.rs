//! Reconnecting header source on top of [`NntpClient`]
//!
//! A [`Session`] owns at most one connection. Before every protocol
//! operation it probes the connection with `DATE`; a connection that fails
//! the probe, or that the client has already flagged as broken, is dropped
//! and replaced. Reconnection never happens in the middle of an operation.

use crate::client::NntpClient;
use crate::config::ServerConfig;
use crate::error::{MirrorError, Result};
use crate::headers::{HeaderBatch, HeaderField};
use crate::range::ArticleRange;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where header batches come from
///
/// [`Session`] talks to a news server; tests substitute scripted sources.
pub trait HeaderSource {
    /// Current `(low, high)` article numbers the server reports for `group`
    fn live_range(&mut self, group: &str) -> impl Future<Output = Result<ArticleRange>> + Send;

    /// Every mirrored header for the articles in `range`
    ///
    /// Values that fail normalization are left out and listed in
    /// [`HeaderBatch::rejected`].
    fn retrieve_headers(
        &mut self,
        group: &str,
        range: ArticleRange,
    ) -> impl Future<Output = Result<HeaderBatch>> + Send;

    /// Names of all groups the server carries
    fn list_groups(&mut self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Release the connection; safe to call when none is open
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// A lazily opened, self-healing connection to one news server
pub struct Session {
    config: Arc<ServerConfig>,
    client: Option<NntpClient>,
}

impl Session {
    /// Create a session; nothing is sent until the first operation
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Whether a connection is currently held (it may still be dead)
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Return a live, authenticated client, reconnecting if needed
    ///
    /// # Errors
    ///
    /// Only a failed fresh connection surfaces: connection errors from
    /// [`NntpClient::connect`] or [`MirrorError::AuthFailed`].
    pub async fn connect(&mut self) -> Result<&mut NntpClient> {
        let alive = match self.client.as_mut() {
            Some(client) if !client.is_broken() && !client.is_closed() => {
                match client.date().await {
                    Ok(date) => !date.is_empty(),
                    Err(e) => {
                        debug!("Connection failed liveness probe: {}", e);
                        false
                    }
                }
            }
            _ => false,
        };

        if !alive {
            if self.client.take().is_some() {
                info!("Reconnecting to {}:{}", self.config.host, self.config.port);
            }
            let mut client = NntpClient::connect(Arc::clone(&self.config)).await?;
            client.authenticate().await?;
            self.client = Some(client);
        }

        self.client.as_mut().ok_or(MirrorError::ConnectionClosed)
    }
}

impl HeaderSource for Session {
    async fn live_range(&mut self, group: &str) -> Result<ArticleRange> {
        let info = self.connect().await?.select_group(group).await?;
        Ok(info.range())
    }

    async fn retrieve_headers(&mut self, group: &str, range: ArticleRange) -> Result<HeaderBatch> {
        let mut batch = HeaderBatch::new();
        if range.is_empty() {
            return Ok(batch);
        }

        info!("Retrieving articles {} for group {}", range, group);
        let client = self.connect().await?;
        client.select_group(group).await?;

        let started = Instant::now();
        let spec = range.to_string();
        for field in HeaderField::ALL {
            for entry in client.hdr(field.name(), &spec).await? {
                // An empty value means the article lacks the header
                if entry.value.is_empty() {
                    continue;
                }
                if let Err(e) = batch.push_raw(field, entry.article_number, &entry.value) {
                    warn!("Dropping header value: {}", e);
                }
            }
        }

        info!(
            "Downloaded {} article headers in {:?}",
            range.span(),
            started.elapsed()
        );
        Ok(batch)
    }

    async fn list_groups(&mut self) -> Result<Vec<String>> {
        let groups = self.connect().await?.list_active("*").await?;
        Ok(groups.into_iter().map(|group| group.name).collect())
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut client) = self.client.take() else {
            return Ok(());
        };
        match client.quit().await {
            Ok(()) => Ok(()),
            Err(e) if e.is_connection_error() => {
                debug!("Connection already gone at close: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
