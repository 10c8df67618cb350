//! Low-level NNTP wire client used by [`Session`](crate::Session)

mod auth;
mod connection;
mod group_ops;
mod io;
mod listing;
mod metadata;
mod server;
mod state;

use crate::config::ServerConfig;
use state::ConnectionState;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tracing::debug;

/// Byte stream an NNTP session runs over: TLS in production, plain TCP for local servers
pub(crate) trait NntpStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> NntpStream for T {}

/// Async NNTP client over a single connection
///
/// Speaks only the commands the mirror needs: authentication, DATE, GROUP,
/// HDR/XHDR, LIST ACTIVE and QUIT.
///
/// # Example
///
/// ```no_run
/// use nntp_mirror::{NntpClient, ServerConfig};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServerConfig::tls("news.example.com").with_credentials("user", "pass");
/// let mut client = NntpClient::connect(Arc::new(config)).await?;
/// client.authenticate().await?;
///
/// let info = client.select_group("comp.lang.rust").await?;
/// let subjects = client.hdr("Subject", &info.range().to_string()).await?;
/// println!("{} subjects", subjects.len());
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct NntpClient {
    /// Buffered stream (both reader and writer)
    stream: BufReader<Box<dyn NntpStream>>,
    /// Connection state
    state: ConnectionState,
    /// Server configuration
    config: Arc<ServerConfig>,
    /// Currently selected newsgroup
    current_group: Option<String>,
    /// Set once the server answered HDR with "unknown command"; XHDR is used afterwards
    hdr_unsupported: bool,
    /// Whether this connection is broken (received garbage/invalid data)
    is_broken: bool,
}

impl NntpClient {
    /// Check if this connection is broken and should be discarded
    pub fn is_broken(&self) -> bool {
        self.is_broken
    }

    /// Mark this connection as broken
    fn mark_broken(&mut self) {
        self.is_broken = true;
    }

    /// Get the currently selected newsgroup, if any
    pub fn current_group(&self) -> Option<&str> {
        self.current_group.as_deref()
    }

    /// Check if the client is currently authenticated
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, ConnectionState::Authenticated)
    }

    /// Check if QUIT has been sent on this connection
    pub fn is_closed(&self) -> bool {
        matches!(self.state, ConnectionState::Closed)
    }

    /// Server configuration this client was created from
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl Drop for NntpClient {
    fn drop(&mut self) {
        debug!("NntpClient for {} dropped", self.config.host);
    }
}
