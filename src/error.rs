//! Error types for the mirror: protocol, storage and filter failures

use thiserror::Error;

/// Errors raised while talking to the news server or the local store
#[derive(Error, Debug)]
pub enum MirrorError {
    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS error during secure connection
    #[error("TLS error: {0}")]
    Tls(String),

    /// Connection or read timeout
    #[error("Connection timeout")]
    Timeout,

    /// Connection closed unexpectedly
    #[error("Connection closed")]
    ConnectionClosed,

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// NNTP protocol error with response code
    #[error("NNTP error {code}: {message}")]
    Protocol {
        /// NNTP response code (e.g., 411, 480, 502)
        code: u16,
        /// Error message from server
        message: String,
    },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The server rejected the newsgroup name
    #[error("No such newsgroup: {0}")]
    GroupNotFound(String),

    /// No newsgroup selected
    #[error("No newsgroup selected")]
    NoGroupSelected,

    /// A single header value could not be normalized
    ///
    /// Only ever reported per article; the offending value is dropped and the
    /// rest of the batch is kept.
    #[error("Malformed {header} header for article {article}: {reason}")]
    MalformedHeader {
        /// Article the value belongs to
        article: u64,
        /// Header field name (e.g. "Date")
        header: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// The local store could not be opened, read or written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A query filter names an unknown column or carries an unusable predicate
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
}

impl MirrorError {
    /// Whether this error came from the transport rather than the protocol or the store
    ///
    /// These are the failures a caller may want to answer with a fresh
    /// connection on its next attempt.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            MirrorError::Io(_)
                | MirrorError::Tls(_)
                | MirrorError::Timeout
                | MirrorError::ConnectionClosed
                | MirrorError::InvalidResponse(_)
        )
    }
}

impl From<rusqlite::Error> for MirrorError {
    fn from(e: rusqlite::Error) -> Self {
        MirrorError::StorageUnavailable(e.to_string())
    }
}

/// Result type alias using MirrorError
pub type Result<T> = std::result::Result<T, MirrorError>;
