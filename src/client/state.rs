//! Connection state for the NNTP client

/// NNTP connection state tracking authentication progress (RFC 4643)
pub(super) enum ConnectionState {
    /// Connected and ready for commands (not authenticated)
    Ready,
    /// AUTHINFO USER sent, waiting for the PASS exchange to finish
    InProgress,
    /// Successfully authenticated
    Authenticated,
    /// QUIT sent
    Closed,
}
