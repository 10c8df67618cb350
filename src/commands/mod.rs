//! NNTP command builders and response parsers

pub mod group;
pub mod hdr;
pub mod list;
pub mod response;

pub use group::*;
pub use hdr::*;
pub use list::*;
pub use response::*;

// Authentication and session management

/// Build AUTHINFO USER command
pub fn authinfo_user(username: &str) -> String {
    format!("AUTHINFO USER {}\r\n", username)
}

/// Build AUTHINFO PASS command
pub fn authinfo_pass(password: &str) -> String {
    format!("AUTHINFO PASS {}\r\n", password)
}

/// Build QUIT command
pub fn quit() -> &'static str {
    "QUIT\r\n"
}

/// Build DATE command (RFC 3977 §7.1)
///
/// Requests the server's current date and time. Cheap enough to serve as a
/// liveness probe before reusing an idle connection.
/// Response: 111 yyyymmddhhmmss
pub fn date() -> &'static str {
    "DATE\r\n"
}
