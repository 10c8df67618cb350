//! NNTP server configuration

/// Username and password sent with AUTHINFO USER/PASS
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credentials {
    /// Username for authentication
    pub username: String,
    /// Password for authentication
    pub password: String,
}

/// NNTP server configuration
///
/// Contains everything needed to reach the server whose headers are mirrored.
/// The `host` doubles as the server identity in the local store, so two
/// configurations with the same host share cached groups.
///
/// # Example
///
/// ```
/// use nntp_mirror::ServerConfig;
///
/// let config = ServerConfig::tls("news.example.com").with_credentials("user", "pass");
/// assert_eq!(config.port, 563);
/// assert!(config.credentials.is_some());
/// ```
#[must_use]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerConfig {
    /// Server hostname (e.g., "news.example.com")
    pub host: String,

    /// Server port (typically 563 for TLS, 119 for plain)
    pub port: u16,

    /// Use TLS/SSL encryption
    ///
    /// Plain connections exist for local test servers; anything reachable over
    /// a network should stay on TLS.
    #[cfg_attr(feature = "serde", serde(default = "default_tls"))]
    pub tls: bool,

    /// Allow insecure TLS connections (self-signed certificates, expired certificates)
    ///
    /// **Security Warning:** Setting this to `true` disables certificate validation,
    /// making your connection vulnerable to man-in-the-middle attacks.
    ///
    /// Default: `false` (secure certificate validation enabled)
    #[cfg_attr(feature = "serde", serde(default))]
    pub allow_insecure_tls: bool,

    /// Credentials, if the server requires authentication
    #[cfg_attr(feature = "serde", serde(default))]
    pub credentials: Option<Credentials>,
}

#[cfg(feature = "serde")]
fn default_tls() -> bool {
    true
}

impl ServerConfig {
    /// Create a new server configuration without credentials
    pub fn new(host: impl Into<String>, port: u16, tls: bool) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            allow_insecure_tls: false,
            credentials: None,
        }
    }

    /// Create a configuration for a TLS connection on the standard secure port (563)
    pub fn tls(host: impl Into<String>) -> Self {
        Self::new(host, 563, true)
    }

    /// Create a configuration for a plain connection on the standard port (119)
    ///
    /// **Warning:** Plain connections transmit credentials in clear text.
    pub fn plain(host: impl Into<String>) -> Self {
        Self::new(host, 119, false)
    }

    /// Create a TLS configuration that accepts self-signed certificates
    ///
    /// **Security Warning:** This configuration disables certificate validation.
    pub fn tls_insecure(host: impl Into<String>) -> Self {
        let mut config = Self::tls(host);
        config.allow_insecure_tls = true;
        config
    }

    /// Use a different port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Authenticate with AUTHINFO USER/PASS after connecting
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }
}
