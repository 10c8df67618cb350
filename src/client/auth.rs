//! AUTHINFO USER/PASS authentication (RFC 4643 Section 2.3)

use super::NntpClient;
use super::state::ConnectionState;
use crate::commands;
use crate::error::{MirrorError, Result};
use crate::response::codes;
use tracing::debug;

impl NntpClient {
    /// Authenticate with the credentials from the client configuration
    ///
    /// Does nothing when the configuration carries no credentials.
    ///
    /// # Errors
    ///
    /// - [`MirrorError::Protocol`] - Already authenticated
    /// - [`MirrorError::AuthFailed`] - Invalid credentials
    /// - [`MirrorError::ConnectionClosed`] - Server closed the connection
    pub async fn authenticate(&mut self) -> Result<()> {
        let Some(credentials) = self.config.credentials.clone() else {
            debug!("No credentials configured, skipping authentication");
            return Ok(());
        };

        if matches!(self.state, ConnectionState::Authenticated) {
            return Err(MirrorError::Protocol {
                code: codes::ACCESS_DENIED,
                message: "Already authenticated".to_string(),
            });
        }

        debug!("Authenticating as {}", credentials.username);
        self.send_command(&commands::authinfo_user(&credentials.username))
            .await?;
        self.state = ConnectionState::InProgress;

        let mut response = self.read_response().await?;
        if response.code == codes::AUTH_CONTINUE {
            self.send_command(&commands::authinfo_pass(&credentials.password))
                .await?;
            response = self.read_response().await?;
        }

        if response.code != codes::AUTH_ACCEPTED {
            self.state = ConnectionState::Ready;
            return Err(MirrorError::AuthFailed(response.message));
        }

        self.state = ConnectionState::Authenticated;
        debug!("Authentication successful");
        Ok(())
    }
}
