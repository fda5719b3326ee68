//! Token verification port.

use crate::domain::AuthenticatedUser;

/// Error type for token verification.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Port trait for the user service that verifies bearer tokens.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// Returns the user the token belongs to, or `None` if the token is
    /// invalid or expired.
    async fn verify(&self, token: &str) -> Result<Option<AuthenticatedUser>, AuthError>;
}
