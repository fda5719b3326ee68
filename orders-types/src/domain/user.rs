//! The caller identity returned by the user service.

use serde::{Deserialize, Serialize};

use super::ids::UserId;
use crate::error::DomainError;

/// A user whose bearer token was verified by the user service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_admin: bool,
}

impl AuthenticatedUser {
    /// Fails with `Forbidden` unless the user holds the admin capability.
    pub fn ensure_admin(&self, action: &str) -> Result<(), DomainError> {
        if !self.is_admin {
            return Err(DomainError::Forbidden(format!(
                "Only administrators can {}",
                action
            )));
        }
        Ok(())
    }
}
