//! HTTP adapter for the user service.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use orders_types::{AuthError, AuthenticatedUser, Authenticator};

/// Verifies bearer tokens by forwarding them to `GET /users/me`.
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    base_url: String,
    http: Client,
}

impl HttpAuthenticator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait::async_trait]
impl Authenticator for HttpAuthenticator {
    async fn verify(&self, token: &str) -> Result<Option<AuthenticatedUser>, AuthError> {
        let resp = self
            .http
            .get(format!("{}/users/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthError::Unavailable("request timed out".into())
                } else {
                    AuthError::Unavailable(e.to_string())
                }
            })?;

        match resp.status() {
            StatusCode::OK => {
                let user = resp
                    .json::<AuthenticatedUser>()
                    .await
                    .map_err(|e| AuthError::Unavailable(format!("invalid user payload: {}", e)))?;
                Ok(Some(user))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                tracing::debug!(status = %resp.status(), "Token rejected by user service");
                Ok(None)
            }
            other => Err(AuthError::Unavailable(format!("HTTP {}", other))),
        }
    }
}
