//! Authentication middleware for bearer tokens.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use orders_types::{InventoryClient, OrderStore};

use super::handlers::AppState;

/// Paths served without a token.
const PUBLIC_PATHS: [&str; 2] = ["/health", "/api-docs/openapi.json"];

/// Extracts the token from the Authorization header.
/// Expected format: "Bearer <token>" or just "<token>"
fn extract_token(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;
    Some(header.strip_prefix("Bearer ").unwrap_or(header).trim())
}

/// Authentication middleware backed by the user service.
///
/// This middleware:
/// 1. Extracts the bearer token from the Authorization header
/// 2. Resolves it to a user through the `Authenticator` port
/// 3. Rejects unknown tokens with 401 and unverified users with 403
/// 4. Stores the `AuthenticatedUser` in the request extensions for handlers
pub async fn auth_middleware<R: OrderStore, I: InventoryClient>(
    State(state): State<Arc<AppState<R, I>>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    let token = match extract_token(auth_header) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "Missing or invalid Authorization header",
            );
        }
    };

    match state.authenticator.verify(&token).await {
        Ok(Some(user)) if !user.is_verified => {
            tracing::debug!(user_id = %user.id, "Rejecting unverified user");
            error_response(StatusCode::FORBIDDEN, "Email not verified")
        }
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => error_response(StatusCode::UNAUTHORIZED, "Invalid or expired token"),
        Err(e) => {
            tracing::error!("Token verification failed: {}", e);
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Authentication service unavailable",
            )
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": message,
            "code": status.as_u16()
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_bearer() {
        assert_eq!(extract_token(Some("Bearer tok_123")), Some("tok_123"));
    }

    #[test]
    fn test_extract_token_raw() {
        assert_eq!(extract_token(Some("tok_123")), Some("tok_123"));
    }

    #[test]
    fn test_extract_token_none() {
        assert_eq!(extract_token(None), None);
    }

    #[test]
    fn test_extract_token_empty_bearer() {
        assert_eq!(extract_token(Some("Bearer ")), Some(""));
    }
}
