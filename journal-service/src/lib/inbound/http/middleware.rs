use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::REDACTED_MESSAGE;
use crate::inbound::http::router::AppState;

pub const MISSING_TOKEN_MESSAGE: &str = "No token provided";

/// Every token rejection shares this body so clients cannot tell the reasons apart.
pub const INVALID_TOKEN_MESSAGE: &str = "Expired or invalid token, please log in";

/// Extension type to store the authenticated identity in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub claims: auth::Claims,
}

/// Middleware that verifies the bearer token and adds the identity to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_header(&req)?;

    let claims: auth::Claims = state.authenticator.verify_token(token).map_err(|e| {
        if e.is_invalid_token() {
            tracing::warn!(reason = ?e, "Token rejected");
            ApiError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
        } else {
            tracing::error!("Token verification unavailable: {}", e);
            ApiError::InternalServerError(e.to_string())
        }
    })?;

    let user_id = UserId::from_string(&claims.id).map_err(|e| {
        tracing::warn!("Token subject is not a user ID: {}", e);
        ApiError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
    })?;

    req.extensions_mut()
        .insert(AuthenticatedUser { user_id, claims });

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized(MISSING_TOKEN_MESSAGE.to_string()))?;

    let auth_str = auth_header.to_str().map_err(|_| {
        tracing::warn!("Token rejected: Authorization header is not visible ASCII");
        ApiError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
    })?;

    auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!("Token rejected: Authorization scheme is not Bearer");
        ApiError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
    })
}

/// Middleware that hides 500 details from clients in production.
///
/// Handler errors and caught panics both pass through here, so no internal
/// message reaches a production client.
pub async fn redact_internal_errors(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;

    if state.production && response.status() == StatusCode::INTERNAL_SERVER_ERROR {
        return ApiError::InternalServerError(REDACTED_MESSAGE.to_string()).into_response();
    }

    response
}
