//! JWT authentication middleware
//!
//! Validates the Bearer token on protected routes and inserts an
//! [`OrgContext`] into request extensions for handlers to consume.

use super::JwtManager;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Shared state for the auth middleware
pub struct AuthMiddlewareState {
    pub jwt_manager: Arc<JwtManager>,
}

/// Authenticated organization context (extracted from JWT)
#[derive(Debug, Clone)]
pub struct OrgContext {
    pub organization_id: String,
}

/// Validates the JWT and inserts [`OrgContext`] into request extensions.
///
/// Returns 401 if the Authorization header is missing, not a Bearer token,
/// or the JWT is invalid/expired.
pub async fn auth_middleware(
    State(state): State<Arc<AuthMiddlewareState>>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = state.jwt_manager.validate_token(token).map_err(|e| {
        tracing::warn!("JWT validation failed: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(OrgContext {
        organization_id: claims.sub,
    });

    Ok(next.run(req).await)
}
