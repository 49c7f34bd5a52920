//! HTTP surface
//!
//! Route composition, shared handler state, and the error-to-response
//! mapping. JSON API routes live under `/api`; browser-facing pages
//! (embed form, OAuth callback relay) at the root.

pub mod donations;
pub mod embed;
pub mod organizations;

use crate::auth::{AuthMiddlewareState, CredentialVault, JwtManager, auth_middleware};
use crate::oauth::flow::{
    OAuthLinkState, create_protected_oauth_link_routes, create_public_oauth_link_routes,
};
use crate::sky::SkyPaymentsClient;
use crate::storage::Storage;
use crate::{GiveFlowError, Result};
use axum::{
    Json, Router, middleware,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the JSON API handlers
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub vault: CredentialVault,
    pub jwt_manager: Arc<JwtManager>,
    pub payments: SkyPaymentsClient,
    /// External base URL of this deployment (embed pages call back into it)
    pub public_base_url: String,
}

/// Error wrapper that maps [`GiveFlowError`] onto HTTP responses.
///
/// Classified OAuth link errors and validation failures surface their
/// specific reason as 400s; everything unexpected becomes a 500 with a
/// generic message, the detail going to the server log only.
pub struct AppError(GiveFlowError);

impl From<GiveFlowError> for AppError {
    fn from(err: GiveFlowError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            GiveFlowError::OAuthLink(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            GiveFlowError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            GiveFlowError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            GiveFlowError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            GiveFlowError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            GiveFlowError::Crypto(msg) => {
                tracing::error!("Crypto failure (key rotation or data corruption?): {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Stored credential could not be decrypted".to_string(),
                )
            }
            GiveFlowError::Http(e) => {
                tracing::error!("Upstream request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Upstream request failed".to_string(),
                )
            }
            other => {
                tracing::error!("Unhandled error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Everything the router needs, constructed once at startup
pub struct RouterDeps {
    pub state: Arc<AppState>,
    pub oauth_link: Arc<OAuthLinkState>,
    pub auth_middleware_state: Arc<AuthMiddlewareState>,
}

/// Compose the full application router.
pub fn create_router(deps: RouterDeps) -> Router {
    let protected_api = Router::new()
        .merge(organizations::create_protected_routes(deps.state.clone()))
        .merge(donations::create_protected_routes(deps.state.clone()))
        .merge(create_protected_oauth_link_routes(deps.oauth_link.clone()))
        .layer(middleware::from_fn_with_state(
            deps.auth_middleware_state,
            auth_middleware,
        ));

    let public_api = Router::new()
        .merge(organizations::create_public_routes(deps.state.clone()))
        .merge(donations::create_public_routes(deps.state.clone()))
        .merge(create_public_oauth_link_routes(deps.oauth_link));

    Router::new()
        .nest("/api", public_api.merge(protected_api))
        .merge(embed::create_routes(deps.state))
}

/// Bind and serve until shutdown.
pub async fn serve(router: Router, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| GiveFlowError::config(format!("Failed to bind {}: {}", bind_addr, e)))?;

    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| GiveFlowError::internal(format!("Server error: {}", e)))?;

    Ok(())
}
