//! OAuth flow orchestrator
//!
//! Ties the state issuer, credential vault, and token client together into
//! the start/callback protocol, plus the two HTTP routes that expose it.
//!
//! Per-organization linkage state machine:
//! `UNLINKED` -> (start) -> `PENDING(state, temp_app_id, temp_app_secret)`
//! -> (callback success) -> `LINKED(access_token, merchant_id, [refresh])`.
//! A failed callback leaves `PENDING` untouched; a second start overwrites
//! it. Re-linking from `LINKED` issues a fresh `PENDING` and the old tokens
//! survive until the commit overwrites them.
//!
//! There is deliberately no transactional guard between state verification
//! and the commit that clears it: a concurrent callback reusing a still-valid
//! state would pass verification but its code exchange fails upstream, since
//! authorization codes are single-use.

use super::exchange::SkyTokenClient;
use super::{OAuthSettings, state};
use crate::auth::{CredentialVault, OrgContext};
use crate::error::OAuthLinkError;
use crate::http::AppError;
use crate::storage::Storage;
use crate::{GiveFlowError, Result};
use axum::{Extension, Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use url::Url;

/// Request to start the linking flow
#[derive(Debug, Deserialize)]
pub struct StartLinkRequest {
    pub merchant_id: String,
    pub app_id: String,
    pub app_secret: String,
}

/// Response to a successful start
#[derive(Debug, Serialize)]
pub struct StartLinkResponse {
    pub oauth_url: String,
    pub state: String,
}

/// Callback payload relayed by the browser after Blackbaud redirects
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub code: String,
    pub state: String,
    pub merchant_id: String,
}

/// Orchestrates the two-phase BBMS linking protocol.
///
/// All collaborators are injected once at startup; each invocation is an
/// independent request-response operation with no in-memory state shared
/// across requests.
pub struct OAuthFlowOrchestrator {
    storage: Arc<dyn Storage>,
    vault: CredentialVault,
    token_client: SkyTokenClient,
    settings: OAuthSettings,
}

impl OAuthFlowOrchestrator {
    pub fn new(
        storage: Arc<dyn Storage>,
        vault: CredentialVault,
        token_client: SkyTokenClient,
        settings: OAuthSettings,
    ) -> Self {
        Self {
            storage,
            vault,
            token_client,
            settings,
        }
    }

    /// Phase 1: persist a pending linking attempt and build the
    /// authorization URL.
    ///
    /// Overwrites any prior pending state for the organization, so at most
    /// one attempt is valid at a time.
    pub async fn start(&self, organization_id: &str, req: StartLinkRequest) -> Result<StartLinkResponse> {
        let state_token = state::issue_state(organization_id);

        let encrypted_secret = self.vault.encrypt(&req.app_secret)?;
        self.storage
            .begin_oauth_link(
                organization_id,
                &state_token,
                &req.merchant_id,
                &req.app_id,
                encrypted_secret.as_str(),
            )
            .await?;

        let oauth_url = self.build_authorization_url(&req.app_id, &state_token)?;

        tracing::info!("Started BBMS OAuth flow for organization {}", organization_id);

        Ok(StartLinkResponse {
            oauth_url,
            state: state_token,
        })
    }

    /// Phase 2: verify the state, exchange the code, commit the tokens.
    ///
    /// On any failure before the commit the pending state is left untouched,
    /// so the caller may retry with a fresh authorization code under the
    /// same state.
    pub async fn callback(&self, req: CallbackRequest) -> Result<String> {
        // Format check first, before touching the store
        let (org_id, _) = state::split_state(&req.state)?;

        let org = self
            .storage
            .get_organization(org_id)
            .await?
            .ok_or(OAuthLinkError::OrganizationNotFound)?;

        if !state::verify_state(&req.state, org.oauth_state.as_deref()) {
            tracing::warn!(
                "OAuth state mismatch for organization {} (replayed or foreign token)",
                org_id
            );
            return Err(OAuthLinkError::InvalidOrExpiredState.into());
        }

        let (app_id, encrypted_secret) = match (&org.temp_app_id, &org.temp_app_secret) {
            (Some(id), Some(secret)) => (id.as_str(), secret.as_str()),
            _ => return Err(OAuthLinkError::MissingAppCredentials.into()),
        };
        let app_secret = self.vault.decrypt_stored(encrypted_secret)?;

        let token = self
            .token_client
            .exchange_code(app_id, &app_secret, &req.code, &self.settings.callback_url)
            .await?;

        let access_token = token
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(OAuthLinkError::NoAccessTokenReceived)?;

        let encrypted_access = self.vault.encrypt(access_token)?;
        let encrypted_refresh = token
            .refresh_token
            .as_deref()
            .map(|t| self.vault.encrypt(t))
            .transpose()?;

        // One-time-use commit: tokens in, pending state and temp
        // credentials cleared, merchant id taken from the callback payload
        // (which may differ from the one supplied at start).
        self.storage
            .complete_oauth_link(
                org_id,
                encrypted_access.as_str(),
                encrypted_refresh.as_ref().map(|e| e.as_str()),
                &req.merchant_id,
            )
            .await?;

        tracing::info!("Completed BBMS OAuth flow for organization {}", org_id);

        Ok(org_id.to_string())
    }

    fn build_authorization_url(&self, app_id: &str, state_token: &str) -> Result<String> {
        let mut url = Url::parse(&format!(
            "{}/authorization",
            self.settings.oauth_base_url.trim_end_matches('/')
        ))
        .map_err(|e| GiveFlowError::config(format!("Invalid OAuth base URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", app_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.settings.callback_url)
            .append_pair("state", state_token)
            .append_pair("scope", &self.settings.scope);

        Ok(url.to_string())
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Shared state for the OAuth link routes
pub struct OAuthLinkState {
    pub orchestrator: OAuthFlowOrchestrator,
}

/// Protected route: starting a flow requires an authenticated admin.
pub fn create_protected_oauth_link_routes(state: Arc<OAuthLinkState>) -> Router {
    Router::new()
        .route("/organizations/bbms-oauth/start", post(start_handler))
        .with_state(state)
}

/// Public route: Blackbaud's redirect is relayed here by the browser;
/// the state token is the only credential.
pub fn create_public_oauth_link_routes(state: Arc<OAuthLinkState>) -> Router {
    Router::new()
        .route("/organizations/bbms-oauth/callback", post(callback_handler))
        .with_state(state)
}

/// Combined routes (callers applying auth middleware should compose the
/// protected and public routers separately).
pub fn create_oauth_link_routes(state: Arc<OAuthLinkState>) -> Router {
    Router::new()
        .merge(create_protected_oauth_link_routes(state.clone()))
        .merge(create_public_oauth_link_routes(state))
}

async fn start_handler(
    State(state): State<Arc<OAuthLinkState>>,
    Extension(ctx): Extension<OrgContext>,
    Json(req): Json<StartLinkRequest>,
) -> std::result::Result<Json<StartLinkResponse>, AppError> {
    let response = state.orchestrator.start(&ctx.organization_id, req).await?;
    Ok(Json(response))
}

async fn callback_handler(
    State(state): State<Arc<OAuthLinkState>>,
    Json(req): Json<CallbackRequest>,
) -> std::result::Result<Json<Value>, AppError> {
    let organization_id = state.orchestrator.callback(req).await?;
    Ok(Json(json!({
        "message": "OAuth flow completed successfully",
        "organization_id": organization_id,
    })))
}
