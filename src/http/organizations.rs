//! Organization account handlers
//!
//! Registration, login, profile, payments configuration, and form settings.

use super::{AppError, AppState};
use crate::auth::{
    AuthResponse, LoginRequest, OrgContext, OrganizationInfo, RegisterRequest, hash_password,
    validate_password_strength, verify_password,
};
use crate::model::{FormSettings, Organization};
use crate::{GiveFlowError, Result};
use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

/// Manually supplied BBMS credentials (bypassing the OAuth flow)
#[derive(Debug, Deserialize)]
pub struct ConfigureBbmsRequest {
    pub merchant_id: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct TestModeRequest {
    pub test_mode: bool,
}

/// Routes that require no authentication
pub fn create_public_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/organizations/register", post(register))
        .route("/organizations/login", post(login))
        .with_state(state)
}

/// Routes protected by the JWT auth middleware
pub fn create_protected_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/organizations/me", get(me))
        .route("/organizations/form-settings", put(update_form_settings))
        .route("/organizations/test-mode", put(set_test_mode))
        .route("/organizations/configure-bbms", post(configure_bbms))
        .with_state(state)
}

/// POST /api/organizations/register
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> std::result::Result<Json<AuthResponse>, AppError> {
    if req.name.trim().is_empty() {
        return Err(GiveFlowError::validation("Organization name is required").into());
    }
    if !is_valid_email(&req.admin_email) {
        return Err(GiveFlowError::validation("Invalid email address").into());
    }
    validate_password_strength(&req.admin_password)?;

    if state
        .storage
        .get_organization_by_email(&req.admin_email)
        .await?
        .is_some()
    {
        return Err(
            GiveFlowError::validation("Organization with this email already exists").into(),
        );
    }

    let now = Utc::now();
    let org = Organization {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        admin_email: req.admin_email.clone(),
        password_hash: hash_password(&req.admin_password)?,
        merchant_id: None,
        access_token: None,
        refresh_token: None,
        oauth_state: None,
        temp_app_id: None,
        temp_app_secret: None,
        test_mode: true, // organizations start in sandbox mode for safety
        form_settings: FormSettings::default(),
        created_at: now,
        updated_at: now,
    };

    state.storage.create_organization(&org).await?;

    tracing::info!("Registered organization {} ({})", org.id, org.admin_email);

    Ok(Json(issue_auth_response(&state, org)?))
}

/// POST /api/organizations/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> std::result::Result<Json<AuthResponse>, AppError> {
    let org = state
        .storage
        .get_organization_by_email(&req.email)
        .await?
        .ok_or_else(|| GiveFlowError::auth("Invalid email or password"))?;

    if !verify_password(&req.password, &org.password_hash)? {
        tracing::warn!("Failed login attempt for {}", req.email);
        return Err(GiveFlowError::auth("Invalid email or password").into());
    }

    Ok(Json(issue_auth_response(&state, org)?))
}

/// GET /api/organizations/me
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<OrgContext>,
) -> std::result::Result<Json<Value>, AppError> {
    let org = load_org(&state, &ctx.organization_id).await?;

    // No token or secret material in the profile
    Ok(Json(json!({
        "id": org.id,
        "name": org.name,
        "email": org.admin_email,
        "has_payments_configured": org.has_payments_configured(),
        "test_mode": org.test_mode,
        "form_settings": org.form_settings,
        "created_at": org.created_at,
    })))
}

/// PUT /api/organizations/form-settings
async fn update_form_settings(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<OrgContext>,
    Json(settings): Json<FormSettings>,
) -> std::result::Result<Json<Value>, AppError> {
    if settings.preset_amounts.is_empty() && !settings.custom_amount_enabled {
        return Err(GiveFlowError::validation(
            "Form needs preset amounts or a custom amount field",
        )
        .into());
    }

    state
        .storage
        .update_form_settings(&ctx.organization_id, &settings)
        .await?;

    Ok(Json(json!({ "message": "Form settings updated successfully" })))
}

/// PUT /api/organizations/test-mode
async fn set_test_mode(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<OrgContext>,
    Json(req): Json<TestModeRequest>,
) -> std::result::Result<Json<Value>, AppError> {
    state
        .storage
        .set_test_mode(&ctx.organization_id, req.test_mode)
        .await?;

    let mode = if req.test_mode { "test" } else { "production" };
    Ok(Json(json!({
        "message": format!("Switched to {} mode successfully", mode)
    })))
}

/// POST /api/organizations/configure-bbms
///
/// Manual credential entry. The token is probed against the SKY API in the
/// organization's current mode before being encrypted and stored.
async fn configure_bbms(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<OrgContext>,
    Json(req): Json<ConfigureBbmsRequest>,
) -> std::result::Result<Json<Value>, AppError> {
    let org = load_org(&state, &ctx.organization_id).await?;

    if !state
        .payments
        .test_credentials(&req.access_token, org.test_mode)
        .await
    {
        let mode = if org.test_mode { "test" } else { "production" };
        return Err(GiveFlowError::validation(format!(
            "Invalid Blackbaud credentials for {} environment",
            mode
        ))
        .into());
    }

    let encrypted = state.vault.encrypt(&req.access_token)?;
    state
        .storage
        .set_manual_credentials(&ctx.organization_id, &req.merchant_id, encrypted.as_str())
        .await?;

    Ok(Json(json!({ "message": "BBMS credentials configured successfully" })))
}

// ============================================================================
// Helpers
// ============================================================================

fn issue_auth_response(state: &AppState, org: Organization) -> Result<AuthResponse> {
    let access_token = state.jwt_manager.issue_token(&org.id)?;

    Ok(AuthResponse {
        access_token,
        expires_in: state.jwt_manager.token_ttl_seconds(),
        organization: OrganizationInfo {
            id: org.id,
            name: org.name,
            email: org.admin_email,
        },
    })
}

async fn load_org(state: &AppState, organization_id: &str) -> Result<Organization> {
    state
        .storage
        .get_organization(organization_id)
        .await?
        .ok_or_else(|| GiveFlowError::not_found("Organization", organization_id))
}

/// Basic email shape check
fn is_valid_email(email: &str) -> bool {
    email.contains('@')
        && email.contains('.')
        && email.len() > 5
        && !email.starts_with('@')
        && !email.ends_with('@')
}
