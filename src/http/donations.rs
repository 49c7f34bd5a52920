//! Donation handlers
//!
//! Public checkout creation and status lookup, the public form
//! configuration endpoint the embed page reads, and the authenticated
//! transaction listing.

use super::{AppError, AppState};
use crate::auth::OrgContext;
use crate::model::{DonationTransaction, TransactionStatus};
use crate::sky::CheckoutRequest;
use crate::GiveFlowError;
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

/// Most transactions returned by the listing endpoint
const TRANSACTION_LIST_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct DonationRequest {
    pub amount: f64,
    pub donor_name: String,
    pub donor_email: String,
    pub org_id: String,
    #[serde(default)]
    pub custom_fields: Option<Value>,
}

/// Routes that require no authentication (called by the embed form)
pub fn create_public_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/donations/checkout", post(create_checkout))
        .route("/donations/status/{session_id}", get(donation_status))
        .route(
            "/organizations/{org_id}/donation-form",
            get(donation_form_config),
        )
        .with_state(state)
}

/// Routes protected by the JWT auth middleware
pub fn create_protected_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/organizations/{org_id}/transactions",
            get(list_transactions),
        )
        .with_state(state)
}

/// POST /api/donations/checkout
///
/// Public: called by the embedded donation form. Requires the organization
/// to have linked (or manually configured) payment credentials.
async fn create_checkout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DonationRequest>,
) -> std::result::Result<Json<Value>, AppError> {
    if req.amount <= 0.0 || !req.amount.is_finite() {
        return Err(GiveFlowError::validation("Donation amount must be positive").into());
    }
    if req.donor_name.trim().is_empty() || req.donor_email.trim().is_empty() {
        return Err(GiveFlowError::validation("Donor name and email are required").into());
    }

    let org = state
        .storage
        .get_organization(&req.org_id)
        .await?
        .ok_or_else(|| GiveFlowError::not_found("Organization", &req.org_id))?;

    let (encrypted_token, merchant_id) = match (&org.access_token, &org.merchant_id) {
        (Some(token), Some(merchant)) => (token.as_str(), merchant.as_str()),
        _ => {
            return Err(GiveFlowError::validation(
                "Organization has not configured payment processing",
            )
            .into());
        }
    };

    let access_token = state.vault.decrypt_stored(encrypted_token)?;

    let session = state
        .payments
        .create_checkout(CheckoutRequest {
            merchant_id,
            access_token: &access_token,
            amount: req.amount,
            donor_name: &req.donor_name,
            donor_email: &req.donor_email,
            organization_id: &org.id,
            test_mode: org.test_mode,
        })
        .await?;

    let transaction = DonationTransaction {
        id: Uuid::new_v4().to_string(),
        session_id: session.id.clone(),
        organization_id: org.id.clone(),
        amount: req.amount,
        donor_name: req.donor_name,
        donor_email: req.donor_email,
        status: TransactionStatus::Pending,
        metadata: req.custom_fields.unwrap_or_else(|| json!({})),
        created_at: Utc::now(),
        completed_at: None,
    };
    state.storage.insert_transaction(&transaction).await?;

    Ok(Json(json!({
        "session_id": session.id,
        "checkout_url": session.checkout_url,
    })))
}

/// GET /api/donations/status/{session_id}
async fn donation_status(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> std::result::Result<Json<Value>, AppError> {
    let transaction = state
        .storage
        .get_transaction_by_session(&session_id)
        .await?
        .ok_or_else(|| GiveFlowError::not_found("Transaction", &session_id))?;

    Ok(Json(json!({
        "status": transaction.status,
        "amount": transaction.amount,
        "donor_name": transaction.donor_name,
        "created_at": transaction.created_at,
    })))
}

/// GET /api/organizations/{org_id}/donation-form
///
/// Public form configuration for the embed page.
async fn donation_form_config(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<String>,
) -> std::result::Result<Json<Value>, AppError> {
    let org = state
        .storage
        .get_organization(&org_id)
        .await?
        .ok_or_else(|| GiveFlowError::not_found("Organization", &org_id))?;

    Ok(Json(json!({
        "organization_name": org.name,
        "description": org.form_settings.organization_description,
        "preset_amounts": org.form_settings.preset_amounts,
        "custom_amount_enabled": org.form_settings.custom_amount_enabled,
        "required_fields": org.form_settings.required_fields,
        "thank_you_message": org.form_settings.thank_you_message,
    })))
}

/// GET /api/organizations/{org_id}/transactions
///
/// Admin-only; an authenticated organization can only read its own list.
async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<OrgContext>,
    Path(org_id): Path<String>,
) -> std::result::Result<Json<Vec<DonationTransaction>>, AppError> {
    if org_id != ctx.organization_id {
        return Err(GiveFlowError::forbidden("Access denied").into());
    }

    let transactions = state
        .storage
        .list_transactions(&org_id, TRANSACTION_LIST_LIMIT)
        .await?;

    Ok(Json(transactions))
}
