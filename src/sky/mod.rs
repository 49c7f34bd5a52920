//! Blackbaud SKY payments client
//!
//! Checkout creation and credential probing against the SKY API. The base
//! URL switches between production and sandbox per the organization's test
//! mode; every request carries the subscription key plus the tenant's
//! bearer token (decrypted by the caller).

use crate::{GiveFlowError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed timeout for SKY API calls
const SKY_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Checkout creation request, as sent to `/payments/v1/checkouts`
#[derive(Debug, Serialize)]
struct CheckoutPayload<'a> {
    merchant_account_id: &'a str,
    amount: CheckoutAmount,
    return_url: &'a str,
    cancel_url: &'a str,
    metadata: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct CheckoutAmount {
    /// Cents
    value: i64,
    currency: &'static str,
}

/// Checkout session returned by the SKY payments API
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: Option<String>,
    pub checkout_url: Option<String>,
}

/// Parameters for a checkout creation
#[derive(Debug)]
pub struct CheckoutRequest<'a> {
    pub merchant_id: &'a str,
    pub access_token: &'a str,
    /// Whole currency units
    pub amount: f64,
    pub donor_name: &'a str,
    pub donor_email: &'a str,
    pub organization_id: &'a str,
    pub test_mode: bool,
}

/// Client for the SKY payments and account APIs
#[derive(Clone)]
pub struct SkyPaymentsClient {
    http_client: reqwest::Client,
    api_base_url: String,
    sandbox_api_base_url: String,
    /// External base URL of this deployment, for checkout return/cancel pages
    public_base_url: String,
    payment_subscription_key: String,
    standard_subscription_key: String,
}

impl SkyPaymentsClient {
    pub fn new(config: &crate::config::BlackbaudConfig, public_base_url: String) -> Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            .timeout(SKY_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                GiveFlowError::config(format!("Failed to build HTTP client for SKY API: {}", e))
            })?;

        Ok(Self {
            http_client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            sandbox_api_base_url: config.sandbox_api_base_url.trim_end_matches('/').to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            payment_subscription_key: config.payment_subscription_key.clone(),
            standard_subscription_key: config.standard_subscription_key.clone(),
        })
    }

    fn base_url(&self, test_mode: bool) -> &str {
        if test_mode {
            &self.sandbox_api_base_url
        } else {
            &self.api_base_url
        }
    }

    /// Create a payment checkout session.
    pub async fn create_checkout(&self, req: CheckoutRequest<'_>) -> Result<CheckoutSession> {
        let return_url = format!("{}/donate/success", self.public_base_url);
        let cancel_url = format!("{}/donate/cancel", self.public_base_url);
        let payload = CheckoutPayload {
            merchant_account_id: req.merchant_id,
            amount: CheckoutAmount {
                value: (req.amount * 100.0).round() as i64,
                currency: "USD",
            },
            return_url: &return_url,
            cancel_url: &cancel_url,
            metadata: serde_json::json!({
                "donor_email": req.donor_email,
                "donor_name": req.donor_name,
                "org_id": req.organization_id,
                "test_mode": if req.test_mode { "true" } else { "false" },
            }),
        };

        let mode = if req.test_mode { "sandbox" } else { "production" };
        tracing::info!("Creating checkout in {} mode for ${:.2}", mode, req.amount);

        let response = self
            .http_client
            .post(format!("{}/payments/v1/checkouts", self.base_url(req.test_mode)))
            .header("Bb-Api-Subscription-Key", &self.payment_subscription_key)
            .bearer_auth(req.access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Checkout creation failed: {} - {}", status, body);
            return Err(GiveFlowError::validation(format!(
                "Failed to create checkout: {}",
                body
            )));
        }

        let session: CheckoutSession = response.json().await?;
        tracing::info!(
            "Checkout created successfully: {} in {} mode",
            session.id.as_deref().unwrap_or("<no id>"),
            mode
        );

        Ok(session)
    }

    /// Probe whether an access token is accepted by the SKY API.
    ///
    /// Used by manual credential configuration; a transport failure counts
    /// as invalid rather than erroring, since the caller only needs a
    /// yes/no.
    pub async fn test_credentials(&self, access_token: &str, test_mode: bool) -> bool {
        for endpoint in ["/oauth/subscriptions", "/oauth/userinfo"] {
            let result = self
                .http_client
                .get(format!("{}{}", self.base_url(test_mode), endpoint))
                .header("Bb-Api-Subscription-Key", &self.standard_subscription_key)
                .bearer_auth(access_token)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => return true,
                Ok(response) => {
                    tracing::debug!(
                        "Credential probe {} returned {}",
                        endpoint,
                        response.status()
                    );
                }
                Err(e) => {
                    tracing::warn!("Credential probe failed: {}", e);
                    return false;
                }
            }
        }

        false
    }
}
