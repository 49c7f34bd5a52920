//! Core data model
//!
//! Typed records for everything that crosses the storage boundary. Raw rows
//! are deserialized into these at the storage layer and never leak out as
//! untyped maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tenant: one nonprofit with a single admin account.
///
/// The OAuth linkage fields (`oauth_state`, `temp_app_id`, `temp_app_secret`)
/// are mutated only by the BBMS linking flow and hold at most one pending
/// attempt at a time. Secret-bearing fields store vault ciphertext, never
/// plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub admin_email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// BBMS merchant account id (set by linking or manual configuration)
    pub merchant_id: Option<String>,
    /// Vault-encrypted SKY access token
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Vault-encrypted SKY refresh token
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,

    /// Pending OAuth correlation token (`{org_id}:{random}`), if a linking
    /// flow has been started and not yet completed
    #[serde(skip_serializing)]
    pub oauth_state: Option<String>,
    /// Tenant-supplied Blackbaud app id for the pending flow (not a secret)
    pub temp_app_id: Option<String>,
    /// Vault-encrypted tenant-supplied app secret for the pending flow
    #[serde(skip_serializing)]
    pub temp_app_secret: Option<String>,

    /// Sandbox vs production processing; organizations start in test mode
    pub test_mode: bool,
    pub form_settings: FormSettings,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Whether this organization can accept donations.
    pub fn has_payments_configured(&self) -> bool {
        self.access_token.is_some() && self.merchant_id.is_some()
    }
}

/// Donation form customization, stored as a JSON document on the organization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormSettings {
    pub preset_amounts: Vec<u32>,
    pub custom_amount_enabled: bool,
    pub required_fields: Vec<String>,
    pub organization_description: String,
    pub thank_you_message: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            preset_amounts: vec![25, 50, 100, 250, 500],
            custom_amount_enabled: true,
            required_fields: vec!["name".to_string(), "email".to_string()],
            organization_description: "Help us make a difference".to_string(),
            thank_you_message: "Thank you for your generous donation!".to_string(),
        }
    }
}

/// Lifecycle of a donation checkout session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

/// A donation checkout recorded at session-creation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationTransaction {
    pub id: String,
    /// SKY checkout session id
    pub session_id: Option<String>,
    pub organization_id: String,
    /// Amount in whole currency units (converted to cents at the SKY boundary)
    pub amount: f64,
    pub donor_name: String,
    pub donor_email: String,
    pub status: TransactionStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
