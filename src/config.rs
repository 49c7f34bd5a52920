//! Process configuration
//!
//! Everything is supplied through environment variables and validated once at
//! startup. Components receive the parts they need by value; nothing reads
//! the environment after boot.

use crate::{GiveFlowError, Result};

/// Storage backend configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Database path (e.g. ".giveflow/giveflow.db" or ":memory:")
    pub dsn: String,
}

/// Blackbaud endpoints and per-deployment OAuth parameters
#[derive(Debug, Clone)]
pub struct BlackbaudConfig {
    /// OAuth authorization server base (authorization + token endpoints)
    pub oauth_base_url: String,
    /// SKY API base for production merchants
    pub api_base_url: String,
    /// SKY API base for sandbox merchants (organizations in test mode)
    pub sandbox_api_base_url: String,
    /// Fixed redirect URI registered with every tenant's Blackbaud app
    pub callback_url: String,
    /// Fixed scope string requested during authorization
    pub oauth_scope: String,
    /// Subscription key for the payments API
    pub payment_subscription_key: String,
    /// Subscription key for the standard (credential-probe) API
    pub standard_subscription_key: String,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address, e.g. "0.0.0.0:8000"
    pub bind_addr: String,
    /// External base URL of this deployment (used by embed pages)
    pub public_base_url: String,
    pub storage: StorageConfig,
    pub blackbaud: BlackbaudConfig,
    /// JWT signing secret (validated in auth::jwt)
    pub jwt_secret: String,
    /// Passphrase the credential vault derives its key from
    pub encryption_passphrase: String,
}

const DEFAULT_OAUTH_BASE: &str = "https://oauth2.sky.blackbaud.com";
const DEFAULT_API_BASE: &str = "https://api.sky.blackbaud.com";
const DEFAULT_SANDBOX_API_BASE: &str = "https://api.sky.blackbaud.com/sandbox";
const DEFAULT_SCOPE: &str = "openid offline_access";

impl Config {
    /// Load and validate configuration from the environment.
    ///
    /// Required: `JWT_SECRET`, `ENCRYPTION_KEY`, `OAUTH_CALLBACK_URL`,
    /// `PUBLIC_BASE_URL`. Everything else has a sensible default.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = require("JWT_SECRET")?;
        let encryption_passphrase = require("ENCRYPTION_KEY")?;
        let callback_url = require("OAUTH_CALLBACK_URL")?;
        let public_base_url = require("PUBLIC_BASE_URL")?;

        if encryption_passphrase.len() < 16 {
            return Err(GiveFlowError::config(
                "ENCRYPTION_KEY must be at least 16 characters.\n\
                 Generate one with: openssl rand -base64 24",
            ));
        }

        Ok(Self {
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            public_base_url,
            storage: StorageConfig {
                dsn: optional("DATABASE_PATH")
                    .unwrap_or_else(|| ".giveflow/giveflow.db".to_string()),
            },
            blackbaud: BlackbaudConfig {
                oauth_base_url: optional("BB_OAUTH_URL")
                    .unwrap_or_else(|| DEFAULT_OAUTH_BASE.to_string()),
                api_base_url: optional("BB_API_URL")
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                sandbox_api_base_url: optional("BB_SANDBOX_API_URL")
                    .unwrap_or_else(|| DEFAULT_SANDBOX_API_BASE.to_string()),
                callback_url,
                oauth_scope: optional("BB_OAUTH_SCOPE")
                    .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
                payment_subscription_key: optional("BB_PAYMENT_API_SUBSCRIPTION")
                    .unwrap_or_default(),
                standard_subscription_key: optional("BB_STANDARD_API_SUBSCRIPTION")
                    .unwrap_or_default(),
            },
            jwt_secret,
            encryption_passphrase,
        })
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| {
        GiveFlowError::config(format!("{} environment variable is required", name))
    })
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
