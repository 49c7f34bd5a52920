//! GiveFlow: a multi-tenant donation-page backend
//!
//! Organizations register, link their Blackbaud Merchant Services account
//! through an OAuth2 authorization-code flow, customize a donation form, and
//! embed it as an iframe. Donations proxy to the Blackbaud SKY payments API
//! using the tenant's own (encrypted-at-rest) credentials.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod oauth;
pub mod sky;
pub mod storage;

pub use config::Config;
pub use error::{GiveFlowError, OAuthLinkError, Result};

use auth::{AuthMiddlewareState, CredentialVault, JwtManager, ValidatedJwtSecret};
use http::{AppState, RouterDeps};
use oauth::{OAuthFlowOrchestrator, OAuthLinkState, OAuthSettings, SkyTokenClient};
use sky::SkyPaymentsClient;
use std::sync::Arc;

/// Build the application router from configuration.
///
/// Constructs every component once (storage, vault, token client, JWT
/// manager) and wires them together; nothing reads the environment or
/// global state after this.
pub async fn build_app(config: &Config) -> Result<axum::Router> {
    let storage = storage::create_storage_from_config(&config.storage).await?;

    let vault = CredentialVault::new(&config.encryption_passphrase);

    let jwt_secret = ValidatedJwtSecret::new(config.jwt_secret.clone())?;
    let jwt_manager = Arc::new(JwtManager::new(
        &jwt_secret,
        "giveflow".to_string(),
        chrono::Duration::hours(24),
    ));

    let token_client = SkyTokenClient::new(&config.blackbaud.oauth_base_url)?;
    let payments = SkyPaymentsClient::new(&config.blackbaud, config.public_base_url.clone())?;

    let orchestrator = OAuthFlowOrchestrator::new(
        storage.clone(),
        vault.clone(),
        token_client,
        OAuthSettings::from_config(&config.blackbaud),
    );

    let deps = RouterDeps {
        state: Arc::new(AppState {
            storage,
            vault,
            jwt_manager: jwt_manager.clone(),
            payments,
            public_base_url: config.public_base_url.clone(),
        }),
        oauth_link: Arc::new(OAuthLinkState { orchestrator }),
        auth_middleware_state: Arc::new(AuthMiddlewareState { jwt_manager }),
    };

    Ok(http::create_router(deps))
}
