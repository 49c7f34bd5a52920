//! Storage backends for GiveFlow
//!
//! A unified trait interface over the persistence layer, split into focused
//! traits:
//! - `OrganizationStore`: tenant records, OAuth linkage mutations
//! - `TransactionStore`: donation checkout sessions
//! - `Storage`: composition trait implementing all of the above
//!
//! The OAuth flow performs no transactions across these calls; all
//! cross-request coordination goes through the organization row itself.

pub mod sqlite;

use crate::model::{DonationTransaction, FormSettings, Organization};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Tenant records and OAuth linkage mutations
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Insert a new organization. Fails if the admin email is taken.
    async fn create_organization(&self, org: &Organization) -> Result<()>;

    /// Get an organization by id.
    async fn get_organization(&self, id: &str) -> Result<Option<Organization>>;

    /// Get an organization by admin email.
    async fn get_organization_by_email(&self, email: &str) -> Result<Option<Organization>>;

    /// Persist a pending OAuth linking attempt, overwriting any prior
    /// pending values (state, merchant id, temp app credentials).
    async fn begin_oauth_link(
        &self,
        organization_id: &str,
        state: &str,
        merchant_id: &str,
        app_id: &str,
        encrypted_app_secret: &str,
    ) -> Result<()>;

    /// Commit a completed linking flow: store the encrypted tokens and
    /// merchant id, clear the pending state and temp credentials. When no
    /// refresh token was received, any previously stored one is kept.
    async fn complete_oauth_link(
        &self,
        organization_id: &str,
        encrypted_access_token: &str,
        encrypted_refresh_token: Option<&str>,
        merchant_id: &str,
    ) -> Result<()>;

    /// Store manually entered credentials (bypassing the OAuth flow).
    async fn set_manual_credentials(
        &self,
        organization_id: &str,
        merchant_id: &str,
        encrypted_access_token: &str,
    ) -> Result<()>;

    /// Replace the organization's donation form settings.
    async fn update_form_settings(
        &self,
        organization_id: &str,
        settings: &FormSettings,
    ) -> Result<()>;

    /// Toggle sandbox vs production processing.
    async fn set_test_mode(&self, organization_id: &str, test_mode: bool) -> Result<()>;
}

/// Donation checkout sessions
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Record a checkout session.
    async fn insert_transaction(&self, transaction: &DonationTransaction) -> Result<()>;

    /// Look up a transaction by its SKY checkout session id.
    async fn get_transaction_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<DonationTransaction>>;

    /// List an organization's transactions, newest first.
    async fn list_transactions(
        &self,
        organization_id: &str,
        limit: usize,
    ) -> Result<Vec<DonationTransaction>>;
}

/// Complete storage trait combining the focused traits
pub trait Storage: OrganizationStore + TransactionStore {}

/// Blanket implementation: anything implementing the focused traits is a Storage
impl<T> Storage for T where T: OrganizationStore + TransactionStore {}

pub use sqlite::SqliteStorage;

/// Create a storage backend from configuration
pub async fn create_storage_from_config(
    config: &crate::config::StorageConfig,
) -> Result<Arc<dyn Storage>> {
    Ok(Arc::new(SqliteStorage::new(&config.dsn).await?))
}
