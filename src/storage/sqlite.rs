//! SQLite storage implementation
//!
//! Persists organizations and donation transactions. Timestamps are stored
//! as epoch milliseconds; form settings and transaction metadata as JSON
//! text.

use crate::model::{DonationTransaction, FormSettings, Organization, TransactionStatus};
use crate::storage::{OrganizationStore, TransactionStore};
use crate::{GiveFlowError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage.
    ///
    /// # Arguments
    /// * `dsn` - Database path (e.g. ".giveflow/giveflow.db" or ":memory:")
    pub async fn new(dsn: &str) -> Result<Self> {
        let connection_string = if dsn.starts_with("sqlite:") {
            if dsn.contains('?') {
                dsn.to_string()
            } else {
                format!("{}?mode=rwc", dsn)
            }
        } else {
            format!("sqlite:{}?mode=rwc", dsn)
        };

        let file_path = dsn.strip_prefix("sqlite:").unwrap_or(dsn);

        // Reject path traversal in configured paths
        if file_path.contains("..") {
            return Err(GiveFlowError::config(
                "Database path cannot contain '..' (path traversal not allowed)",
            ));
        }

        if file_path != ":memory:" {
            if let Some(parent) = Path::new(file_path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = SqlitePool::connect(&connection_string)
            .await
            .map_err(|e| GiveFlowError::storage(format!("Failed to connect to SQLite: {}", e)))?;

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA busy_timeout = 5000")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await?;

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .map_err(|e| GiveFlowError::storage(format!("Failed to run migrations: {}", e)))?;

        Ok(Self { pool })
    }

    fn parse_organization(row: &SqliteRow) -> Result<Organization> {
        let form_settings: FormSettings =
            serde_json::from_str(&row.try_get::<String, _>("form_settings")?)?;

        Ok(Organization {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            admin_email: row.try_get("admin_email")?,
            password_hash: row.try_get("password_hash")?,
            merchant_id: row.try_get("merchant_id")?,
            access_token: row.try_get("access_token")?,
            refresh_token: row.try_get("refresh_token")?,
            oauth_state: row.try_get("oauth_state")?,
            temp_app_id: row.try_get("temp_app_id")?,
            temp_app_secret: row.try_get("temp_app_secret")?,
            test_mode: row.try_get("test_mode")?,
            form_settings,
            created_at: DateTime::from_timestamp_millis(row.try_get("created_at")?)
                .unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp_millis(row.try_get("updated_at")?)
                .unwrap_or_else(Utc::now),
        })
    }

    fn parse_transaction(row: &SqliteRow) -> Result<DonationTransaction> {
        let status: TransactionStatus = row
            .try_get::<String, _>("status")?
            .parse()
            .map_err(GiveFlowError::storage)?;

        Ok(DonationTransaction {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            organization_id: row.try_get("organization_id")?,
            amount: row.try_get("amount")?,
            donor_name: row.try_get("donor_name")?,
            donor_email: row.try_get("donor_email")?,
            status,
            metadata: serde_json::from_str(&row.try_get::<String, _>("metadata")?)?,
            created_at: DateTime::from_timestamp_millis(row.try_get("created_at")?)
                .unwrap_or_else(Utc::now),
            completed_at: row
                .try_get::<Option<i64>, _>("completed_at")?
                .and_then(DateTime::from_timestamp_millis),
        })
    }
}

const ORGANIZATION_COLUMNS: &str = "id, name, admin_email, password_hash, merchant_id, \
     access_token, refresh_token, oauth_state, temp_app_id, temp_app_secret, \
     test_mode, form_settings, created_at, updated_at";

#[async_trait]
impl OrganizationStore for SqliteStorage {
    async fn create_organization(&self, org: &Organization) -> Result<()> {
        sqlx::query(
            "INSERT INTO organizations
             (id, name, admin_email, password_hash, merchant_id, access_token, refresh_token,
              oauth_state, temp_app_id, temp_app_secret, test_mode, form_settings,
              created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&org.id)
        .bind(&org.name)
        .bind(&org.admin_email)
        .bind(&org.password_hash)
        .bind(&org.merchant_id)
        .bind(&org.access_token)
        .bind(&org.refresh_token)
        .bind(&org.oauth_state)
        .bind(&org.temp_app_id)
        .bind(&org.temp_app_secret)
        .bind(org.test_mode)
        .bind(serde_json::to_string(&org.form_settings)?)
        .bind(org.created_at.timestamp_millis())
        .bind(org.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                GiveFlowError::validation("Organization with this email already exists")
            }
            other => other.into(),
        })?;

        Ok(())
    }

    async fn get_organization(&self, id: &str) -> Result<Option<Organization>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM organizations WHERE id = ?",
            ORGANIZATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::parse_organization(&r)).transpose()
    }

    async fn get_organization_by_email(&self, email: &str) -> Result<Option<Organization>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM organizations WHERE admin_email = ?",
            ORGANIZATION_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::parse_organization(&r)).transpose()
    }

    async fn begin_oauth_link(
        &self,
        organization_id: &str,
        state: &str,
        merchant_id: &str,
        app_id: &str,
        encrypted_app_secret: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE organizations
             SET oauth_state = ?, merchant_id = ?, temp_app_id = ?, temp_app_secret = ?,
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(state)
        .bind(merchant_id)
        .bind(app_id)
        .bind(encrypted_app_secret)
        .bind(Utc::now().timestamp_millis())
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GiveFlowError::not_found("Organization", organization_id));
        }

        Ok(())
    }

    async fn complete_oauth_link(
        &self,
        organization_id: &str,
        encrypted_access_token: &str,
        encrypted_refresh_token: Option<&str>,
        merchant_id: &str,
    ) -> Result<()> {
        // COALESCE keeps a previously stored refresh token when the exchange
        // did not return a new one.
        let result = sqlx::query(
            "UPDATE organizations
             SET access_token = ?,
                 refresh_token = COALESCE(?, refresh_token),
                 merchant_id = ?,
                 oauth_state = NULL,
                 temp_app_id = NULL,
                 temp_app_secret = NULL,
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(encrypted_access_token)
        .bind(encrypted_refresh_token)
        .bind(merchant_id)
        .bind(Utc::now().timestamp_millis())
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GiveFlowError::not_found("Organization", organization_id));
        }

        Ok(())
    }

    async fn set_manual_credentials(
        &self,
        organization_id: &str,
        merchant_id: &str,
        encrypted_access_token: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE organizations
             SET merchant_id = ?, access_token = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(merchant_id)
        .bind(encrypted_access_token)
        .bind(Utc::now().timestamp_millis())
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GiveFlowError::not_found("Organization", organization_id));
        }

        Ok(())
    }

    async fn update_form_settings(
        &self,
        organization_id: &str,
        settings: &FormSettings,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE organizations SET form_settings = ?, updated_at = ? WHERE id = ?",
        )
        .bind(serde_json::to_string(settings)?)
        .bind(Utc::now().timestamp_millis())
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GiveFlowError::not_found("Organization", organization_id));
        }

        Ok(())
    }

    async fn set_test_mode(&self, organization_id: &str, test_mode: bool) -> Result<()> {
        let result = sqlx::query(
            "UPDATE organizations SET test_mode = ?, updated_at = ? WHERE id = ?",
        )
        .bind(test_mode)
        .bind(Utc::now().timestamp_millis())
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GiveFlowError::not_found("Organization", organization_id));
        }

        Ok(())
    }
}

#[async_trait]
impl TransactionStore for SqliteStorage {
    async fn insert_transaction(&self, transaction: &DonationTransaction) -> Result<()> {
        sqlx::query(
            "INSERT INTO transactions
             (id, session_id, organization_id, amount, donor_name, donor_email, status,
              metadata, created_at, completed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&transaction.id)
        .bind(&transaction.session_id)
        .bind(&transaction.organization_id)
        .bind(transaction.amount)
        .bind(&transaction.donor_name)
        .bind(&transaction.donor_email)
        .bind(transaction.status.as_str())
        .bind(serde_json::to_string(&transaction.metadata)?)
        .bind(transaction.created_at.timestamp_millis())
        .bind(transaction.completed_at.map(|dt| dt.timestamp_millis()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_transaction_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<DonationTransaction>> {
        let row = sqlx::query(
            "SELECT id, session_id, organization_id, amount, donor_name, donor_email, status,
                    metadata, created_at, completed_at
             FROM transactions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::parse_transaction(&r)).transpose()
    }

    async fn list_transactions(
        &self,
        organization_id: &str,
        limit: usize,
    ) -> Result<Vec<DonationTransaction>> {
        let rows = sqlx::query(
            "SELECT id, session_id, organization_id, amount, donor_name, donor_email, status,
                    metadata, created_at, completed_at
             FROM transactions
             WHERE organization_id = ?
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(organization_id)
        .bind(limit.min(10_000) as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::parse_transaction).collect()
    }
}
