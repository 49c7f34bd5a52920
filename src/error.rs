//! Error types for GiveFlow
//!
//! Two layers: `OAuthLinkError` classifies every way the BBMS linking flow
//! can fail from the caller's point of view (all client-correctable, all
//! surfaced as 400), and `GiveFlowError` is the crate-wide error that
//! everything else propagates through.

use thiserror::Error;

/// Classified failures of the BBMS OAuth linking flow.
///
/// Each variant maps to a specific caller-facing reason so the dashboard can
/// render actionable guidance instead of a generic failure page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OAuthLinkError {
    /// State parameter does not parse as `{org_id}:{random}`.
    #[error("Invalid state parameter")]
    InvalidStateFormat,

    /// The org-id segment of the state resolves to no organization.
    #[error("Organization not found")]
    OrganizationNotFound,

    /// State does not match the organization's pending value (replay,
    /// forgery, or a flow that was never started).
    #[error("Invalid or expired state parameter")]
    InvalidOrExpiredState,

    /// Pending record lacks the temporary app id/secret.
    #[error("Missing app credentials for OAuth flow")]
    MissingAppCredentials,

    /// Upstream reported `invalid_grant`: the authorization code expired or
    /// was already consumed.
    #[error("Authorization code expired or already used. Please restart the OAuth flow and complete it promptly.")]
    InvalidGrant,

    /// Upstream reported `invalid_client`: the app id/secret pair is wrong.
    #[error("Invalid Blackbaud App ID or Secret. Please check your application credentials.")]
    InvalidClient,

    /// Any other upstream error, carried verbatim.
    #[error("OAuth error ({code}): {description}")]
    Upstream { code: String, description: String },

    /// Upstream returned 200 but the payload had no `access_token`.
    #[error("No access token received from the authorization server")]
    NoAccessTokenReceived,
}

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum GiveFlowError {
    /// Configuration problems (missing/invalid environment variables)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request validation failures
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication failures (bad credentials, bad/expired JWT)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Authenticated but not allowed (e.g. reading another tenant's data)
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource lookups that came up empty
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Storage-layer failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stored secret cannot be decrypted. Fatal for that record: either the
    /// encryption key changed or the data is corrupt.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Classified OAuth linking failure (client-correctable)
    #[error(transparent)]
    OAuthLink(#[from] OAuthLinkError),

    /// Outbound HTTP transport failure (timeout, connect error)
    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GiveFlowError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, GiveFlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_error_messages_are_actionable() {
        let err = OAuthLinkError::InvalidGrant;
        assert!(err.to_string().contains("restart"));

        let err = OAuthLinkError::InvalidClient;
        assert!(err.to_string().contains("credentials"));
    }

    #[test]
    fn test_upstream_error_carries_code_verbatim() {
        let err = OAuthLinkError::Upstream {
            code: "unsupported_grant_type".to_string(),
            description: "not supported".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("unsupported_grant_type"));
        assert!(msg.contains("not supported"));
    }

    #[test]
    fn test_link_error_converts_into_crate_error() {
        let err: GiveFlowError = OAuthLinkError::InvalidStateFormat.into();
        assert!(matches!(
            err,
            GiveFlowError::OAuthLink(OAuthLinkError::InvalidStateFormat)
        ));
    }
}
