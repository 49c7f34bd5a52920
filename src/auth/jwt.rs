//! JWT generation and validation for organization admin sessions
//!
//! Tokens are HS256-signed with a secret validated at startup. The subject
//! claim is the organization id; there is no separate user entity.

use crate::{GiveFlowError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Validated JWT secret that enforces a minimum length requirement.
///
/// Can only be constructed if the secret is at least 256 bits (32 bytes).
/// The deployer is responsible for generating a cryptographically random
/// secret.
#[derive(Clone)]
pub struct ValidatedJwtSecret(String);

impl ValidatedJwtSecret {
    /// Validate a secret supplied via configuration.
    ///
    /// # Errors
    /// Returns an error if the secret is shorter than 32 or longer than 512
    /// characters.
    pub fn new(secret: String) -> Result<Self> {
        if secret.len() < 32 {
            return Err(GiveFlowError::config(format!(
                "JWT_SECRET must be at least 32 characters (256 bits). Current length: {}.\n\
                 Generate one with: openssl rand -hex 32",
                secret.len()
            )));
        }

        if secret.len() > 512 {
            return Err(GiveFlowError::config(format!(
                "JWT_SECRET exceeds the maximum length of 512 characters (got {}).",
                secret.len()
            )));
        }

        Ok(Self(secret))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for ValidatedJwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ValidatedJwtSecret")
            .field(&"[REDACTED]")
            .finish()
    }
}

/// JWT claims for an organization admin session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgClaims {
    /// Subject (organization id)
    pub sub: String,
    /// Expiration timestamp (seconds since epoch)
    pub exp: usize,
    /// Issued at timestamp (seconds since epoch)
    pub iat: usize,
    /// Issuer
    pub iss: String,
}

/// JWT manager for issuing and validating organization session tokens
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    token_ttl: Duration,
}

impl JwtManager {
    pub fn new(secret: &ValidatedJwtSecret, issuer: String, token_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            token_ttl,
        }
    }

    /// Issue an access token for an organization admin.
    pub fn issue_token(&self, organization_id: &str) -> Result<String> {
        let now = Utc::now();
        let claims = OrgClaims {
            sub: organization_id.to_string(),
            exp: (now + self.token_ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| GiveFlowError::auth(format!("Failed to generate JWT: {}", e)))
    }

    /// Validate a token and return its claims.
    ///
    /// # Errors
    /// Returns an auth error if the token is expired, malformed, wrongly
    /// signed, or from another issuer.
    pub fn validate_token(&self, token: &str) -> Result<OrgClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        let token_data =
            decode::<OrgClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        GiveFlowError::auth("Token expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        GiveFlowError::auth("Invalid signature")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                        GiveFlowError::auth("Invalid issuer")
                    }
                    _ => GiveFlowError::auth(format!("Invalid JWT: {}", e)),
                }
            })?;

        Ok(token_data.claims)
    }

    /// TTL configured for issued tokens, in seconds.
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl.num_seconds()
    }
}
