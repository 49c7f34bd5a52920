//! Authentication and secret handling
//!
//! - **Org admin auth**: bcrypt passwords + stateless JWT (one admin account
//!   per organization; the JWT subject is the organization id)
//! - **Credential vault**: AES-256-GCM encryption for every Blackbaud secret
//!   we persist (app secrets, access/refresh tokens)

use serde::{Deserialize, Serialize};

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod vault;

pub use jwt::{JwtManager, OrgClaims, ValidatedJwtSecret};
pub use middleware::{AuthMiddlewareState, OrgContext, auth_middleware};
pub use password::{hash_password, validate_password_strength, verify_password};
pub use vault::{CredentialVault, EncryptedSecret};

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub admin_email: String,
    pub admin_password: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login/registration response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub organization: OrganizationInfo,
}

/// Organization info (public subset)
#[derive(Debug, Serialize)]
pub struct OrganizationInfo {
    pub id: String,
    pub name: String,
    pub email: String,
}
