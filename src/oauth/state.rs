//! OAuth state tokens
//!
//! The state parameter binds a Blackbaud redirect round trip to the
//! organization that initiated it. Format: `{org_id}:{random}` where the
//! random suffix is 32 bytes from the OS CSPRNG, URL-safe base64 encoded.
//! Organization ids are UUIDs and never contain `:`, so the prefix is
//! recoverable by splitting on the first separator.

use crate::error::OAuthLinkError;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Bytes of CSPRNG entropy in the random suffix
const STATE_ENTROPY_BYTES: usize = 32;

/// Issue a fresh state token bound to an organization.
pub fn issue_state(organization_id: &str) -> String {
    let mut random = [0u8; STATE_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut random);
    format!("{}:{}", organization_id, URL_SAFE_NO_PAD.encode(random))
}

/// Split a state token into `(org_id, random_suffix)` on the first `:`.
///
/// # Errors
/// Returns [`OAuthLinkError::InvalidStateFormat`] unless the split yields
/// exactly two non-empty parts. This check runs before any store lookup.
pub fn split_state(state: &str) -> Result<(&str, &str), OAuthLinkError> {
    match state.split_once(':') {
        Some((org_id, suffix)) if !org_id.is_empty() && !suffix.is_empty() => {
            Ok((org_id, suffix))
        }
        _ => Err(OAuthLinkError::InvalidStateFormat),
    }
}

/// Verify a supplied state against the stored pending value.
///
/// Exact string equality; an absent stored value is a failure. Single-use is
/// enforced by the orchestrator clearing the stored value on success.
pub fn verify_state(supplied: &str, stored: Option<&str>) -> bool {
    stored.is_some_and(|s| s == supplied)
}
