//! Password hashing and verification
//!
//! Uses bcrypt with automatic salting.
use crate::Result;

/// bcrypt cost factor (2^12 iterations)
const DEFAULT_COST: u32 = 12;

/// Hash a password using bcrypt.
///
/// Returns a hash string including the salt, safe to store as-is.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, DEFAULT_COST)
        .map_err(|e| crate::GiveFlowError::auth(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored bcrypt hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| crate::GiveFlowError::auth(format!("Failed to verify password: {}", e)))
}

/// Validate password strength.
///
/// Length-based (8-128 characters) plus a small deny-list of common
/// passwords. Long passphrases beat short complex strings, so there are no
/// character-class rules.
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(crate::GiveFlowError::validation(
            "Password must be at least 8 characters",
        ));
    }

    if password.len() > 128 {
        return Err(crate::GiveFlowError::validation(
            "Password must be less than 128 characters",
        ));
    }

    let weak_passwords = ["password", "12345678", "password123", "qwertyuiop"];
    if weak_passwords.contains(&password.to_lowercase().as_str()) {
        return Err(crate::GiveFlowError::validation(
            "Password is too common. Please choose a unique password.",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "my-secure-password-123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert!(hash.starts_with("$2b$") || hash.starts_with("$2a$"));
        assert!(verify_password(password, &hash).expect("Failed to verify"));
        assert!(!verify_password("wrong-password", &hash).expect("Failed to verify"));
    }

    #[test]
    fn test_same_password_different_hashes() {
        let password = "same-password-here";

        let hash1 = hash_password(password).expect("Failed to hash");
        let hash2 = hash_password(password).expect("Failed to hash");

        // Different salts
        assert_ne!(hash1, hash2);
        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn test_validate_password_strength() {
        assert!(validate_password_strength("short").is_err());
        assert!(validate_password_strength(&"a".repeat(129)).is_err());
        assert!(validate_password_strength("password").is_err());
        assert!(validate_password_strength("12345678").is_err());

        assert!(validate_password_strength("giving-is-good").is_ok());
        assert!(validate_password_strength("abcd1234").is_ok()); // exactly 8
    }

    #[test]
    fn test_unicode_password() {
        let password = "пароль-доброты";
        assert!(validate_password_strength(password).is_ok());

        let hash = hash_password(password).expect("Failed to hash");
        assert!(verify_password(password, &hash).expect("Failed to verify"));
    }
}
