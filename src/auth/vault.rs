//! Credential vault: symmetric encryption of Blackbaud secrets at rest
//!
//! Every secret we persist for a tenant (app secret, access token, refresh
//! token) goes through this vault first. AES-256-GCM with a unique random
//! nonce per operation; the authentication tag makes tampering detectable on
//! decryption.
//!
//! The key is derived once from the configured passphrase (SHA-256, giving
//! fixed 32-byte key material) and reused for the process lifetime. There is
//! no per-record key rotation.

use crate::{GiveFlowError, Result};
use aes_gcm::{
    Aes256Gcm,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// A vault-encrypted secret
///
/// Format: `base64(nonce):base64(ciphertext)`. Can only be created by
/// encryption or by validating a stored value, so plaintext never reaches the
/// database by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSecret(String);

impl EncryptedSecret {
    /// The serialized representation for storage.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Parse a stored value (format validation only, no decryption).
    ///
    /// # Errors
    /// Returns a crypto error if the value is not `nonce:ciphertext` with
    /// both parts valid base64.
    pub fn from_stored(s: String) -> Result<Self> {
        let (nonce_part, ciphertext_part) = s
            .split_once(':')
            .filter(|(n, c)| !n.is_empty() && !c.is_empty() && !c.contains(':'))
            .ok_or_else(|| {
                GiveFlowError::crypto("Invalid encrypted secret format. Expected 'nonce:ciphertext'.")
            })?;

        BASE64
            .decode(nonce_part)
            .map_err(|_| GiveFlowError::crypto("Invalid nonce encoding"))?;
        BASE64
            .decode(ciphertext_part)
            .map_err(|_| GiveFlowError::crypto("Invalid ciphertext encoding"))?;

        Ok(Self(s))
    }
}

impl std::fmt::Display for EncryptedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview = self.0.chars().take(12).collect::<String>();
        write!(f, "[encrypted:{}...]", preview)
    }
}

/// Secret encryptor/decryptor shared across the process via `Arc`
#[derive(Clone)]
pub struct CredentialVault {
    cipher: Arc<Aes256Gcm>,
}

impl CredentialVault {
    /// Build a vault from the configured passphrase.
    ///
    /// Key derivation is deterministic: SHA-256 of the passphrase bytes.
    /// Changing the passphrase makes every previously stored secret
    /// undecryptable, so treat it like the data it protects.
    pub fn new(passphrase: &str) -> Self {
        let key: [u8; 32] = Sha256::digest(passphrase.as_bytes()).into();
        Self {
            cipher: Arc::new(Aes256Gcm::new(&key.into())),
        }
    }

    /// Encrypt a plaintext secret for storage.
    ///
    /// Generates a unique 96-bit nonce and encrypts with authenticated
    /// encryption. Never fails for valid UTF-8 input.
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedSecret> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| GiveFlowError::internal(format!("Secret encryption failed: {}", e)))?;

        Ok(EncryptedSecret(format!(
            "{}:{}",
            BASE64.encode(nonce),
            BASE64.encode(&ciphertext)
        )))
    }

    /// Decrypt a stored secret.
    ///
    /// # Errors
    /// Returns a crypto error (fatal for the record, surfaced as 500) if the
    /// value was not produced by `encrypt` under the same key: wrong key,
    /// tampered data, or corruption.
    pub fn decrypt(&self, encrypted: &EncryptedSecret) -> Result<String> {
        let (nonce_part, ciphertext_part) = encrypted
            .0
            .split_once(':')
            .ok_or_else(|| GiveFlowError::crypto("Invalid encrypted secret format"))?;

        let nonce_bytes = BASE64
            .decode(nonce_part)
            .map_err(|_| GiveFlowError::crypto("Invalid nonce encoding"))?;
        let ciphertext = BASE64
            .decode(ciphertext_part)
            .map_err(|_| GiveFlowError::crypto("Invalid ciphertext encoding"))?;

        // 96-bit nonce for GCM
        let nonce: [u8; 12] = nonce_bytes.try_into().map_err(|v: Vec<u8>| {
            GiveFlowError::crypto(format!("Invalid nonce length: {} bytes (expected 12)", v.len()))
        })?;

        let plaintext = self
            .cipher
            .decrypt(&nonce.into(), ciphertext.as_ref())
            .map_err(|_| {
                GiveFlowError::crypto("Secret decryption failed (wrong key or tampered data)")
            })?;

        String::from_utf8(plaintext)
            .map_err(|_| GiveFlowError::crypto("Decrypted secret contains invalid UTF-8"))
    }

    /// Decrypt a raw stored string (format validation + decryption).
    pub fn decrypt_stored(&self, stored: &str) -> Result<String> {
        let encrypted = EncryptedSecret::from_stored(stored.to_string())?;
        self.decrypt(&encrypted)
    }
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("cipher", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vault() -> CredentialVault {
        CredentialVault::new("test-encryption-passphrase")
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let vault = test_vault();
        let plaintext = "bbms-app-secret-abc123";

        let encrypted = vault.encrypt(plaintext).unwrap();
        let decrypted = vault.decrypt(&encrypted).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_unicode_roundtrip() {
        let vault = test_vault();
        for secret in ["", "ascii-secret", "токен-🔐", "改善された秘密"] {
            let encrypted = vault.encrypt(secret).unwrap();
            assert_eq!(vault.decrypt(&encrypted).unwrap(), secret);
        }
    }

    #[test]
    fn test_different_nonces_different_ciphertexts() {
        let vault = test_vault();
        let plaintext = "same-secret-content";

        let encrypted1 = vault.encrypt(plaintext).unwrap();
        let encrypted2 = vault.encrypt(plaintext).unwrap();

        assert_ne!(encrypted1, encrypted2);
        assert_eq!(vault.decrypt(&encrypted1).unwrap(), plaintext);
        assert_eq!(vault.decrypt(&encrypted2).unwrap(), plaintext);
    }

    #[test]
    fn test_same_passphrase_same_key() {
        let vault1 = CredentialVault::new("shared-passphrase");
        let vault2 = CredentialVault::new("shared-passphrase");

        let encrypted = vault1.encrypt("secret").unwrap();
        assert_eq!(vault2.decrypt(&encrypted).unwrap(), "secret");
    }

    #[test]
    fn test_wrong_key_decryption_fails() {
        let vault1 = CredentialVault::new("passphrase-one");
        let vault2 = CredentialVault::new("passphrase-two");

        let encrypted = vault1.encrypt("secret-data").unwrap();
        let result = vault2.decrypt(&encrypted);
        assert!(matches!(result, Err(crate::GiveFlowError::Crypto(_))));
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let vault = test_vault();
        let encrypted = vault.encrypt("secret-token").unwrap();

        let mut tampered_str = encrypted.0.clone();
        let last = tampered_str.pop().unwrap();
        tampered_str.push(if last == 'A' { 'B' } else { 'A' });
        let tampered = EncryptedSecret(tampered_str);

        assert!(vault.decrypt(&tampered).is_err());
    }

    #[test]
    fn test_garbage_input_rejected() {
        let vault = test_vault();

        for garbage in ["", "no-colon-here", "a:b:c", "not-base64!!!:also-not!!!"] {
            assert!(
                vault.decrypt_stored(garbage).is_err(),
                "Should reject: {:?}",
                garbage
            );
        }
    }

    #[test]
    fn test_long_secret_roundtrip() {
        let vault = test_vault();
        // Realistic SKY tokens can exceed 1KB
        let long_token = "x".repeat(2048);

        let encrypted = vault.encrypt(&long_token).unwrap();
        assert_eq!(vault.decrypt(&encrypted).unwrap(), long_token);
    }

    #[test]
    fn test_display_redacted() {
        let vault = test_vault();
        let encrypted = vault.encrypt("secret").unwrap();

        let display = format!("{}", encrypted);
        assert!(display.contains("[encrypted"));
        assert!(!display.contains("secret"));
    }
}
