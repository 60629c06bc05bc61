//! # Credential & Secret Utilities
//!
//! Two distinct mechanisms, never to be confused:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  PASSWORDS: one-way                                                 │
//! │    plaintext ──argon2──► PHC hash string ──► stored                 │
//! │    login check: verify_password(candidate, hash) - never decrypt    │
//! │                                                                     │
//! │  SECRETS: reversible (DNIT auth token, certificate password)        │
//! │    plaintext ──AES-256-GCM──► base64(nonce ‖ ciphertext ‖ tag)      │
//! │    read path decrypts before the value reaches the caller           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cipher key is process-wide configuration: an opaque string digested
//! to 256 bits with SHA-256. It is never caller-supplied per operation.

use aes_gcm::aead::{Aead, KeyInit, OsRng as AeadOsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a plaintext password for storage.
///
/// Produces a salted PHC string (`$argon2id$...`). The salt is random per
/// call, so hashing the same password twice yields different strings.
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CryptoError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored PHC hash string.
///
/// Comparison happens inside argon2 in constant time. A malformed stored
/// hash simply fails verification; it is not an error the caller can act on.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Secret Cipher
// =============================================================================

/// Symmetric cipher for secrets that must be readable again
/// (the DNIT auth token and the signing-certificate password).
///
/// Wire format: `base64(nonce ‖ ciphertext ‖ tag)` with a fresh random
/// 96-bit nonce per encryption, so encrypting the same secret twice yields
/// different stored text.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material through Debug output.
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}

impl SecretCipher {
    /// Creates a cipher from the process-wide key string.
    ///
    /// The string is digested with SHA-256 into the 256-bit AES key, so any
    /// non-empty configuration value works; rotating the key makes existing
    /// ciphertexts undecryptable.
    pub fn new(key: &str) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&digest);
        SecretCipher {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypts a secret for storage.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut AeadOsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(payload))
    }

    /// Decrypts a stored secret back to plaintext.
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let payload = BASE64
            .decode(encoded)
            .map_err(|e| CryptoError::Decrypt(e.to_string()))?;

        if payload.len() < NONCE_LEN {
            return Err(CryptoError::Decrypt("payload too short".to_string()));
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decrypt("authentication failed".to_string()))?;

        String::from_utf8(plaintext).map_err(|e| CryptoError::Decrypt(e.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("secret123").unwrap();

        // The hash never contains the plaintext.
        assert!(!hash.contains("secret123"));
        assert!(hash.starts_with("$argon2"));

        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("secret124", &hash));
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let a = hash_password("secret123").unwrap();
        let b = hash_password("secret123").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("secret123", &a));
        assert!(verify_password("secret123", &b));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("secret123", "not-a-phc-string"));
        assert!(!verify_password("secret123", ""));
    }

    #[test]
    fn test_secret_round_trip() {
        let cipher = SecretCipher::new("unit-test-key");
        let stored = cipher.encrypt("tok-abc").unwrap();

        // Stored form is distinguishable from the plaintext.
        assert_ne!(stored, "tok-abc");
        assert!(!stored.contains("tok-abc"));

        assert_eq!(cipher.decrypt(&stored).unwrap(), "tok-abc");
    }

    #[test]
    fn test_secret_nonce_is_fresh() {
        let cipher = SecretCipher::new("unit-test-key");
        let a = cipher.encrypt("tok-abc").unwrap();
        let b = cipher.encrypt("tok-abc").unwrap();
        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a).unwrap(), "tok-abc");
        assert_eq!(cipher.decrypt(&b).unwrap(), "tok-abc");
    }

    #[test]
    fn test_wrong_key_fails_decryption() {
        let stored = SecretCipher::new("key-one").encrypt("tok-abc").unwrap();
        let other = SecretCipher::new("key-two");
        assert!(other.decrypt(&stored).is_err());
    }
}
