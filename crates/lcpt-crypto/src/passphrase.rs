//! # User Key Derivation and Key Check
//!
//! The user key is the SHA-256 digest of the UTF-8 passphrase. A license
//! proves the passphrase is correct through `key_check`: the license id
//! encrypted under the user key.

use lcpt_core::CryptoError;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::algorithm::HashAlgorithm;
use crate::cipher::decrypt;

/// A 32-byte user key derived from a passphrase. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct UserKey([u8; 32]);

impl UserKey {
    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding, the `user_hash` form a license server expects.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Debug for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UserKey([REDACTED])")
    }
}

/// Derive the user key from a passphrase.
///
/// # Errors
///
/// `UnsupportedAlgorithm` for any algorithm other than SHA-256.
pub fn hash(passphrase: &str, algorithm: &str) -> Result<UserKey, CryptoError> {
    match HashAlgorithm::from_uri(algorithm)? {
        HashAlgorithm::Sha256 => {
            let digest = Sha256::digest(passphrase.as_bytes());
            let mut key = [0u8; 32];
            key.copy_from_slice(&digest);
            Ok(UserKey(key))
        }
    }
}

/// Whether `passphrase` unlocks the license: hash it, decrypt `key_check`
/// with the result and compare to `license_id` byte for byte.
///
/// A ciphertext that does not decrypt under the derived key (bad padding)
/// means the key is wrong and yields `Ok(false)`.
///
/// # Errors
///
/// Unsupported algorithm identifiers and malformed key material.
pub fn check_user_key(
    passphrase: &str,
    hash_algorithm: &str,
    key_check: &[u8],
    license_id: &str,
    decrypt_algorithm: &str,
) -> Result<bool, CryptoError> {
    let key = hash(passphrase, hash_algorithm)?;
    match decrypt(key_check, key.as_bytes(), decrypt_algorithm) {
        Ok(clear) => {
            let matches = clear == license_id.as_bytes();
            if !matches {
                tracing::debug!(
                    decrypted = %String::from_utf8_lossy(&clear),
                    license_id,
                    "key check decrypted to a different value"
                );
            }
            Ok(matches)
        }
        Err(CryptoError::DecryptionFailed(reason)) => {
            tracing::debug!(%reason, "key check does not decrypt under the derived user key");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
