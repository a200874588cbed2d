//! # AES-256-CBC
//!
//! License ciphertexts (`key_check`, `content_key.encrypted_value`) are laid
//! out as `IV (16 bytes) || CBC ciphertext`, PKCS#7 padded.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use lcpt_core::CryptoError;

use crate::algorithm::CipherAlgorithm;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// AES block size, also the IV length.
pub const BLOCK_SIZE: usize = 16;

/// AES-256 key length.
pub const KEY_SIZE: usize = 32;

/// Decrypt `ciphertext` (IV-prefixed) under `key`.
///
/// # Errors
///
/// - `UnsupportedAlgorithm` if `algorithm` is not AES-256-CBC.
/// - `KeyError` if `key` is not 32 bytes.
/// - `DecryptionFailed` if the input is shorter than two blocks, not block
///   aligned, or the padding is invalid.
pub fn decrypt(ciphertext: &[u8], key: &[u8], algorithm: &str) -> Result<Vec<u8>, CryptoError> {
    CipherAlgorithm::from_uri(algorithm)?;
    check_key(key)?;
    if ciphertext.len() < 2 * BLOCK_SIZE || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::DecryptionFailed(format!(
            "ciphertext of {} bytes is not an IV followed by whole blocks",
            ciphertext.len()
        )));
    }
    let (iv, body) = ciphertext.split_at(BLOCK_SIZE);
    let dec = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| CryptoError::KeyError(e.to_string()))?;
    dec.decrypt_padded_vec_mut::<Pkcs7>(body)
        .map_err(|_| CryptoError::DecryptionFailed("invalid PKCS#7 padding".to_string()))
}

/// Encrypt `plaintext` under `key` with the given IV, returning
/// `IV || ciphertext`.
///
/// The harness never produces protected content; this is the inverse of
/// [`decrypt`] for building fixtures.
pub fn encrypt(
    plaintext: &[u8],
    key: &[u8],
    iv: &[u8; BLOCK_SIZE],
    algorithm: &str,
) -> Result<Vec<u8>, CryptoError> {
    CipherAlgorithm::from_uri(algorithm)?;
    check_key(key)?;
    let enc = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|e| CryptoError::KeyError(e.to_string()))?;
    let mut out = iv.to_vec();
    out.extend(enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext));
    Ok(out)
}

fn check_key(key: &[u8]) -> Result<(), CryptoError> {
    if key.len() != KEY_SIZE {
        return Err(CryptoError::KeyError(format!(
            "AES-256 key must be {KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }
    Ok(())
}
