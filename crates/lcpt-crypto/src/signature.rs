//! # License Signature Verification
//!
//! A license is signed by its provider over the canonical license bytes
//! (the document minus its `signature` member, see
//! [`lcpt_core::CanonicalBytes::for_signature`]). The signature value is
//! base64; the verifying key is the public key of the embedded provider
//! certificate.
//!
//! ## Supported Algorithms
//!
//! | URI | Scheme |
//! |-----|--------|
//! | `xmldsig-more#rsa-sha256` | RSASSA-PKCS1-v1_5, SHA-256 |
//! | `xmldsig-more#ecdsa-sha256` | ECDSA P-256, SHA-256; raw `r‖s` or DER |

use lcpt_core::{CanonicalBytes, CryptoError};
use p256::pkcs8::DecodePublicKey as _;
use rsa::pkcs8::DecodePublicKey as _;
use rsa::signature::Verifier as _;
use sha2::Sha256;
use x509_cert::der::Encode;
use x509_cert::spki::{ObjectIdentifier, SubjectPublicKeyInfoOwned};

use crate::algorithm::SignatureAlgorithm;
use crate::certificate::Certificate;
use crate::encoding::decode_base64;

/// rsaEncryption.
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
/// id-ecPublicKey.
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// Length of a raw `r‖s` P-256 signature.
const P256_RAW_SIGNATURE_LEN: usize = 64;

/// Public key taken from a certificate's SubjectPublicKeyInfo.
#[derive(Debug, Clone)]
pub(crate) enum PublicKey {
    Rsa(rsa::pkcs1v15::VerifyingKey<Sha256>),
    EcdsaP256(p256::ecdsa::VerifyingKey),
}

impl PublicKey {
    pub(crate) fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self, CryptoError> {
        let der = spki
            .to_der()
            .map_err(|e| CryptoError::KeyError(format!("cannot encode public key: {e}")))?;
        let oid = spki.algorithm.oid;
        if oid == RSA_ENCRYPTION {
            let key = rsa::RsaPublicKey::from_public_key_der(&der)
                .map_err(|e| CryptoError::KeyError(format!("invalid RSA public key: {e}")))?;
            Ok(Self::Rsa(rsa::pkcs1v15::VerifyingKey::new(key)))
        } else if oid == EC_PUBLIC_KEY {
            let key = p256::ecdsa::VerifyingKey::from_public_key_der(&der)
                .map_err(|e| CryptoError::KeyError(format!("invalid P-256 public key: {e}")))?;
            Ok(Self::EcdsaP256(key))
        } else {
            Err(CryptoError::UnsupportedAlgorithm {
                kind: "public key",
                uri: oid.to_string(),
            })
        }
    }

    /// Verify `signature` over `message`.
    ///
    /// Signature bytes that cannot be decoded for the scheme do not verify.
    /// A key that cannot serve `algorithm` is a `KeyError`.
    pub(crate) fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        match (self, algorithm) {
            (Self::Rsa(key), SignatureAlgorithm::RsaSha256) => {
                let Ok(sig) = rsa::pkcs1v15::Signature::try_from(signature) else {
                    return Ok(false);
                };
                Ok(key.verify(message, &sig).is_ok())
            }
            (Self::EcdsaP256(key), SignatureAlgorithm::EcdsaSha256) => {
                let Some(sig) = decode_ecdsa_signature(signature) else {
                    tracing::debug!(len = signature.len(), "ECDSA signature is neither raw nor DER");
                    return Ok(false);
                };
                Ok(key.verify(message, &sig).is_ok())
            }
            (key, algorithm) => Err(CryptoError::KeyError(format!(
                "{} key cannot verify {}",
                key.kind(),
                algorithm.uri()
            ))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Rsa(_) => "RSA",
            Self::EcdsaP256(_) => "P-256",
        }
    }
}

fn decode_ecdsa_signature(bytes: &[u8]) -> Option<p256::ecdsa::Signature> {
    if bytes.len() == P256_RAW_SIGNATURE_LEN {
        if let Ok(sig) = p256::ecdsa::Signature::from_slice(bytes) {
            return Some(sig);
        }
    }
    p256::ecdsa::Signature::from_der(bytes).ok()
}

/// Verify a license signature.
///
/// `signature` is the base64 `signature.value`, `algorithm` the
/// `signature.algorithm` URI. Returns `Ok(false)` when the signature does not
/// verify under the certificate's key.
///
/// # Errors
///
/// Unsupported algorithm URIs, invalid base64, and certificate keys that are
/// undecodable or of the wrong type for `algorithm`.
pub fn verify_signature(
    signature: &str,
    cert: &Certificate,
    canonical: &CanonicalBytes,
    algorithm: &str,
) -> Result<bool, CryptoError> {
    let algorithm = SignatureAlgorithm::from_uri(algorithm)?;
    let signature = decode_base64("signature.value", signature)?;
    let key = cert.public_key()?;
    let valid = key.verify(algorithm, canonical.as_bytes(), &signature)?;
    tracing::debug!(
        algorithm = algorithm.uri(),
        canonical_len = canonical.len(),
        valid,
        "license signature checked"
    );
    Ok(valid)
}
