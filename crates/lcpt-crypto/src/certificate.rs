//! # Provider Certificate Verification
//!
//! A license embeds the provider certificate (`signature.certificate`,
//! base64 DER). The certificate is trusted when:
//!
//! 1. its issuer is the configured CA's subject,
//! 2. its signature verifies under the CA's public key, and
//! 3. the license's `issued` instant lies inside its validity window.
//!
//! The instant is the license's `issued` time, never "now": a conformance run
//! may happen long after issuance and after the provider certificate expired.

use std::path::Path;

use lcpt_core::{CryptoError, Timestamp};
use x509_cert::der::{Decode, DecodePem, Encode};
use x509_cert::spki::ObjectIdentifier;

use crate::algorithm::SignatureAlgorithm;
use crate::encoding::decode_base64;
use crate::signature::PublicKey;

/// sha256WithRSAEncryption.
const SHA256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
/// ecdsa-with-SHA256.
const ECDSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");

/// A parsed X.509 certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    inner: x509_cert::Certificate,
}

impl Certificate {
    /// Parse DER bytes.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let inner = x509_cert::Certificate::from_der(der)
            .map_err(|e| CryptoError::CertificateError(format!("invalid DER: {e}")))?;
        Ok(Self { inner })
    }

    /// Parse a PEM `CERTIFICATE` block.
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        let inner = x509_cert::Certificate::from_pem(pem.trim().as_bytes())
            .map_err(|e| CryptoError::CertificateError(format!("invalid PEM: {e}")))?;
        Ok(Self { inner })
    }

    /// Parse the textual forms found in documents: a PEM block, or base64
    /// DER as in `signature.certificate`.
    pub fn parse(text: &str) -> Result<Self, CryptoError> {
        if text.trim_start().starts_with("-----BEGIN") {
            Self::from_pem(text)
        } else {
            Self::from_der(&decode_base64("certificate", text)?)
        }
    }

    /// Load a certificate file: PEM, or raw DER.
    pub fn from_path(path: &Path) -> Result<Self, CryptoError> {
        let bytes = std::fs::read(path).map_err(|e| {
            CryptoError::CertificateError(format!("cannot read {}: {e}", path.display()))
        })?;
        match std::str::from_utf8(&bytes) {
            Ok(text) if text.trim_start().starts_with("-----BEGIN") => Self::from_pem(text),
            _ => Self::from_der(&bytes),
        }
    }

    /// Subject distinguished name, RFC 4514 form.
    pub fn subject(&self) -> String {
        self.inner.tbs_certificate.subject.to_string()
    }

    /// Issuer distinguished name, RFC 4514 form.
    pub fn issuer(&self) -> String {
        self.inner.tbs_certificate.issuer.to_string()
    }

    /// Start of the validity window.
    pub fn not_before(&self) -> Timestamp {
        to_timestamp(self.inner.tbs_certificate.validity.not_before)
    }

    /// End of the validity window.
    pub fn not_after(&self) -> Timestamp {
        to_timestamp(self.inner.tbs_certificate.validity.not_after)
    }

    /// Whether `at` lies inside `[not_before, not_after]`.
    pub fn is_valid_at(&self, at: Timestamp) -> bool {
        self.not_before() <= at && at <= self.not_after()
    }

    /// Whether this certificate names `other` as its issuer.
    pub fn is_issued_by(&self, other: &Certificate) -> bool {
        self.inner.tbs_certificate.issuer == other.inner.tbs_certificate.subject
    }

    pub(crate) fn public_key(&self) -> Result<PublicKey, CryptoError> {
        PublicKey::from_spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    fn signature_algorithm(&self) -> Result<SignatureAlgorithm, CryptoError> {
        let oid = self.inner.signature_algorithm.oid;
        if oid == SHA256_WITH_RSA {
            Ok(SignatureAlgorithm::RsaSha256)
        } else if oid == ECDSA_WITH_SHA256 {
            Ok(SignatureAlgorithm::EcdsaSha256)
        } else {
            Err(CryptoError::UnsupportedAlgorithm {
                kind: "certificate signature",
                uri: oid.to_string(),
            })
        }
    }
}

/// Verify that `cert` chains to `ca` and is valid at `at`.
///
/// Returns `Ok(false)` when the issuer does not match, the signature does not
/// verify, or `at` is outside the validity window.
///
/// # Errors
///
/// Unsupported signature or key algorithms, and certificates whose key
/// material cannot be decoded.
pub fn verify_certificate(
    cert: &Certificate,
    ca: &Certificate,
    at: Timestamp,
) -> Result<bool, CryptoError> {
    if !cert.is_issued_by(ca) {
        tracing::debug!(issuer = %cert.issuer(), ca = %ca.subject(), "issuer is not the CA");
        return Ok(false);
    }

    let tbs = cert
        .inner
        .tbs_certificate
        .to_der()
        .map_err(|e| CryptoError::CertificateError(format!("cannot encode TBS: {e}")))?;
    let signature = cert.inner.signature.raw_bytes();
    let algorithm = cert.signature_algorithm()?;
    let ca_key = ca.public_key()?;

    if !ca_key.verify(algorithm, &tbs, signature)? {
        tracing::debug!(subject = %cert.subject(), "certificate signature does not verify under CA key");
        return Ok(false);
    }

    if !cert.is_valid_at(at) {
        tracing::debug!(
            %at,
            not_before = %cert.not_before(),
            not_after = %cert.not_after(),
            "instant outside certificate validity"
        );
        return Ok(false);
    }

    tracing::debug!(subject = %cert.subject(), "certificate verified");
    Ok(true)
}

fn to_timestamp(time: x509_cert::time::Time) -> Timestamp {
    let secs = i64::try_from(time.to_unix_duration().as_secs()).unwrap_or(i64::MAX);
    Timestamp::from_epoch_secs_saturating(secs)
}
