//! Algorithm identifiers used by license documents.
//!
//! Licenses name their algorithms by URI. Each family is a closed enum; an
//! identifier outside it is a `CryptoError::UnsupportedAlgorithm`, never a
//! silent fallback.

use lcpt_core::CryptoError;

/// Passphrase hashing algorithm (`encryption.user_key.algorithm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

impl HashAlgorithm {
    pub const SHA256_URI: &'static str = "http://www.w3.org/2001/04/xmlenc#sha256";

    /// Resolve an algorithm URI.
    pub fn from_uri(uri: &str) -> Result<Self, CryptoError> {
        match uri {
            Self::SHA256_URI => Ok(Self::Sha256),
            other => Err(CryptoError::UnsupportedAlgorithm {
                kind: "hash",
                uri: other.to_string(),
            }),
        }
    }

    pub fn uri(&self) -> &'static str {
        match self {
            Self::Sha256 => Self::SHA256_URI,
        }
    }
}

/// Symmetric cipher (`encryption.content_key.algorithm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherAlgorithm {
    /// AES-256 in CBC mode, PKCS#7 padding, IV prepended.
    Aes256Cbc,
}

impl CipherAlgorithm {
    pub const AES256_CBC_URI: &'static str = "http://www.w3.org/2001/04/xmlenc#aes256-cbc";

    /// Resolve an algorithm URI.
    pub fn from_uri(uri: &str) -> Result<Self, CryptoError> {
        match uri {
            Self::AES256_CBC_URI => Ok(Self::Aes256Cbc),
            other => Err(CryptoError::UnsupportedAlgorithm {
                kind: "cipher",
                uri: other.to_string(),
            }),
        }
    }

    pub fn uri(&self) -> &'static str {
        match self {
            Self::Aes256Cbc => Self::AES256_CBC_URI,
        }
    }
}

/// License signature algorithm (`signature.algorithm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    RsaSha256,
    /// ECDSA on P-256 with SHA-256.
    EcdsaSha256,
}

impl SignatureAlgorithm {
    pub const RSA_SHA256_URI: &'static str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
    pub const ECDSA_SHA256_URI: &'static str =
        "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256";

    /// Resolve an algorithm URI. Matching is case-insensitive.
    pub fn from_uri(uri: &str) -> Result<Self, CryptoError> {
        if uri.eq_ignore_ascii_case(Self::RSA_SHA256_URI) {
            Ok(Self::RsaSha256)
        } else if uri.eq_ignore_ascii_case(Self::ECDSA_SHA256_URI) {
            Ok(Self::EcdsaSha256)
        } else {
            Err(CryptoError::UnsupportedAlgorithm {
                kind: "signature",
                uri: uri.to_string(),
            })
        }
    }

    pub fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => Self::RSA_SHA256_URI,
            Self::EcdsaSha256 => Self::ECDSA_SHA256_URI,
        }
    }
}
