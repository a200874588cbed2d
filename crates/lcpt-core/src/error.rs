//! # Error Types — Structured Error Hierarchy
//!
//! Error types shared across the harness. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Parse errors name the offending value and the reason it was refused.
//! - Cryptographic errors distinguish unsupported algorithm identifiers from
//!   malformed key material; a signature that simply does not verify is not
//!   an error but a `false` result.
//! - Errors owned by a single concern (schema, license, transport, lifecycle)
//!   live in the crate for that concern.

use thiserror::Error;

/// Top-level error type for the foundational layer.
#[derive(Error, Debug)]
pub enum LcptError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Malformed input document.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Non-integral numbers have no canonical representation in a license.
    #[error("non-integral number {0} has no canonical representation")]
    FloatRejected(f64),

    /// The canonical form is computed over a JSON object.
    #[error("canonical form requires a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The algorithm identifier is not one the harness implements.
    #[error("unsupported {kind} algorithm: {uri}")]
    UnsupportedAlgorithm {
        /// Which family of algorithm (hash, cipher, signature).
        kind: &'static str,
        /// The identifier found in the document.
        uri: String,
    },

    /// Key material could not be parsed or has the wrong size.
    #[error("key error: {0}")]
    KeyError(String),

    /// Ciphertext could not be decrypted (length or padding).
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// A certificate could not be decoded.
    #[error("certificate error: {0}")]
    CertificateError(String),

    /// A base64 field could not be decoded.
    #[error("invalid base64 in {field}: {reason}")]
    Encoding {
        /// Document field or input name.
        field: String,
        /// Decoder message.
        reason: String,
    },
}

/// Malformed JSON, XML or timestamp input.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The input is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is not a valid ISO 8601 instant.
    #[error("invalid timestamp {value:?}: {reason}")]
    Timestamp {
        /// The rejected value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The input is not well-formed XML.
    #[error("invalid XML: {0}")]
    Xml(String),
}
