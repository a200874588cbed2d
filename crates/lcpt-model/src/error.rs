//! Errors raised while loading documents or reading their fields.

use std::path::PathBuf;

use lcpt_core::{CanonicalizationError, CryptoError, ParseError};
use lcpt_schema::SchemaError;
use thiserror::Error;

/// Error loading a license or reading one of its fields.
#[derive(Error, Debug)]
pub enum LicenseError {
    /// The license file does not exist.
    #[error("license not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The license file exists but could not be read.
    #[error("cannot read license {}: {source}", path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The document is not JSON, or its `links` are malformed.
    #[error("malformed license: {0}")]
    Parse(#[from] ParseError),

    /// The document does not conform to the license schema.
    #[error("license schema: {0}")]
    Schema(#[from] SchemaError),

    /// A required member is absent.
    #[error("license has no {field}")]
    MissingField {
        /// Dotted path of the member.
        field: &'static str,
    },

    /// A member is present but unusable.
    #[error("license {field} is invalid: {reason}")]
    InvalidField {
        /// Dotted path of the member.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// No link with the required relation.
    #[error("license has no '{rel}' link")]
    MissingLink {
        /// Link relation.
        rel: String,
    },

    /// More than one link with a relation that must be unique.
    #[error("license has {count} '{rel}' links, exactly one expected")]
    DuplicateLink {
        /// Link relation.
        rel: String,
        /// How many were found.
        count: usize,
    },

    /// A crypto check could not be evaluated.
    #[error("license crypto: {0}")]
    Crypto(#[from] CryptoError),

    /// The canonical form could not be computed.
    #[error("license canonical form: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Error reading a status document.
#[derive(Error, Debug)]
pub enum StatusError {
    /// The document is not JSON, or does not have the status document shape.
    #[error("malformed status document: {0}")]
    Parse(#[from] ParseError),

    /// The document does not conform to the status schema.
    #[error("status document schema: {0}")]
    Schema(#[from] SchemaError),

    /// No link with the required relation.
    #[error("status document has no '{rel}' link")]
    MissingLink {
        /// Link relation.
        rel: String,
    },

    /// More than one link with a relation that must be unique.
    #[error("status document has {count} '{rel}' links, exactly one expected")]
    DuplicateLink {
        /// Link relation.
        rel: String,
        /// How many were found.
        count: usize,
    },
}
