//! Client error types.

use lcpt_model::{LicenseError, StatusError};
use lcpt_state::Operation;

use crate::template::TemplateError;

/// Network failure, unexpected status code, or unusable response body.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client could not be built.
    #[error("cannot build HTTP client: {0}")]
    Init(reqwest::Error),

    /// Transport failure after all retries.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    /// The server answered with a status code the call does not accept.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body is not a status document.
    #[error("{endpoint} returned an unusable status document: {source}")]
    MalformedStatus {
        endpoint: String,
        source: StatusError,
    },

    /// The response body is not a license.
    #[error("{endpoint} returned an unusable license: {source}")]
    MalformedLicense {
        endpoint: String,
        source: LicenseError,
    },

    /// A URL could not be built.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl TransportError {
    /// The status code, when the failure is an HTTP response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure of a status document operation.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The status document has no link for the operation.
    #[error("status document has no '{rel}' link")]
    MissingLink { rel: String },

    /// The link is not a URI template.
    #[error("'{rel}' link is not templated")]
    NotTemplated { rel: String },

    /// The link declares a media type other than the status document's.
    #[error("'{rel}' link has type {found}, expected {expected}")]
    WrongLinkType {
        rel: String,
        expected: &'static str,
        found: String,
    },

    /// The link template cannot be expanded.
    #[error("'{rel}' link: {source}")]
    Template { rel: String, source: TemplateError },

    /// The server refused the operation.
    #[error("{operation} rejected with {status_code}: {body}")]
    Rejected {
        operation: Operation,
        status_code: u16,
        body: String,
    },

    /// The request never produced a usable answer.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
