//! Errors raised while opening a publication or reading its entries.

use std::path::PathBuf;

use lcpt_core::ParseError;
use lcpt_model::LicenseError;
use thiserror::Error;

/// Error reading a protected publication.
#[derive(Error, Debug)]
pub enum PublicationError {
    /// The publication file does not exist.
    #[error("publication not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// IO error while reading the archive.
    #[error("cannot read publication: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a readable zip archive.
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required entry is absent from the archive.
    #[error("publication has no {0}")]
    MissingEntry(String),

    /// `encryption.xml` is not well-formed.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// The embedded license could not be read.
    #[error("embedded license: {0}")]
    License(#[from] LicenseError),
}
