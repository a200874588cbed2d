//! Media types of the documents the harness exchanges.

/// License document media type.
pub const LICENSE: &str = "application/vnd.readium.lcp.license-1.0+json";

/// Older spelling of the license media type, still emitted by some servers.
pub const LICENSE_LEGACY: &str = "application/vnd.readium.lcp.license.1.0+json";

/// Status document media type.
pub const STATUS: &str = "application/vnd.readium.license.status.v1.0+json";

/// EPUB publication media type.
pub const PUBLICATION: &str = "application/epub+zip";

/// Whether `media_type` names the license document format.
///
/// Both the current and the legacy spelling are the same contract.
pub fn is_license(media_type: &str) -> bool {
    media_type == LICENSE || media_type == LICENSE_LEGACY
}
