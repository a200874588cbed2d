//! # lcpt-publication — Protected Publication Reader
//!
//! An LCP-protected EPUB is a zip archive carrying the license at
//! `META-INF/license.lcpl` and the list of encrypted resources in
//! `META-INF/encryption.xml`. This crate reads exactly those two entries and
//! checks them against the packaging rules:
//!
//! - every `EncryptedData` uses AES-256-CBC and points its key at the
//!   license's content key;
//! - every encrypted resource exists in the archive;
//! - resources that readers must access in clear are not encrypted;
//! - media resources are not deflated before encryption.
//!
//! Anything else in the archive is treated as opaque.

pub mod container;
pub mod encryption;
pub mod error;

pub use container::{Publication, ResourceViolation, ENCRYPTION_ENTRY, LICENSE_ENTRY};
pub use encryption::{EncryptedData, EncryptionViolation, EncryptionXml};
pub use error::PublicationError;
