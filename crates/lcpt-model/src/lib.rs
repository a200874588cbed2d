//! # lcpt-model — License and Status Documents
//!
//! Read-only models of the two JSON documents a conformance run inspects.
//!
//! - [`License`] keeps the document as parsed JSON and exposes typed
//!   accessors. Keeping the raw value matters: the signature covers the
//!   canonical form of the whole document, including members the harness
//!   does not interpret.
//! - [`StatusDocument`] is deserialized into a closed shape (`status` and
//!   event types are enums) and also keeps its raw value for schema
//!   validation.
//!
//! Both are immutable. A server mutation produces a new document, never an
//! in-place update.

pub mod error;
pub mod license;
pub mod status;

pub use error::{LicenseError, StatusError};
pub use license::{License, Rights};
pub use status::{Event, PotentialRights, StatusDocument, Updated};
