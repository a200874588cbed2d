//! # lcpt-schema — Schema Validation
//!
//! Validates license and status documents against the JSON Schemas
//! published with the LCP and LSD specifications. The schema files are
//! configuration input; nothing is bundled.
//!
//! ## Crate Policy
//!
//! - No internal dependencies.
//! - Cross-schema `$ref`s resolve against files next to the root schema,
//!   never over the network.
//! - Invalid documents are reported with every violation, each carrying the
//!   instance path and the schema path that rejected it.

pub mod validate;

pub use validate::{SchemaError, SchemaValidator, ValidationViolations, Violation};
