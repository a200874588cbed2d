//! # lcpt-core — Foundational Types for the LCP Conformance Harness
//!
//! Every other crate in the workspace depends on `lcpt-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** The bytes a license signature covers are
//!    produced by exactly one pipeline: strip `signature`, reject fractional
//!    numbers, sort keys, compact separators. Signature verification accepts
//!    only `&CanonicalBytes`.
//!
//! 2. **UTC-only timestamps.** License and status documents carry ISO 8601
//!    instants with arbitrary offsets. `Timestamp` normalizes them to UTC at
//!    seconds precision so that ordering comparisons (`updated.status`
//!    monotonicity, `start < end`) are exact.
//!
//! 3. **One link type.** Licenses and status documents share the same link
//!    object shape; [`Link`] and the helpers in [`link`] are used by both.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lcpt-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod error;
pub mod link;
pub mod mime;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use error::{CanonicalizationError, CryptoError, LcptError, ParseError};
pub use link::Link;
pub use temporal::Timestamp;
