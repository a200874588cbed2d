//! # Check Library
//!
//! Every check is a plain function returning an [`Outcome`](crate::Outcome).
//! Scenarios call them explicitly, in order, and record each result under a
//! name; no check aborts a scenario.
//!
//! | Module | Concern |
//! |--------|---------|
//! | [`links`] | link relations, media types, https, templating |
//! | [`structural`] | JSON schema conformance |
//! | [`crypto`] | certificate, signature, content key, key check |
//! | [`rights`] | loan window |
//! | [`lifecycle`] | status transitions, events, rejections |
//! | [`publication`] | encryption manifest and archive contents |

pub mod crypto;
pub mod lifecycle;
pub mod links;
pub mod publication;
pub mod rights;
pub mod structural;
