//! # License Document
//!
//! A license is kept as the JSON value it was parsed from. Accessors read
//! members on demand and report absent or malformed members as
//! `LicenseError::MissingField` / `InvalidField`, so that a check on one
//! member never depends on the validity of another.
//!
//! ## Rights
//!
//! `print` and `copy` are counters; an absent counter means unlimited and
//! reads as `u64::MAX`. `start` and `end` bound the usage period; a license
//! with an `end` is a loan.

use std::path::Path;

use lcpt_core::{link, CanonicalBytes, Link, ParseError, Timestamp};
use lcpt_crypto::{decode_base64, verify_certificate, verify_signature, Certificate};
use lcpt_schema::{SchemaError, SchemaValidator};
use serde_json::Value;

use crate::error::LicenseError;

/// Rights granted by a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rights {
    /// Pages that may be printed; `u64::MAX` when unlimited.
    pub print: u64,
    /// Characters that may be copied; `u64::MAX` when unlimited.
    pub copy: u64,
    /// Start of the usage period.
    pub start: Option<Timestamp>,
    /// End of the usage period; present on loans.
    pub end: Option<Timestamp>,
}

/// A parsed license document.
#[derive(Debug, Clone)]
pub struct License {
    raw: Value,
    links: Vec<Link>,
}

impl License {
    /// Parse a license from JSON bytes.
    ///
    /// # Errors
    ///
    /// `Parse` if the bytes are not a JSON object or `links` is not an array
    /// of link objects.
    pub fn parse(bytes: &[u8]) -> Result<Self, LicenseError> {
        let raw: Value = serde_json::from_slice(bytes).map_err(ParseError::from)?;
        Self::from_value(raw)
    }

    /// Build a license from an already parsed JSON value.
    pub fn from_value(raw: Value) -> Result<Self, LicenseError> {
        if !raw.is_object() {
            return Err(LicenseError::InvalidField {
                field: "(root)",
                reason: "not a JSON object".to_string(),
            });
        }
        let links = match raw.get("links") {
            None => Vec::new(),
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(ParseError::from)?
            }
        };
        Ok(Self { raw, links })
    }

    /// Load a license file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LicenseError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LicenseError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                LicenseError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let license = Self::parse(&bytes)?;
        tracing::debug!(path = %path.display(), id = license.id().unwrap_or("?"), "license loaded");
        Ok(license)
    }

    /// Parse and validate against the license schema in one step.
    pub fn parse_validated(bytes: &[u8], schema: &SchemaValidator) -> Result<Self, LicenseError> {
        let license = Self::parse(bytes)?;
        license.validate_schema(schema)?;
        Ok(license)
    }

    /// Validate the document against the license schema.
    pub fn validate_schema(&self, schema: &SchemaValidator) -> Result<(), SchemaError> {
        schema.validate(&self.raw)
    }

    /// The document as parsed.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    // ─── Identity ────────────────────────────────────────────────────

    /// `id`.
    pub fn id(&self) -> Result<&str, LicenseError> {
        self.str_at("/id", "id")
    }

    /// `provider`.
    pub fn provider(&self) -> Result<&str, LicenseError> {
        self.str_at("/provider", "provider")
    }

    /// `issued`.
    pub fn issued(&self) -> Result<Timestamp, LicenseError> {
        self.timestamp_at("/issued", "issued")?
            .ok_or(LicenseError::MissingField { field: "issued" })
    }

    /// `updated`, if present.
    pub fn updated(&self) -> Result<Option<Timestamp>, LicenseError> {
        self.timestamp_at("/updated", "updated")
    }

    // ─── Rights ──────────────────────────────────────────────────────

    /// `rights.start`, if present.
    pub fn start(&self) -> Result<Option<Timestamp>, LicenseError> {
        self.timestamp_at("/rights/start", "rights.start")
    }

    /// `rights.end`, if present.
    pub fn end(&self) -> Result<Option<Timestamp>, LicenseError> {
        self.timestamp_at("/rights/end", "rights.end")
    }

    /// Whether the license is a loan (`rights.end` present).
    pub fn is_loan(&self) -> bool {
        self.raw
            .pointer("/rights/end")
            .is_some_and(|v| !v.is_null())
    }

    /// All rights.
    pub fn rights(&self) -> Result<Rights, LicenseError> {
        Ok(Rights {
            print: self.counter_at("/rights/print", "rights.print")?,
            copy: self.counter_at("/rights/copy", "rights.copy")?,
            start: self.start()?,
            end: self.end()?,
        })
    }

    // ─── Encryption ──────────────────────────────────────────────────

    /// `encryption.profile`.
    pub fn profile(&self) -> Result<&str, LicenseError> {
        self.str_at("/encryption/profile", "encryption.profile")
    }

    /// `encryption.user_key.algorithm`.
    pub fn user_key_algorithm(&self) -> Result<&str, LicenseError> {
        self.str_at("/encryption/user_key/algorithm", "encryption.user_key.algorithm")
    }

    /// `encryption.user_key.text_hint`.
    pub fn text_hint(&self) -> Result<&str, LicenseError> {
        self.str_at("/encryption/user_key/text_hint", "encryption.user_key.text_hint")
    }

    /// `encryption.user_key.key_check`, decoded.
    pub fn key_check(&self) -> Result<Vec<u8>, LicenseError> {
        self.base64_at("/encryption/user_key/key_check", "encryption.user_key.key_check")
    }

    /// `encryption.content_key.algorithm`.
    pub fn content_key_algorithm(&self) -> Result<&str, LicenseError> {
        self.str_at("/encryption/content_key/algorithm", "encryption.content_key.algorithm")
    }

    /// `encryption.content_key.encrypted_value`, decoded. The length is not
    /// checked here.
    pub fn content_key(&self) -> Result<Vec<u8>, LicenseError> {
        self.base64_at(
            "/encryption/content_key/encrypted_value",
            "encryption.content_key.encrypted_value",
        )
    }

    // ─── Signature ───────────────────────────────────────────────────

    /// `signature.algorithm`.
    pub fn signature_algorithm(&self) -> Result<&str, LicenseError> {
        self.str_at("/signature/algorithm", "signature.algorithm")
    }

    /// `signature.value`, base64 as in the document.
    pub fn signature_value(&self) -> Result<&str, LicenseError> {
        self.str_at("/signature/value", "signature.value")
    }

    /// The provider certificate embedded in `signature.certificate`.
    pub fn certificate(&self) -> Result<Certificate, LicenseError> {
        let text = self.str_at("/signature/certificate", "signature.certificate")?;
        Ok(Certificate::parse(text)?)
    }

    /// The bytes the signature covers.
    pub fn canonical(&self) -> Result<CanonicalBytes, LicenseError> {
        Ok(CanonicalBytes::for_signature(&self.raw)?)
    }

    // ─── Links ───────────────────────────────────────────────────────

    /// All links, in document order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// First link with relation `rel`.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        link::find(&self.links, rel)
    }

    /// The single link with relation `rel`.
    ///
    /// # Errors
    ///
    /// `MissingLink` when there is none, `DuplicateLink` when there are
    /// several.
    pub fn required_link(&self, rel: &str) -> Result<&Link, LicenseError> {
        match link::count(&self.links, rel) {
            0 => Err(LicenseError::MissingLink {
                rel: rel.to_string(),
            }),
            1 => self.link(rel).ok_or(LicenseError::MissingLink {
                rel: rel.to_string(),
            }),
            count => Err(LicenseError::DuplicateLink {
                rel: rel.to_string(),
                count,
            }),
        }
    }

    // ─── Crypto bindings ─────────────────────────────────────────────

    /// Whether `passphrase` unlocks this license.
    pub fn check_user_key(&self, passphrase: &str) -> Result<bool, LicenseError> {
        Ok(lcpt_crypto::check_user_key(
            passphrase,
            self.user_key_algorithm()?,
            &self.key_check()?,
            self.id()?,
            self.content_key_algorithm()?,
        )?)
    }

    /// Whether the provider certificate chains to `ca` and was valid when the
    /// license was issued.
    pub fn check_certificate(&self, ca: &Certificate) -> Result<bool, LicenseError> {
        Ok(verify_certificate(&self.certificate()?, ca, self.issued()?)?)
    }

    /// Whether the signature verifies over the canonical form.
    pub fn check_signature(&self) -> Result<bool, LicenseError> {
        Ok(verify_signature(
            self.signature_value()?,
            &self.certificate()?,
            &self.canonical()?,
            self.signature_algorithm()?,
        )?)
    }

    // ─── Field access ────────────────────────────────────────────────

    fn str_at(&self, pointer: &str, field: &'static str) -> Result<&str, LicenseError> {
        match self.raw.pointer(pointer) {
            None | Some(Value::Null) => Err(LicenseError::MissingField { field }),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(LicenseError::InvalidField {
                field,
                reason: format!("expected a string, found {other}"),
            }),
        }
    }

    fn timestamp_at(
        &self,
        pointer: &str,
        field: &'static str,
    ) -> Result<Option<Timestamp>, LicenseError> {
        match self.str_at(pointer, field) {
            Err(LicenseError::MissingField { .. }) => Ok(None),
            Err(e) => Err(e),
            Ok(s) => Timestamp::parse(s)
                .map(Some)
                .map_err(|e| LicenseError::InvalidField {
                    field,
                    reason: e.to_string(),
                }),
        }
    }

    fn counter_at(&self, pointer: &str, field: &'static str) -> Result<u64, LicenseError> {
        match self.raw.pointer(pointer) {
            None | Some(Value::Null) => Ok(u64::MAX),
            Some(value) => value.as_u64().ok_or_else(|| LicenseError::InvalidField {
                field,
                reason: format!("expected a non-negative integer, found {value}"),
            }),
        }
    }

    fn base64_at(&self, pointer: &str, field: &'static str) -> Result<Vec<u8>, LicenseError> {
        let text = self.str_at(pointer, field)?;
        Ok(decode_base64(field, text)?)
    }
}
