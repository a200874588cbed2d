//! # Canonical Serialization — License Signature Input
//!
//! This module defines `CanonicalBytes`, the sole construction path for the
//! bytes a license signature covers.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through [`CanonicalBytes::new()`] or
//! [`CanonicalBytes::for_signature()`], both of which apply the full coercion
//! pipeline before JCS serialization. Signature verification accepts only
//! `&CanonicalBytes`, so a raw `serde_json::to_vec()` can never reach it.
//!
//! ## Coercion Rules
//!
//! 1. **Strip the signature**: `for_signature()` removes the top-level
//!    `signature` member; the signature covers everything else.
//! 2. **Integral numbers**: `10`, `10.0` and `1e1` all serialize as `10`.
//! 3. **Reject fractions**: a non-integral number has no canonical form and
//!    is refused.
//!
//! After coercion, serialization uses `serde_jcs` (RFC 8785): keys sorted
//! recursively, compact separators, no HTML escaping, UTF-8 output.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::CanonicalizationError;

/// Name of the member excluded from the signed bytes.
pub const SIGNATURE_MEMBER: &str = "signature";

/// Bytes produced exclusively by JCS canonicalization with the license
/// coercion rules.
///
/// # Invariants
///
/// - Keys are sorted at every depth.
/// - Separators are compact (`,` and `:`), with no whitespace.
/// - Numbers are integers.
/// - Canonicalizing the parsed output again yields the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains a
    /// non-integral number, `SerializationFailed` if serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let coerced = coerce_json_value(value)?;
        let bytes = serialize_canonical(&coerced)?;
        Ok(Self(bytes))
    }

    /// Construct the signature input of a license document: the document
    /// with its top-level `signature` member removed, canonicalized.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::NotAnObject` if `document` is not a
    /// JSON object, plus the errors of [`CanonicalBytes::new()`].
    pub fn for_signature(document: &Value) -> Result<Self, CanonicalizationError> {
        let Value::Object(map) = document else {
            return Err(CanonicalizationError::NotAnObject(json_kind(document)));
        };
        let mut stripped = map.clone();
        stripped.remove(SIGNATURE_MEMBER);
        Self::new(&Value::Object(stripped))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Recursively coerce JSON values.
///
/// 1. `null`, `bool`, `string`, `integer`: pass through unchanged.
/// 2. `float` with a zero fractional part: rewritten as an integer.
/// 3. `float` with a fractional part: **rejected** with `FloatRejected`.
/// 4. `object`, `array`: recursed.
fn coerce_json_value(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(n) => coerce_number(n).map(Value::Number),
        Value::Object(map) => {
            let mut coerced = serde_json::Map::new();
            for (k, v) in map {
                coerced.insert(k, coerce_json_value(v)?);
            }
            Ok(Value::Object(coerced))
        }
        Value::Array(arr) => {
            let coerced: Result<Vec<_>, _> = arr.into_iter().map(coerce_json_value).collect();
            Ok(Value::Array(coerced?))
        }
    }
}

fn coerce_number(n: Number) -> Result<Number, CanonicalizationError> {
    if n.is_i64() || n.is_u64() {
        return Ok(n);
    }
    let f = n.as_f64().unwrap_or(f64::NAN);
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        return Ok(Number::from(f as i64));
    }
    Err(CanonicalizationError::FloatRejected(f))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serialize a JSON value in JCS-canonical form (RFC 8785).
fn serialize_canonical(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    let s = serde_jcs::to_string(value)?;
    Ok(s.into_bytes())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value_no_floats() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,50}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,10}", inner, 0..8)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn canonical_bytes_deterministic(value in json_value_no_floats()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        /// Canonicalizing already-canonical output is a no-op.
        #[test]
        fn canonical_bytes_idempotent(value in json_value_no_floats()) {
            let first = CanonicalBytes::new(&value).unwrap();
            let reparsed: Value = serde_json::from_slice(first.as_bytes()).unwrap();
            let second = CanonicalBytes::new(&reparsed).unwrap();
            prop_assert_eq!(first.as_bytes(), second.as_bytes());
        }

        /// The signature member never influences the signed bytes.
        #[test]
        fn signature_member_ignored(
            value in json_value_no_floats(),
            sig in "[A-Za-z0-9+/=]{0,40}"
        ) {
            let mut with_sig = serde_json::Map::new();
            with_sig.insert("body".into(), value.clone());
            let without = CanonicalBytes::for_signature(&Value::Object(with_sig.clone())).unwrap();
            with_sig.insert("signature".into(), serde_json::json!({"value": sig}));
            let with = CanonicalBytes::for_signature(&Value::Object(with_sig)).unwrap();
            prop_assert_eq!(without.as_bytes(), with.as_bytes());
        }

        #[test]
        fn fractional_always_rejected(f in any::<f64>().prop_filter("fractional", |f| {
            f.fract() != 0.0 && f.is_finite()
        })) {
            let data = serde_json::json!({"val": f});
            prop_assert!(CanonicalBytes::new(&data).is_err());
        }
    }
}
