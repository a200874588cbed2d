//! # Temporal Types — UTC Timestamps
//!
//! Defines `Timestamp`, a UTC instant kept at the precision it was parsed
//! with.
//!
//! License and status documents are produced by servers in many languages
//! and carry instants such as `2017-09-01T10:00:00Z`,
//! `2017-09-01T12:00:00+02:00` or `2017-09-01T10:00:00.123456Z`. All of them
//! denote an instant; the harness compares instants, never strings.
//!
//! Outgoing values (the `end` parameter of a renew request, report output)
//! are always rendered as `YYYY-MM-DDTHH:MM:SSZ`. Ordering and equality use
//! the full instant, so two status updates within the same second still
//! compare correctly.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

/// Number of seconds in a day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// A UTC timestamp.
///
/// # Construction
///
/// - [`Timestamp::now()`]: current UTC time.
/// - [`Timestamp::from_utc()`]: from a `DateTime<Utc>`.
/// - [`Timestamp::parse()`]: from an RFC 3339 string with any offset.
/// - [`Timestamp::from_epoch_secs()`]: from a Unix timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parse an RFC 3339 / ISO 8601 instant, accepting any offset and
    /// converting to UTC.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Timestamp` if the string is not RFC 3339.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ParseError::Timestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(dt.with_timezone(&Utc)))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ParseError> {
        let dt = DateTime::from_timestamp(secs, 0).ok_or_else(|| ParseError::Timestamp {
            value: secs.to_string(),
            reason: "out of range".to_string(),
        })?;
        Ok(Self(dt))
    }

    /// Create a timestamp from a Unix epoch timestamp, clamping values
    /// outside the representable range.
    pub fn from_epoch_secs_saturating(secs: i64) -> Self {
        match DateTime::from_timestamp(secs, 0) {
            Some(dt) => Self(dt),
            None if secs < 0 => Self(DateTime::<Utc>::MIN_UTC),
            None => Self(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// The instant `days` days later (earlier when negative).
    ///
    /// Saturates at the representable range.
    pub fn plus_days(&self, days: i64) -> Self {
        self.plus_secs(days.saturating_mul(SECONDS_PER_DAY))
    }

    /// The instant `secs` seconds later (earlier when negative).
    pub fn plus_secs(&self, secs: i64) -> Self {
        let shifted = Duration::try_seconds(secs)
            .and_then(|d| self.0.checked_add_signed(d))
            .unwrap_or(if secs >= 0 {
                DateTime::<Utc>::MAX_UTC
            } else {
                DateTime::<Utc>::MIN_UTC
            });
        Self(shifted)
    }

    /// The same instant with sub-seconds discarded: the value
    /// [`to_iso8601`](Self::to_iso8601) denotes.
    pub fn truncated(&self) -> Self {
        Self(truncate_to_seconds(self.0))
    }

    /// Render as ISO 8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`),
    /// dropping sub-seconds.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
