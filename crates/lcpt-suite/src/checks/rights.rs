//! Loan window checks. `print` and `copy` are only ever reported.

use lcpt_core::Timestamp;
use lcpt_model::License;

use crate::report::Outcome;

/// `rights.start` is present.
pub fn start_present(license: &License) -> Outcome {
    match license.start() {
        Ok(Some(_)) => Outcome::Pass,
        Ok(None) => Outcome::fail("loan license has no rights.start"),
        Err(e) => Outcome::fail(e.to_string()),
    }
}

/// `rights.end` is present.
pub fn end_present(license: &License) -> Outcome {
    match license.end() {
        Ok(Some(_)) => Outcome::Pass,
        Ok(None) => Outcome::fail("loan license has no rights.end"),
        Err(e) => Outcome::fail(e.to_string()),
    }
}

/// `rights.start` is strictly before `rights.end`, when both are present.
pub fn start_before_end(license: &License) -> Outcome {
    match (license.start(), license.end()) {
        (Ok(Some(start)), Ok(Some(end))) => Outcome::check(start < end, || {
            format!("rights.start {start} is not before rights.end {end}")
        }),
        (Ok(_), Ok(_)) => Outcome::Pass,
        (Err(e), _) | (_, Err(e)) => Outcome::fail(e.to_string()),
    }
}

/// `rights.end` is before `now`.
pub fn ended_before(license: &License, now: Timestamp) -> Outcome {
    match license.end() {
        Ok(Some(end)) => Outcome::check(end < now, || {
            format!("rights.end {end} is not in the past (now {now})")
        }),
        Ok(None) => Outcome::fail("license has no rights.end"),
        Err(e) => Outcome::fail(e.to_string()),
    }
}

/// `rights.end` equals `expected` to the second, the resolution a renew
/// request carries.
pub fn end_equals(license: &License, expected: Timestamp) -> Outcome {
    match license.end() {
        Ok(Some(end)) => Outcome::check(end.truncated() == expected.truncated(), || {
            format!("rights.end is {end}, expected {expected}")
        }),
        Ok(None) => Outcome::fail("license has no rights.end"),
        Err(e) => Outcome::fail(e.to_string()),
    }
}

/// `rights.end` moved past `before`.
pub fn end_extended(license: &License, before: Timestamp) -> Outcome {
    match license.end() {
        Ok(Some(end)) => Outcome::check(end > before, || {
            format!("rights.end is {end}, not after the previous end {before}")
        }),
        Ok(None) => Outcome::fail("license has no rights.end"),
        Err(e) => Outcome::fail(e.to_string()),
    }
}

/// Log the rights for the record.
pub fn log_rights(license: &License) {
    match license.rights() {
        Ok(rights) => {
            let limit = |n: u64| {
                if n == u64::MAX {
                    "unlimited".to_string()
                } else {
                    n.to_string()
                }
            };
            tracing::info!(
                print = %limit(rights.print),
                copy = %limit(rights.copy),
                start = ?rights.start.map(|t| t.to_iso8601()),
                end = ?rights.end.map(|t| t.to_iso8601()),
                loan = license.is_loan(),
                "license rights"
            );
        }
        Err(e) => tracing::warn!(error = %e, "license rights unreadable"),
    }
}
