//! # Transition Table
//!
//! What a conforming status server does for each (status, operation) pair.
//! Client operations are the three a harness can invoke through status
//! document links; server transitions (`cancel`, `revoke`, expiry) happen
//! out of band and are only ever observed.

use serde::{Deserialize, Serialize};

use crate::status::{EventType, LicenseStatus};

// ─── Operations ──────────────────────────────────────────────────────

/// A client operation on a status document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Register,
    Renew,
    Return,
}

impl Operation {
    /// All client operations.
    pub const ALL: [Operation; 3] = [Self::Register, Self::Renew, Self::Return];

    /// The link relation that carries the operation.
    pub fn rel(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Renew => "renew",
            Self::Return => "return",
        }
    }

    /// The event a successful, state-changing call records.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Register => EventType::Register,
            Self::Renew => EventType::Renew,
            Self::Return => EventType::Return,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.rel())
    }
}

/// A transition the server performs without a client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerTransition {
    /// Provider cancels a license that was never used.
    Cancel,
    /// Provider revokes a license.
    Revoke,
    /// The loan period ends.
    Expire,
}

impl ServerTransition {
    /// Target status.
    pub fn target(&self) -> LicenseStatus {
        match self {
            Self::Cancel => LicenseStatus::Cancelled,
            Self::Revoke => LicenseStatus::Revoked,
            Self::Expire => LicenseStatus::Expired,
        }
    }

    /// Event recorded for the transition. Expiry records none.
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            Self::Cancel => Some(EventType::Cancel),
            Self::Revoke => Some(EventType::Revoke),
            Self::Expire => None,
        }
    }
}

impl std::fmt::Display for ServerTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Cancel => "cancel",
            Self::Revoke => "revoke",
            Self::Expire => "expire",
        };
        f.write_str(s)
    }
}

// ─── Expectations ────────────────────────────────────────────────────

/// Required server behaviour for a client operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expectation {
    /// Accept, move to the given status, advance `updated.status` and record
    /// an event.
    Transition(LicenseStatus),
    /// Accept without any change: same status, same `updated.status`, no new
    /// event.
    Idempotent,
    /// Refuse with a 4xx.
    Rejected,
}

/// The transition table for client operations.
pub fn expected(from: LicenseStatus, op: Operation) -> Expectation {
    use LicenseStatus::*;
    use Operation::*;

    match (from, op) {
        (Ready, Register) => Expectation::Transition(Active),
        (Ready, Return) => Expectation::Transition(Cancelled),
        (Ready, Renew) => Expectation::Rejected,
        (Active, Register) => Expectation::Idempotent,
        (Active, Renew) => Expectation::Transition(Active),
        (Active, Return) => Expectation::Transition(Returned),
        (Returned | Revoked | Cancelled | Expired, _) => Expectation::Rejected,
    }
}

/// The status a server transition leads to from `from`, or `None` when the
/// transition is not possible from there.
pub fn server_transition(from: LicenseStatus, transition: ServerTransition) -> Option<LicenseStatus> {
    use LicenseStatus::*;

    match (from, transition) {
        (Ready, ServerTransition::Cancel) => Some(Cancelled),
        (Ready | Active, ServerTransition::Revoke) => Some(Revoked),
        (Active, ServerTransition::Expire) => Some(Expired),
        _ => None,
    }
}
