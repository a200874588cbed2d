//! # Lifecycle Model
//!
//! Follows one license through a scenario. Each server response is fed to
//! the model as an observation; the model compares it with the transition
//! table and the previous snapshot.
//!
//! ## Invariants Checked
//!
//! - An operation the table rejects must not be accepted, and vice versa.
//! - Rejections are 4xx responses.
//! - A state-changing call lands on the table's target status and moves
//!   `updated.status` strictly forward.
//! - An idempotent call changes nothing: status, `updated.status` and the
//!   number of events stay the same.
//! - `updated.status` never moves backwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lcpt_core::Timestamp;

use crate::status::{EventType, LicenseStatus};
use crate::transition::{expected, server_transition, Expectation, Operation, ServerTransition};

// ─── Snapshot ────────────────────────────────────────────────────────

/// The lifecycle-relevant part of a status document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// `status`.
    pub status: LicenseStatus,
    /// `updated.status`.
    pub updated: Timestamp,
    /// Length of `events`, when the document lists events.
    pub events: Option<usize>,
}

/// Rebuild the snapshot an event log leads to, starting from a `ready`
/// license last touched at `issued`.
///
/// Each logged event is applied through the transition table; an event the
/// table would have refused leaves the status where it was. `updated` is the
/// latest of `issued` and the event timestamps.
pub fn replay<I>(issued: Timestamp, events: I) -> Snapshot
where
    I: IntoIterator<Item = (EventType, Timestamp)>,
{
    let mut snapshot = Snapshot {
        status: LicenseStatus::Ready,
        updated: issued,
        events: Some(0),
    };
    for (event_type, at) in events {
        let from = snapshot.status;
        snapshot.status = match event_type {
            EventType::Register => apply(from, Operation::Register),
            EventType::Renew => apply(from, Operation::Renew),
            EventType::Return => apply(from, Operation::Return),
            EventType::Cancel => server_transition(from, ServerTransition::Cancel).unwrap_or(from),
            EventType::Revoke => server_transition(from, ServerTransition::Revoke).unwrap_or(from),
        };
        snapshot.updated = snapshot.updated.max(at);
        snapshot.events = snapshot.events.map(|n| n + 1);
    }
    snapshot
}

fn apply(from: LicenseStatus, op: Operation) -> LicenseStatus {
    match expected(from, op) {
        Expectation::Transition(to) => to,
        Expectation::Idempotent | Expectation::Rejected => from,
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// An observed server response that contradicts the lifecycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleViolation {
    /// The server accepted an operation that must be refused.
    #[error("{operation} accepted in status {from}, a 4xx rejection was expected")]
    ForbiddenAccepted {
        /// The operation.
        operation: Operation,
        /// Status before the call.
        from: LicenseStatus,
    },

    /// The server refused an operation that must be accepted.
    #[error("{operation} rejected with HTTP {status_code} in status {from}")]
    UnexpectedRejection {
        /// The operation.
        operation: Operation,
        /// Status before the call.
        from: LicenseStatus,
        /// HTTP status returned.
        status_code: u16,
    },

    /// A refusal that is not a client error.
    #[error("{operation} refused with HTTP {status_code}, a 4xx was expected")]
    NotClientError {
        /// The operation.
        operation: Operation,
        /// HTTP status returned.
        status_code: u16,
    },

    /// The status document reports a different status than required.
    #[error("status is {actual}, expected {expected}")]
    WrongStatus {
        /// Required status.
        expected: LicenseStatus,
        /// Reported status.
        actual: LicenseStatus,
    },

    /// A state-changing call left `updated.status` where it was.
    #[error("updated.status did not advance after {operation} (before {before}, after {after})")]
    NotAdvanced {
        /// The operation.
        operation: Operation,
        /// `updated.status` before the call.
        before: Timestamp,
        /// `updated.status` after the call.
        after: Timestamp,
    },

    /// `updated.status` moved backwards.
    #[error("updated.status moved backwards from {before} to {after}")]
    NonMonotonic {
        /// Previous value.
        before: Timestamp,
        /// Observed value.
        after: Timestamp,
    },

    /// An idempotent call changed the document.
    #[error("{operation} should have been idempotent but changed {field}")]
    IdempotenceViolated {
        /// The operation.
        operation: Operation,
        /// What changed: `status`, `updated.status` or `events`.
        field: &'static str,
    },

    /// The server reports a server-side transition that is not possible
    /// from the previous status.
    #[error("{transition} is not possible from status {from}")]
    ServerTransitionNotAllowed {
        /// The transition.
        transition: ServerTransition,
        /// Status before the transition.
        from: LicenseStatus,
    },
}

// ─── Transition Log ──────────────────────────────────────────────────

/// What caused a recorded transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// A client operation.
    Operation(Operation),
    /// A server-side transition.
    Server(ServerTransition),
}

/// Record of an accepted call or server transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// What caused it.
    pub trigger: Trigger,
    /// Status before.
    pub from_state: LicenseStatus,
    /// Status after.
    pub to_state: LicenseStatus,
    /// `updated.status` after.
    pub updated: Timestamp,
}

// ─── Model ───────────────────────────────────────────────────────────

/// One license's lifecycle as observed from the client side.
#[derive(Debug, Clone)]
pub struct LifecycleModel {
    current: Snapshot,
    transitions: Vec<TransitionRecord>,
}

impl LifecycleModel {
    /// Start from the status document fetched before any operation.
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: initial,
            transitions: Vec::new(),
        }
    }

    /// The last observed snapshot.
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// The last observed status.
    pub fn status(&self) -> LicenseStatus {
        self.current.status
    }

    /// Whether the last observed status is terminal.
    pub fn is_terminal(&self) -> bool {
        self.current.status.is_terminal()
    }

    /// Ordered log of accepted calls and server transitions.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// What the table requires for `op` from the current status.
    pub fn expectation(&self, op: Operation) -> Expectation {
        expected(self.current.status, op)
    }

    /// Check that the current status is `status`.
    pub fn require_status(&self, status: LicenseStatus) -> Result<(), LifecycleViolation> {
        if self.current.status == status {
            Ok(())
        } else {
            Err(LifecycleViolation::WrongStatus {
                expected: status,
                actual: self.current.status,
            })
        }
    }

    /// The server accepted `op` and returned a status document described by
    /// `after`. The model adopts `after` whatever the verdict.
    pub fn observe_accepted(
        &mut self,
        op: Operation,
        after: Snapshot,
    ) -> Result<(), LifecycleViolation> {
        let before = self.current;
        let verdict = judge_accepted(op, &before, &after);
        if after.status != before.status || after.updated != before.updated {
            self.do_transition(Trigger::Operation(op), after);
        } else {
            self.current = after;
        }
        match &verdict {
            Ok(()) => tracing::debug!(%op, from = %before.status, to = %after.status, "accepted"),
            Err(v) => tracing::debug!(%op, violation = %v, "accepted in violation of the lifecycle"),
        }
        verdict
    }

    /// The server refused `op` with `status_code`. The state is unchanged.
    pub fn observe_rejected(&self, op: Operation, status_code: u16) -> Result<(), LifecycleViolation> {
        if !(400..500).contains(&status_code) {
            return Err(LifecycleViolation::NotClientError {
                operation: op,
                status_code,
            });
        }
        match self.expectation(op) {
            Expectation::Rejected => {
                tracing::debug!(%op, status_code, from = %self.current.status, "rejected as required");
                Ok(())
            }
            Expectation::Transition(_) | Expectation::Idempotent => {
                Err(LifecycleViolation::UnexpectedRejection {
                    operation: op,
                    from: self.current.status,
                    status_code,
                })
            }
        }
    }

    /// A status document fetched later reports a server-side transition.
    pub fn observe_server(
        &mut self,
        transition: ServerTransition,
        after: Snapshot,
    ) -> Result<(), LifecycleViolation> {
        let before = self.current;
        let verdict = match server_transition(before.status, transition) {
            None => Err(LifecycleViolation::ServerTransitionNotAllowed {
                transition,
                from: before.status,
            }),
            Some(target) if target != after.status => Err(LifecycleViolation::WrongStatus {
                expected: target,
                actual: after.status,
            }),
            Some(_) => check_monotonic(&before, &after),
        };
        self.do_transition(Trigger::Server(transition), after);
        verdict
    }

    /// A refetched status document with no call in between. Only
    /// monotonicity applies.
    pub fn observe_refresh(&mut self, after: Snapshot) -> Result<(), LifecycleViolation> {
        let verdict = check_monotonic(&self.current, &after);
        self.current = after;
        verdict
    }

    fn do_transition(&mut self, trigger: Trigger, after: Snapshot) {
        self.transitions.push(TransitionRecord {
            trigger,
            from_state: self.current.status,
            to_state: after.status,
            updated: after.updated,
        });
        self.current = after;
    }
}

fn judge_accepted(op: Operation, before: &Snapshot, after: &Snapshot) -> Result<(), LifecycleViolation> {
    match expected(before.status, op) {
        Expectation::Rejected => Err(LifecycleViolation::ForbiddenAccepted {
            operation: op,
            from: before.status,
        }),
        Expectation::Idempotent => {
            if after.status != before.status {
                Err(LifecycleViolation::IdempotenceViolated {
                    operation: op,
                    field: "status",
                })
            } else if after.updated != before.updated {
                Err(LifecycleViolation::IdempotenceViolated {
                    operation: op,
                    field: "updated.status",
                })
            } else if matches!((before.events, after.events), (Some(b), Some(a)) if a != b) {
                Err(LifecycleViolation::IdempotenceViolated {
                    operation: op,
                    field: "events",
                })
            } else {
                Ok(())
            }
        }
        Expectation::Transition(target) => {
            if after.status != target {
                Err(LifecycleViolation::WrongStatus {
                    expected: target,
                    actual: after.status,
                })
            } else if after.updated < before.updated {
                Err(LifecycleViolation::NonMonotonic {
                    before: before.updated,
                    after: after.updated,
                })
            } else if after.updated == before.updated {
                Err(LifecycleViolation::NotAdvanced {
                    operation: op,
                    before: before.updated,
                    after: after.updated,
                })
            } else {
                Ok(())
            }
        }
    }
}

fn check_monotonic(before: &Snapshot, after: &Snapshot) -> Result<(), LifecycleViolation> {
    if after.updated < before.updated {
        Err(LifecycleViolation::NonMonotonic {
            before: before.updated,
            after: after.updated,
        })
    } else {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
