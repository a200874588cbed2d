//! # Lifecycle Checks
//!
//! Judge server answers to register / renew / return against the
//! [`LifecycleModel`]. The model holds the last observed snapshot; an
//! accepted call replaces it, a rejected one leaves it alone.
//!
//! A status document may omit the link of an operation it does not allow.
//! When the model expects a rejection, a missing link counts as one.

use lcpt_client::{Device, LifecycleError};
use lcpt_model::StatusDocument;
use lcpt_state::{
    replay, EventType, Expectation, LicenseStatus, LifecycleModel, LifecycleViolation, Operation,
    ServerTransition,
};

use crate::report::Outcome;

/// The model's current status is `expected`.
pub fn status_is(model: &LifecycleModel, expected: LicenseStatus) -> Outcome {
    violation_outcome(model.require_status(expected))
}

/// Judge the result of `op` and fold an accepted answer into the model.
///
/// Returns the outcome and, when the server accepted, the new document.
pub fn operation_outcome(
    model: &mut LifecycleModel,
    op: Operation,
    result: Result<StatusDocument, LifecycleError>,
) -> (Outcome, Option<StatusDocument>) {
    match result {
        Ok(after) => {
            let verdict = model.observe_accepted(op, after.snapshot());
            (violation_outcome(verdict), Some(after))
        }
        Err(LifecycleError::Rejected { status_code, .. }) => {
            (violation_outcome(model.observe_rejected(op, status_code)), None)
        }
        Err(LifecycleError::MissingLink { rel }) => {
            let outcome = match model.expectation(op) {
                Expectation::Rejected => {
                    tracing::info!(%op, from = %model.status(), "operation not offered");
                    Outcome::Pass
                }
                Expectation::Transition(_) | Expectation::Idempotent => Outcome::fail(format!(
                    "status document in status {} has no '{rel}' link",
                    model.status()
                )),
            };
            (outcome, None)
        }
        Err(e @ (LifecycleError::NotTemplated { .. } | LifecycleError::WrongLinkType { .. })) => {
            (Outcome::fail(e.to_string()), None)
        }
        Err(e) => (Outcome::error(e), None),
    }
}

/// `op` was refused with a 4xx, whatever the model's state. For requests
/// that are malformed on purpose.
pub fn client_rejection(op: Operation, result: &Result<StatusDocument, LifecycleError>) -> Outcome {
    match result {
        Ok(_) => Outcome::fail(format!("{op} accepted, a 4xx rejection was expected")),
        Err(LifecycleError::Rejected { status_code, .. }) => {
            Outcome::check((400..500).contains(status_code), || {
                format!("{op} refused with HTTP {status_code}, a 4xx was expected")
            })
        }
        Err(
            e @ (LifecycleError::MissingLink { .. }
            | LifecycleError::NotTemplated { .. }
            | LifecycleError::WrongLinkType { .. }),
        ) => Outcome::fail(e.to_string()),
        Err(e) => Outcome::error(e),
    }
}

/// The document's status was reached through `transition`, judged from the
/// state its event log implies just before the transition's own event.
/// Expiry logs no event, so the whole log precedes it.
pub fn server_transition(status: &StatusDocument, transition: ServerTransition) -> Outcome {
    let Some(events) = status.events() else {
        return Outcome::fail("status document lists no events");
    };
    let cut = match transition.event_type() {
        Some(event_type) => match events.iter().rposition(|e| e.event_type == event_type) {
            Some(i) => i,
            None => return Outcome::fail(format!("no '{event_type}' event listed")),
        },
        None => events.len(),
    };
    let updated = status.updated();
    let prior = replay(
        updated.license.min(updated.status),
        events[..cut].iter().map(|e| (e.event_type, e.timestamp)),
    );
    tracing::debug!(%transition, from = %prior.status, events = cut, "event log replayed");
    let mut model = LifecycleModel::new(prior);
    violation_outcome(model.observe_server(transition, status.snapshot()))
}

/// A refetched document shows the state the model last observed, and
/// `updated.status` has not gone backwards.
pub fn unchanged(model: &mut LifecycleModel, refreshed: &StatusDocument) -> Outcome {
    let expected = model.status();
    let actual = refreshed.status();
    let verdict = model.observe_refresh(refreshed.snapshot());
    if actual != expected {
        return violation_outcome(Err(LifecycleViolation::WrongStatus { expected, actual }));
    }
    violation_outcome(verdict)
}

/// `after` lists exactly one more `event_type` event than `before`, and,
/// when `device` is given, one for that device.
pub fn event_logged(
    before: &StatusDocument,
    after: &StatusDocument,
    event_type: EventType,
    device: Option<&Device>,
) -> Outcome {
    if after.events().is_none() {
        return Outcome::fail("status document lists no events");
    }
    let was = before.events_of(event_type).count();
    let now = after.events_of(event_type).count();
    if now != was + 1 {
        return Outcome::fail(format!(
            "{now} '{event_type}' events after the call, {} expected",
            was + 1
        ));
    }
    match device {
        Some(d) if !after.has_event(event_type, &d.id, &d.name) => Outcome::fail(format!(
            "no '{event_type}' event for device id '{}' name '{}'",
            d.id, d.name
        )),
        _ => Outcome::Pass,
    }
}

/// `after` lists no more events than `before`.
pub fn no_new_event(before: &StatusDocument, after: &StatusDocument) -> Outcome {
    match (before.events(), after.events()) {
        (Some(b), Some(a)) => Outcome::check(a.len() == b.len(), || {
            format!("{} events after the call, {} before", a.len(), b.len())
        }),
        (None, Some(a)) if !a.is_empty() => {
            Outcome::fail(format!("{} events appeared after the call", a.len()))
        }
        _ => Outcome::Pass,
    }
}

/// At least one `event_type` event is listed.
pub fn event_listed(status: &StatusDocument, event_type: EventType) -> Outcome {
    if status.events().is_none() {
        return Outcome::fail("status document lists no events");
    }
    Outcome::check(status.events_of(event_type).next().is_some(), || {
        format!("no '{event_type}' event listed")
    })
}

/// Events are listed; each one is logged.
pub fn events_listed(status: &StatusDocument) -> Outcome {
    match status.events() {
        Some(events) => {
            for e in events {
                tracing::info!(
                    event = %e.event_type,
                    timestamp = %e.timestamp,
                    device_id = %e.id,
                    device_name = %e.name,
                    "status event"
                );
            }
            Outcome::Pass
        }
        None => Outcome::fail("status document lists no events"),
    }
}

/// `updated.status` moved forward.
pub fn status_updated(before: &StatusDocument, after: &StatusDocument) -> Outcome {
    let (b, a) = (before.updated().status, after.updated().status);
    Outcome::check(a > b, || {
        format!("updated.status did not advance (before {b}, after {a})")
    })
}

/// `updated.status` stayed where it was.
pub fn status_not_updated(before: &StatusDocument, after: &StatusDocument) -> Outcome {
    let (b, a) = (before.updated().status, after.updated().status);
    Outcome::check(a == b, || {
        format!("updated.status changed from {b} to {a}")
    })
}

/// `updated.license` moved forward.
pub fn license_updated(before: &StatusDocument, after: &StatusDocument) -> Outcome {
    let (b, a) = (before.updated().license, after.updated().license);
    Outcome::check(a > b, || {
        format!("updated.license did not advance (before {b}, after {a})")
    })
}

fn violation_outcome(result: Result<(), LifecycleViolation>) -> Outcome {
    match result {
        Ok(()) => Outcome::Pass,
        Err(v) => Outcome::fail(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(status: &str, updated: &str, events: serde_json::Value) -> StatusDocument {
        StatusDocument::from_value(json!({
            "status": status,
            "message": "",
            "updated": {"license": "2024-01-01T00:00:00Z", "status": updated},
            "events": events,
            "links": []
        }))
        .unwrap()
    }

    fn device() -> Device {
        Device::new("dev-1", "Reader")
    }

    fn register_event() -> serde_json::Value {
        json!({"type": "register", "timestamp": "2024-01-02T00:00:00Z", "id": "dev-1", "name": "Reader"})
    }

    fn rejected(code: u16) -> Result<StatusDocument, LifecycleError> {
        Err(LifecycleError::Rejected {
            operation: Operation::Register,
            status_code: code,
            body: String::new(),
        })
    }

    #[test]
    fn test_register_from_ready() {
        let before = doc("ready", "2024-01-01T00:00:00Z", json!([]));
        let after = doc("active", "2024-01-02T00:00:00Z", json!([register_event()]));
        let mut model = LifecycleModel::new(before.snapshot());
        assert!(status_is(&model, LicenseStatus::Ready).is_pass());

        let (outcome, doc) = operation_outcome(&mut model, Operation::Register, Ok(after));
        assert!(outcome.is_pass());
        assert_eq!(model.status(), LicenseStatus::Active);
        let after = doc.unwrap();
        assert!(event_logged(&before, &after, EventType::Register, Some(&device())).is_pass());
        assert!(!event_logged(&before, &after, EventType::Register, Some(&Device::new("x", "y"))).is_pass());
        assert!(!no_new_event(&before, &after).is_pass());
        assert!(status_updated(&before, &after).is_pass());
        assert!(!status_not_updated(&before, &after).is_pass());
        assert!(!license_updated(&before, &after).is_pass());
    }

    #[test]
    fn test_register_without_advancing_fails() {
        let before = doc("ready", "2024-01-01T00:00:00Z", json!([]));
        let after = doc("active", "2024-01-01T00:00:00Z", json!([register_event()]));
        let mut model = LifecycleModel::new(before.snapshot());
        let (outcome, _) = operation_outcome(&mut model, Operation::Register, Ok(after));
        let Outcome::Fail { message } = outcome else {
            panic!("expected a failure");
        };
        assert!(message.contains("did not advance"));
    }

    #[test]
    fn test_rejections_in_terminal_state() {
        let mut model = LifecycleModel::new(doc("revoked", "2024-01-01T00:00:00Z", json!([])).snapshot());
        let (outcome, doc) = operation_outcome(&mut model, Operation::Register, rejected(403));
        assert!(outcome.is_pass());
        assert!(doc.is_none());

        let (outcome, _) = operation_outcome(&mut model, Operation::Register, rejected(500));
        assert!(!outcome.is_pass());

        let missing = Err(LifecycleError::MissingLink {
            rel: "register".to_string(),
        });
        let (outcome, _) = operation_outcome(&mut model, Operation::Register, missing);
        assert!(outcome.is_pass());
    }

    #[test]
    fn test_missing_link_when_operation_allowed() {
        let mut model = LifecycleModel::new(doc("ready", "2024-01-01T00:00:00Z", json!([])).snapshot());
        let missing = Err(LifecycleError::MissingLink {
            rel: "register".to_string(),
        });
        let (outcome, _) = operation_outcome(&mut model, Operation::Register, missing);
        assert!(matches!(outcome, Outcome::Fail { .. }));
    }

    #[test]
    fn test_accepted_in_terminal_state_fails() {
        let mut model = LifecycleModel::new(doc("returned", "2024-01-01T00:00:00Z", json!([])).snapshot());
        let after = doc("returned", "2024-01-01T00:00:00Z", json!([]));
        let (outcome, doc) = operation_outcome(&mut model, Operation::Return, Ok(after));
        assert!(matches!(outcome, Outcome::Fail { .. }));
        assert!(doc.is_some());
    }

    #[test]
    fn test_client_rejection() {
        assert!(client_rejection(Operation::Register, &rejected(400)).is_pass());
        assert!(!client_rejection(Operation::Register, &rejected(502)).is_pass());
        let accepted = Ok(doc("active", "2024-01-02T00:00:00Z", json!([])));
        assert!(!client_rejection(Operation::Register, &accepted).is_pass());
    }

    #[test]
    fn test_unchanged_after_rejection() {
        let mut model = LifecycleModel::new(doc("active", "2024-01-02T00:00:00Z", json!([])).snapshot());
        assert!(unchanged(&mut model, &doc("active", "2024-01-02T00:00:00Z", json!([]))).is_pass());
        assert!(!unchanged(&mut model, &doc("returned", "2024-01-03T00:00:00Z", json!([]))).is_pass());
    }

    fn logged(event_type: &str, timestamp: &str) -> serde_json::Value {
        json!({"type": event_type, "timestamp": timestamp, "id": "dev-1", "name": "Reader"})
    }

    #[test]
    fn test_cancel_only_from_ready() {
        let never_used = doc("cancelled", "2024-01-02T00:00:00Z", json!([
            logged("cancel", "2024-01-02T00:00:00Z")
        ]));
        assert!(server_transition(&never_used, ServerTransition::Cancel).is_pass());

        let used = doc("cancelled", "2024-01-03T00:00:00Z", json!([
            logged("register", "2024-01-02T00:00:00Z"),
            logged("cancel", "2024-01-03T00:00:00Z")
        ]));
        let Outcome::Fail { message } = server_transition(&used, ServerTransition::Cancel) else {
            panic!("expected a failure");
        };
        assert!(message.contains("not possible from status active"), "{message}");
    }

    #[test]
    fn test_expire_only_from_active() {
        let registered = doc("expired", "2024-02-01T00:00:00Z", json!([
            logged("register", "2024-01-02T00:00:00Z"),
            logged("renew", "2024-01-10T00:00:00Z")
        ]));
        assert!(server_transition(&registered, ServerTransition::Expire).is_pass());

        let never_registered = doc("expired", "2024-02-01T00:00:00Z", json!([]));
        assert!(!server_transition(&never_registered, ServerTransition::Expire).is_pass());

        let returned = doc("expired", "2024-02-01T00:00:00Z", json!([
            logged("register", "2024-01-02T00:00:00Z"),
            logged("return", "2024-01-03T00:00:00Z")
        ]));
        assert!(!server_transition(&returned, ServerTransition::Expire).is_pass());
    }

    #[test]
    fn test_revoke_from_active_and_monotonic() {
        let revoked = doc("revoked", "2024-01-05T00:00:00Z", json!([
            logged("register", "2024-01-02T00:00:00Z"),
            logged("revoke", "2024-01-05T00:00:00Z")
        ]));
        assert!(server_transition(&revoked, ServerTransition::Revoke).is_pass());

        let stale = doc("revoked", "2024-01-01T12:00:00Z", json!([
            logged("register", "2024-01-02T00:00:00Z"),
            logged("revoke", "2024-01-05T00:00:00Z")
        ]));
        let Outcome::Fail { message } = server_transition(&stale, ServerTransition::Revoke) else {
            panic!("expected a failure");
        };
        assert!(message.contains("backwards"), "{message}");
    }

    #[test]
    fn test_transition_event_missing() {
        let d = doc("revoked", "2024-01-05T00:00:00Z", json!([]));
        assert!(matches!(server_transition(&d, ServerTransition::Revoke), Outcome::Fail { .. }));
        let unlisted = doc("revoked", "2024-01-05T00:00:00Z", serde_json::Value::Null);
        assert!(matches!(server_transition(&unlisted, ServerTransition::Revoke), Outcome::Fail { .. }));
    }

    #[test]
    fn test_event_listed() {
        let d = doc("cancelled", "2024-01-01T00:00:00Z", json!([
            {"type": "cancel", "timestamp": "2024-01-01T00:00:00Z"}
        ]));
        assert!(event_listed(&d, EventType::Cancel).is_pass());
        assert!(!event_listed(&d, EventType::Revoke).is_pass());
        assert!(events_listed(&d).is_pass());
    }
}
