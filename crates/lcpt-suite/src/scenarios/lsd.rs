//! # Status Document Scenarios
//!
//! Register, renew and return driven through the status document's links,
//! each answer judged by a [`LifecycleModel`] seeded with the document
//! fetched at the start of the scenario.

use lcpt_client::{Device, RenewEnd, RenewRequest};
use lcpt_core::Timestamp;
use lcpt_model::{License, StatusDocument};
use lcpt_state::{EventType, LicenseStatus, LifecycleModel, Operation, ServerTransition};

use crate::catalogue::{device, walk_device};
use crate::checks::{lifecycle, links, rights, structural};
use crate::error::SetupError;
use crate::harness::Harness;
use crate::report::{Outcome, ScenarioRun};

use super::{
    activate, fetch_status, license_checks, loan_checks, loan_end, operation_link_checks,
    status_url, Context,
};

/// End value no server can parse.
pub const MALFORMED_END: &str = "testrenew";

/// Days added to or removed from the current end in renew scenarios.
const RENEW_DAYS: i64 = 2;

/// Load the fixture license and fetch its status document.
async fn open(ctx: &Context<'_>) -> Result<(License, String, StatusDocument), SetupError> {
    let license = ctx.license()?;
    let url = status_url(&license)?;
    let status = fetch_status(ctx.harness, &url).await?;
    tracing::debug!(status = %status.status(), %url, "status document fetched");
    Ok((license, url, status))
}

/// Fetch the license a status document points to.
async fn current_license(harness: &Harness, status: &StatusDocument) -> Result<License, SetupError> {
    Ok(harness.lsd().fetch_license(status).await?)
}

/// Record the schema check of a document returned by `op`.
fn schema_after(harness: &Harness, op: Operation, after: &StatusDocument, run: &mut ScenarioRun) {
    run.record(
        format!("status schema after {op}"),
        structural::status_schema(after, harness.status_schema()),
    );
}

/// Record a check on the license fetched through `status`.
async fn check_fetched_license(
    harness: &Harness,
    status: &StatusDocument,
    name: &str,
    run: &mut ScenarioRun,
    check: impl FnOnce(&License) -> Outcome,
) {
    let outcome = match harness.lsd().fetch_license(status).await {
        Ok(license) => check(&license),
        Err(e) => Outcome::error(e),
    };
    run.record(name, outcome);
}

// ─── Status document ─────────────────────────────────────────────────

/// `status.document`.
pub(crate) async fn status_document(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let license = ctx.license()?;
    run.record("status link is https", links::status_link_https(&license));
    let status = fetch_status(ctx.harness, &status_url(&license)?).await?;
    run.record(
        "status schema",
        structural::status_schema(&status, ctx.harness.status_schema()),
    );
    run.record("events listed", lifecycle::events_listed(&status));
    run.record("license link", links::license_link(&status));
    operation_link_checks(&status, run);
    Ok(())
}

// ─── Register ────────────────────────────────────────────────────────

/// `register`.
pub(crate) async fn register(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let h = ctx.harness;
    let device = device();
    let (_, _, status) = open(ctx).await?;
    let mut model = LifecycleModel::new(status.snapshot());
    run.record("initial status is ready", lifecycle::status_is(&model, LicenseStatus::Ready));

    let result = h.lsd().register(&status, &device).await;
    let (outcome, after) = lifecycle::operation_outcome(&mut model, Operation::Register, result);
    run.record("register activates the license", outcome);
    if let Some(after) = after {
        schema_after(h, Operation::Register, &after, run);
        run.record("updated.status advances", lifecycle::status_updated(&status, &after));
        run.record(
            "register event logged",
            lifecycle::event_logged(&status, &after, EventType::Register, Some(&device)),
        );
    }
    Ok(())
}

/// `register.again`.
pub(crate) async fn register_again(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let h = ctx.harness;
    let device = device();
    let (_, _, status) = open(ctx).await?;
    let status = activate(h, status, &device).await?;
    let mut model = LifecycleModel::new(status.snapshot());
    run.record("initial status is active", lifecycle::status_is(&model, LicenseStatus::Active));

    let result = h.lsd().register(&status, &device).await;
    let (outcome, after) = lifecycle::operation_outcome(&mut model, Operation::Register, result);
    run.record("second register is idempotent", outcome);
    if let Some(after) = after {
        schema_after(h, Operation::Register, &after, run);
        run.record("updated.status unchanged", lifecycle::status_not_updated(&status, &after));
        run.record("no new event", lifecycle::no_new_event(&status, &after));
    }
    Ok(())
}

/// `register.anonymous`.
pub(crate) async fn register_anonymous(
    ctx: &Context<'_>,
    run: &mut ScenarioRun,
) -> Result<(), SetupError> {
    let h = ctx.harness;
    let (_, url, status) = open(ctx).await?;
    let mut model = LifecycleModel::new(status.snapshot());

    let result = h.lsd().register(&status, &Device::anonymous()).await;
    run.record(
        "register without id and name rejected",
        lifecycle::client_rejection(Operation::Register, &result),
    );
    let refreshed = fetch_status(h, &url).await?;
    run.record("status unchanged", lifecycle::unchanged(&mut model, &refreshed));
    Ok(())
}

// ─── Terminal states ─────────────────────────────────────────────────

/// Shared body of `cancelled`, `revoked` and `expired`: the license reached
/// the target of `transition` from a state that allows it, and refuses to be
/// registered.
async fn terminal(
    ctx: &Context<'_>,
    run: &mut ScenarioRun,
    transition: ServerTransition,
) -> Result<StatusDocument, SetupError> {
    let h = ctx.harness;
    let expected = transition.target();
    let (_, url, status) = open(ctx).await?;
    let mut model = LifecycleModel::new(status.snapshot());
    if !run.record(format!("status is {expected}"), lifecycle::status_is(&model, expected)) {
        tracing::warn!(scenario_status = %status.status(), "license not in the expected state, register not attempted");
        return Ok(status);
    }
    if let Some(event) = transition.event_type() {
        run.record(format!("{event} event listed"), lifecycle::event_listed(&status, event));
    }
    run.record(
        format!("{transition} allowed from the previous status"),
        lifecycle::server_transition(&status, transition),
    );

    let result = h.lsd().register(&status, &device()).await;
    let (outcome, _) = lifecycle::operation_outcome(&mut model, Operation::Register, result);
    run.record("register rejected", outcome);

    let refreshed = fetch_status(h, &url).await?;
    run.record(format!("status still {expected}"), lifecycle::unchanged(&mut model, &refreshed));
    Ok(refreshed)
}

/// `cancelled`.
pub(crate) async fn cancelled(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    terminal(ctx, run, ServerTransition::Cancel).await?;
    Ok(())
}

/// `revoked`.
pub(crate) async fn revoked(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    terminal(ctx, run, ServerTransition::Revoke).await?;
    Ok(())
}

/// `expired`.
pub(crate) async fn expired(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let status = terminal(ctx, run, ServerTransition::Expire).await?;
    let now = Timestamp::now();
    check_fetched_license(ctx.harness, &status, "license end is in the past", run, |l| {
        rights::ended_before(l, now)
    })
    .await;
    Ok(())
}

// ─── Renew ───────────────────────────────────────────────────────────

/// `renew.ready`.
pub(crate) async fn renew_ready(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let h = ctx.harness;
    let (license, _, status) = open(ctx).await?;
    let end = loan_end(&license)?;
    let mut model = LifecycleModel::new(status.snapshot());
    if !run.record("initial status is ready", lifecycle::status_is(&model, LicenseStatus::Ready)) {
        return Ok(());
    }

    let request = RenewRequest {
        device: Some(device()),
        end: RenewEnd::At(end.plus_days(RENEW_DAYS)),
    };
    let result = h.lsd().renew(&status, &request).await;
    let (outcome, _) = lifecycle::operation_outcome(&mut model, Operation::Renew, result);
    run.record("renew of a ready license rejected", outcome);
    Ok(())
}

/// `renew.before_end`.
pub(crate) async fn renew_before_end(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let h = ctx.harness;
    let device = device();
    let (_, _, status) = open(ctx).await?;
    let status = activate(h, status, &device).await?;
    let end = loan_end(&current_license(h, &status).await?)?;

    let request = RenewRequest {
        device: Some(device),
        end: RenewEnd::At(end.plus_days(-RENEW_DAYS)),
    };
    let result = h.lsd().renew(&status, &request).await;
    run.record(
        "renew before the current end rejected",
        lifecycle::client_rejection(Operation::Renew, &result),
    );
    let latest = result.unwrap_or(status);
    check_fetched_license(h, &latest, "license end unchanged", run, |l| {
        rights::end_equals(l, end)
    })
    .await;
    Ok(())
}

/// `renew.extend`.
pub(crate) async fn renew_extend(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let h = ctx.harness;
    let (_, _, status) = open(ctx).await?;
    let status = activate(h, status, &device()).await?;
    let end = loan_end(&current_license(h, &status).await?)?;
    let target = end.plus_days(RENEW_DAYS);
    let mut model = LifecycleModel::new(status.snapshot());

    let request = RenewRequest {
        device: None,
        end: RenewEnd::At(target),
    };
    let result = h.lsd().renew(&status, &request).await;
    let (outcome, after) = lifecycle::operation_outcome(&mut model, Operation::Renew, result);
    run.record("renew extends the loan", outcome);
    if let Some(after) = after {
        schema_after(h, Operation::Renew, &after, run);
        run.record(
            "renew event logged",
            lifecycle::event_logged(&status, &after, EventType::Renew, None),
        );
        run.record("updated.license advances", lifecycle::license_updated(&status, &after));
        check_fetched_license(h, &after, "license end moved to the requested date", run, |l| {
            rights::end_equals(l, target)
        })
        .await;
    }
    Ok(())
}

/// `renew.no_end`.
pub(crate) async fn renew_no_end(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let h = ctx.harness;
    let device = device();
    let (_, _, status) = open(ctx).await?;
    let status = activate(h, status, &device).await?;
    let end = loan_end(&current_license(h, &status).await?)?;
    let mut model = LifecycleModel::new(status.snapshot());

    let request = RenewRequest {
        device: Some(device),
        end: RenewEnd::Unspecified,
    };
    let result = h.lsd().renew(&status, &request).await;
    let (outcome, after) = lifecycle::operation_outcome(&mut model, Operation::Renew, result);
    run.record("renew without end accepted", outcome);
    let Some(after) = after else {
        return Ok(());
    };
    schema_after(h, Operation::Renew, &after, run);
    match h.lsd().fetch_license(&after).await {
        Ok(renewed) => {
            run.record("license refetched", Outcome::Pass);
            run.record(
                "renewed license schema",
                structural::license_schema(&renewed, h.license_schema()),
            );
            run.record("license end extended", rights::end_extended(&renewed, end));
        }
        Err(e) => {
            run.record("license refetched", Outcome::error(e));
        }
    }
    Ok(())
}

/// `renew.bad_date`.
pub(crate) async fn renew_bad_date(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let h = ctx.harness;
    let device = device();
    let (_, _, status) = open(ctx).await?;
    let status = activate(h, status, &device).await?;

    let request = RenewRequest {
        device: Some(device),
        end: RenewEnd::Raw(MALFORMED_END.to_string()),
    };
    let result = h.lsd().renew(&status, &request).await;
    run.record(
        "renew with malformed end rejected",
        lifecycle::client_rejection(Operation::Renew, &result),
    );
    Ok(())
}

/// `renew.potential_rights`.
pub(crate) async fn renew_potential_rights(
    ctx: &Context<'_>,
    run: &mut ScenarioRun,
) -> Result<(), SetupError> {
    let h = ctx.harness;
    let device = device();
    let (_, _, status) = open(ctx).await?;
    let status = activate(h, status, &device).await?;

    let Some(limit) = status.potential_rights_end() else {
        run.record(
            "potential_rights.end listed",
            Outcome::fail("status document has no potential_rights.end"),
        );
        return Ok(());
    };
    run.record("potential_rights.end listed", Outcome::Pass);

    let beyond = RenewRequest {
        device: Some(device.clone()),
        end: RenewEnd::At(limit.plus_days(1)),
    };
    let result = h.lsd().renew(&status, &beyond).await;
    run.record(
        "renew beyond potential_rights.end rejected",
        lifecycle::client_rejection(Operation::Renew, &result),
    );
    let status = result.unwrap_or(status);

    let mut model = LifecycleModel::new(status.snapshot());
    let at_limit = RenewRequest {
        device: Some(device),
        end: RenewEnd::At(limit),
    };
    let result = h.lsd().renew(&status, &at_limit).await;
    let (outcome, after) = lifecycle::operation_outcome(&mut model, Operation::Renew, result);
    run.record("renew to potential_rights.end accepted", outcome);
    if let Some(after) = after {
        check_fetched_license(h, &after, "license end equals potential_rights.end", run, |l| {
            rights::end_equals(l, limit)
        })
        .await;
    }
    Ok(())
}

// ─── Return ──────────────────────────────────────────────────────────

/// `return`.
pub(crate) async fn return_loan(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let h = ctx.harness;
    let device = device();
    let (_, _, status) = open(ctx).await?;
    let status = activate(h, status, &device).await?;
    let mut model = LifecycleModel::new(status.snapshot());

    let result = h.lsd().return_license(&status, &device).await;
    let (outcome, after) = lifecycle::operation_outcome(&mut model, Operation::Return, result);
    run.record("return ends the loan", outcome);
    let Some(after) = after else {
        return Ok(());
    };
    schema_after(h, Operation::Return, &after, run);
    run.record(
        "return event logged",
        lifecycle::event_logged(&status, &after, EventType::Return, Some(&device)),
    );

    let again = h.lsd().return_license(&after, &device).await;
    let (outcome, _) = lifecycle::operation_outcome(&mut model, Operation::Return, again);
    run.record("second return rejected", outcome);
    Ok(())
}

// ─── Full walk ───────────────────────────────────────────────────────

/// `lsd.sequence`: one license from `ready` to `returned`.
pub(crate) async fn sequence(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let h = ctx.harness;
    let device = walk_device();
    let (license, _, status) = open(ctx).await?;

    license_checks(h, &license, ctx.passphrase(), run).await;
    if license.is_loan() {
        loan_checks(&license, run);
    }
    run.record(
        "status schema",
        structural::status_schema(&status, h.status_schema()),
    );
    run.record("license link", links::license_link(&status));
    operation_link_checks(&status, run);

    let mut model = LifecycleModel::new(status.snapshot());
    if !run.record("initial status is ready", lifecycle::status_is(&model, LicenseStatus::Ready)) {
        return Ok(());
    }

    // Anonymous register.
    let anonymous = h.lsd().register(&status, &Device::anonymous()).await;
    run.record(
        "register without id and name rejected",
        lifecycle::client_rejection(Operation::Register, &anonymous),
    );
    let status = match anonymous {
        Ok(doc) => {
            model = LifecycleModel::new(doc.snapshot());
            doc
        }
        Err(_) => status,
    };

    // Register, then register again.
    let result = h.lsd().register(&status, &device).await;
    let (outcome, registered) = lifecycle::operation_outcome(&mut model, Operation::Register, result);
    run.record("register activates the license", outcome);
    let Some(registered) = registered else {
        return Ok(());
    };
    schema_after(h, Operation::Register, &registered, run);
    run.record(
        "register event logged",
        lifecycle::event_logged(&status, &registered, EventType::Register, Some(&device)),
    );

    let result = h.lsd().register(&registered, &device).await;
    let (outcome, again) = lifecycle::operation_outcome(&mut model, Operation::Register, result);
    run.record("second register is idempotent", outcome);
    let current = match again {
        Some(doc) => {
            run.record("no new event after second register", lifecycle::no_new_event(&registered, &doc));
            doc
        }
        None => registered,
    };

    // Renew by a day, within potential rights.
    let end = match h.lsd().fetch_license(&current).await {
        Ok(l) => {
            run.record("license fetched through status document", Outcome::Pass);
            l.end().ok().flatten()
        }
        Err(e) => {
            run.record("license fetched through status document", Outcome::error(e));
            None
        }
    };
    let renew_end = match (end, current.potential_rights_end()) {
        (Some(end), Some(limit)) => RenewEnd::At(end.plus_days(1).min(limit)),
        (Some(end), None) => RenewEnd::At(end.plus_days(1)),
        (None, _) => RenewEnd::Unspecified,
    };
    let request = RenewRequest {
        device: Some(device.clone()),
        end: renew_end,
    };
    let result = h.lsd().renew(&current, &request).await;
    let (outcome, renewed) = lifecycle::operation_outcome(&mut model, Operation::Renew, result);
    run.record("renew accepted", outcome);
    let current = match renewed {
        Some(doc) => {
            schema_after(h, Operation::Renew, &doc, run);
            run.record(
                "renew event logged",
                lifecycle::event_logged(&current, &doc, EventType::Renew, Some(&device)),
            );
            doc
        }
        None => current,
    };

    // Return.
    let result = h.lsd().return_license(&current, &device).await;
    let (outcome, returned) = lifecycle::operation_outcome(&mut model, Operation::Return, result);
    run.record("return ends the loan", outcome);
    if let Some(returned) = returned {
        schema_after(h, Operation::Return, &returned, run);
        run.record(
            "return event logged",
            lifecycle::event_logged(&current, &returned, EventType::Return, Some(&device)),
        );
        check_fetched_license(h, &returned, "license after return", run, |l| {
            structural::license_schema(l, h.license_schema())
        })
        .await;
    }
    Ok(())
}
