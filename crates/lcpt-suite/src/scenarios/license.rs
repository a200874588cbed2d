//! License document scenarios.

use crate::error::SetupError;
use crate::report::{Outcome, ScenarioRun};

use super::{fetch_status, license_checks, loan_checks, status_url, Context};

/// `license.basic`.
pub(crate) async fn basic(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let license = ctx.license()?;
    license_checks(ctx.harness, &license, ctx.passphrase(), run).await;
    Ok(())
}

/// `license.loan`.
pub(crate) async fn loan(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let license = ctx.license()?;
    license_checks(ctx.harness, &license, ctx.passphrase(), run).await;
    loan_checks(&license, run);
    Ok(())
}

/// Ad hoc license file: loan checks only when it is a loan.
pub(crate) async fn file(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let license = ctx.license()?;
    license_checks(ctx.harness, &license, ctx.passphrase(), run).await;
    if license.is_loan() {
        loan_checks(&license, run);
    }
    Ok(())
}

/// `license.fetched`.
pub(crate) async fn fetched(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let local = ctx.license()?;
    let status = fetch_status(ctx.harness, &status_url(&local)?).await?;
    let fetched = ctx.harness.lsd().fetch_license(&status).await?;

    let (a, b) = (local.id()?, fetched.id()?);
    run.record(
        "fetched license has the same id",
        Outcome::check(a == b, || format!("fetched license id {b}, local license id {a}")),
    );
    license_checks(ctx.harness, &fetched, ctx.passphrase(), run).await;
    if fetched.is_loan() {
        loan_checks(&fetched, run);
    }
    Ok(())
}
