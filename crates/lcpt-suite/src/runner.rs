//! # Runner
//!
//! Resolves scenario descriptors against the configuration and runs them
//! one after another, collecting a [`Report`].
//!
//! ## Ordering
//!
//! Selections always run in catalogue order, whatever order they were
//! requested in: scenarios sharing a fixture act on the same server-side
//! license and depend on each other's effects.

use std::path::PathBuf;

use crate::catalogue::{ScenarioId, CATALOGUE};
use crate::config::{Fixture, SuiteConfig};
use crate::error::SetupError;
use crate::harness::Harness;
use crate::report::{Report, ScenarioReport, ScenarioRun};
use crate::scenarios::{self, Context};

/// Fixture key used for ad hoc runs.
pub const ADHOC_KEY: &str = "adhoc";

/// Scenarios run when none are named: every default catalogue entry whose
/// fixture is configured. `provision` also needs `lcp_server`.
pub fn default_selection(config: &SuiteConfig) -> Vec<ScenarioId> {
    CATALOGUE
        .iter()
        .filter(|d| d.default && config.has_fixture(d.fixture))
        .filter(|d| d.id != ScenarioId::Provision || config.lcp_server.is_some())
        .map(|d| d.id)
        .collect()
}

/// Run `selection` in catalogue order.
pub async fn run_catalogue(harness: &Harness, selection: &[ScenarioId]) -> Report {
    let mut report = Report::default();
    for descriptor in CATALOGUE.iter().filter(|d| selection.contains(&d.id)) {
        report.push(run_scenario(harness, descriptor.id).await);
    }
    log_totals(&report);
    report
}

/// Run one catalogued scenario against its configured fixture.
pub async fn run_scenario(harness: &Harness, id: ScenarioId) -> ScenarioReport {
    let mut run = ScenarioRun::new(id.as_str(), id.description());
    let key = id.fixture();
    let fixture = match harness.config().fixture(key) {
        Ok(f) => f,
        Err(e) => return run.abort(e),
    };
    tracing::info!(scenario = %id, fixture = key, "scenario started");
    let ctx = Context {
        harness,
        key,
        fixture,
    };
    match run_body(id, &ctx, &mut run).await {
        Ok(()) => run.finish(),
        Err(e) => run.abort(e),
    }
}

async fn run_body(id: ScenarioId, ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    use scenarios::{license, lsd, provision, publication};

    match id {
        ScenarioId::LicenseBasic => license::basic(ctx, run).await,
        ScenarioId::LicenseLoan => license::loan(ctx, run).await,
        ScenarioId::LicenseFetched => license::fetched(ctx, run).await,
        ScenarioId::Publication => publication::archive(ctx, run),
        ScenarioId::PublicationLicense => publication::embedded_license(ctx, run).await,
        ScenarioId::StatusDocument => lsd::status_document(ctx, run).await,
        ScenarioId::Register => lsd::register(ctx, run).await,
        ScenarioId::RegisterAgain => lsd::register_again(ctx, run).await,
        ScenarioId::RegisterAnonymous => lsd::register_anonymous(ctx, run).await,
        ScenarioId::Cancelled => lsd::cancelled(ctx, run).await,
        ScenarioId::Revoked => lsd::revoked(ctx, run).await,
        ScenarioId::RenewReady => lsd::renew_ready(ctx, run).await,
        ScenarioId::RenewBeforeEnd => lsd::renew_before_end(ctx, run).await,
        ScenarioId::RenewExtend => lsd::renew_extend(ctx, run).await,
        ScenarioId::RenewNoEnd => lsd::renew_no_end(ctx, run).await,
        ScenarioId::RenewBadDate => lsd::renew_bad_date(ctx, run).await,
        ScenarioId::RenewPotentialRights => lsd::renew_potential_rights(ctx, run).await,
        ScenarioId::Return => lsd::return_loan(ctx, run).await,
        ScenarioId::Expired => lsd::expired(ctx, run).await,
        ScenarioId::LsdSequence => lsd::sequence(ctx, run).await,
        ScenarioId::Provision => provision::provision(ctx, run).await,
    }
}

// ─── Ad hoc runs ─────────────────────────────────────────────────────

/// A file checked outside the catalogue.
#[derive(Debug, Clone)]
pub enum AdHoc {
    /// License checks, plus loan checks when the license is a loan.
    License(Fixture),
    /// Publication checks, then checks on the embedded license.
    Publication(Fixture),
    /// The full status document walk on the license.
    Lsd(Fixture),
}

impl AdHoc {
    pub fn license(path: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        Self::License(Fixture::from_license(path, passphrase))
    }

    pub fn publication(path: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        Self::Publication(Fixture::from_epub(path, passphrase))
    }

    pub fn lsd(path: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        Self::Lsd(Fixture::from_license(path, passphrase))
    }
}

/// Run the checks `adhoc` names.
pub async fn run_adhoc(harness: &Harness, adhoc: AdHoc) -> Report {
    let mut report = Report::default();
    match &adhoc {
        AdHoc::License(fixture) => {
            let ctx = adhoc_context(harness, fixture);
            let mut run = ScenarioRun::new("license", "ad hoc license checks");
            let result = scenarios::license::file(&ctx, &mut run).await;
            report.push(conclude(run, result));
        }
        AdHoc::Publication(fixture) => {
            let ctx = adhoc_context(harness, fixture);
            let mut run = ScenarioRun::new(
                ScenarioId::Publication.as_str(),
                ScenarioId::Publication.description(),
            );
            let result = scenarios::publication::archive(&ctx, &mut run);
            report.push(conclude(run, result));

            let mut run = ScenarioRun::new(
                ScenarioId::PublicationLicense.as_str(),
                ScenarioId::PublicationLicense.description(),
            );
            let result = scenarios::publication::embedded_license(&ctx, &mut run).await;
            report.push(conclude(run, result));
        }
        AdHoc::Lsd(fixture) => {
            let ctx = adhoc_context(harness, fixture);
            let mut run = ScenarioRun::new(
                ScenarioId::LsdSequence.as_str(),
                ScenarioId::LsdSequence.description(),
            );
            let result = scenarios::lsd::sequence(&ctx, &mut run).await;
            report.push(conclude(run, result));
        }
    }
    log_totals(&report);
    report
}

fn adhoc_context<'a>(harness: &'a Harness, fixture: &'a Fixture) -> Context<'a> {
    Context {
        harness,
        key: ADHOC_KEY,
        fixture,
    }
}

fn conclude(run: ScenarioRun, result: Result<(), SetupError>) -> ScenarioReport {
    match result {
        Ok(()) => run.finish(),
        Err(e) => run.abort(e),
    }
}

fn log_totals(report: &Report) {
    let totals = report.totals();
    tracing::info!(
        scenarios = totals.scenarios,
        succeeded = totals.succeeded,
        aborted = totals.aborted,
        failed = totals.failed,
        errors = totals.errors,
        "run complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config(extra: &str) -> SuiteConfig {
        let text = format!(
            "common:\n  license: {{ schema: l.json }}\n  status: {{ schema: s.json }}\n  crypto: {{ cacert: ca.pem }}\n{extra}"
        );
        SuiteConfig::from_yaml(&text, Path::new("/tmp")).unwrap()
    }

    #[test]
    fn test_default_selection_follows_configured_fixtures() {
        let config = config("data:\n  b2: { license: b2.lcpl }\n  e1: { epub: e1.epub }\n");
        let selection = default_selection(&config);
        assert_eq!(
            selection,
            vec![
                ScenarioId::Cancelled,
                ScenarioId::Publication,
                ScenarioId::PublicationLicense
            ]
        );
    }

    #[test]
    fn test_default_selection_excludes_walk() {
        let config = config("data:\n  l1: { license: l1.lcpl }\n");
        let selection = default_selection(&config);
        assert!(selection.contains(&ScenarioId::RenewExtend));
        assert!(selection.contains(&ScenarioId::Return));
        assert!(!selection.contains(&ScenarioId::LsdSequence));
    }

    #[test]
    fn test_provision_needs_license_server() {
        let without = config("data:\n  c1: { content: c.json }\n");
        assert!(default_selection(&without).is_empty());

        let with = config(
            "lcp_server: { base_uri: \"https://lcp.example.org/\" }\ndata:\n  c1: { content: c.json }\n",
        );
        assert_eq!(default_selection(&with), vec![ScenarioId::Provision]);
    }

    #[test]
    fn test_adhoc_constructors() {
        let AdHoc::Lsd(fixture) = AdHoc::lsd("/tmp/x.lcpl", Some("pass".into())) else {
            panic!("expected an lsd run");
        };
        assert_eq!(fixture.license.as_deref(), Some(Path::new("/tmp/x.lcpl")));
        assert_eq!(fixture.passphrase.as_deref(), Some("pass"));
        assert!(matches!(AdHoc::publication("/tmp/x.epub", None), AdHoc::Publication(f) if f.epub.is_some()));
    }
}
