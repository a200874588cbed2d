//! License server provisioning: store an encrypted content, then have the
//! server generate a license and a protected publication for it, and run
//! the license and publication checks on what comes back.

use std::io::Cursor;

use lcpt_client::{ContentRecord, PartialLicense};
use lcpt_core::Timestamp;
use lcpt_model::License;
use lcpt_publication::Publication;

use crate::checks::crypto;
use crate::config::ConfigError;
use crate::error::SetupError;
use crate::report::{Outcome, ScenarioRun};

use super::publication::publication_checks;
use super::{license_checks, loan_checks, Context};

fn read_content_record(ctx: &Context<'_>) -> Result<ContentRecord, SetupError> {
    let path = ctx.content()?;
    let content_record = |reason: String| SetupError::ContentRecord {
        path: path.display().to_string(),
        reason,
    };
    let bytes = std::fs::read(path).map_err(|e| content_record(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| content_record(e.to_string()))
}

/// `provision`.
pub(crate) async fn provision(ctx: &Context<'_>, run: &mut ScenarioRun) -> Result<(), SetupError> {
    let lcp = ctx.harness.lcp()?;
    let content = read_content_record(ctx)?;
    let passphrase = ctx.passphrase().ok_or_else(|| ConfigError::IncompleteFixture {
        key: ctx.key.to_string(),
        field: "passphrase",
    })?;
    let hint = ctx.fixture.text_hint.as_deref().unwrap_or_default();
    let request = PartialLicense::new(passphrase, hint, Timestamp::now());
    tracing::info!(content_id = %content.content_id, user = %request.user.id, "provisioning content");

    let stored = match lcp.store_content(&content).await {
        Ok(()) => Outcome::Pass,
        Err(e) => Outcome::error(e),
    };
    if !run.record("content stored", stored) {
        return Ok(());
    }

    match lcp.generate_license(&content.content_id, &request).await {
        Ok(bytes) => {
            run.record("license generated", Outcome::Pass);
            let license = License::parse(&bytes)?;
            license_checks(ctx.harness, &license, Some(passphrase), run).await;
            loan_checks(&license, run);
        }
        Err(e) => {
            run.record("license generated", Outcome::error(e));
        }
    }

    match lcp.generate_publication(&content.content_id, &request).await {
        Ok(bytes) => {
            run.record("publication generated", Outcome::Pass);
            let mut publication = Publication::from_reader(Cursor::new(bytes))?;
            publication_checks(&mut publication, run)?;
            let embedded = match publication.license() {
                Ok(license) => crypto::key_check(&license, Some(passphrase)),
                Err(e) => Outcome::fail(e.to_string()),
            };
            run.record("embedded license key check", embedded);
        }
        Err(e) => {
            run.record("publication generated", Outcome::error(e));
        }
    }
    Ok(())
}
