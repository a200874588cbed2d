//! # Scenario Bodies
//!
//! Each scenario is an ordered list of check invocations against one
//! fixture. Bodies return `Err` only for setup failures; every assertion
//! goes through [`ScenarioRun::record`].

pub(crate) mod license;
pub(crate) mod lsd;
pub(crate) mod provision;
pub(crate) mod publication;

use std::path::{Path, PathBuf};

use lcpt_client::Device;
use lcpt_core::Timestamp;
use lcpt_model::{License, StatusDocument};
use lcpt_state::{LicenseStatus, Operation};

use crate::checks::{crypto, links, rights, structural};
use crate::config::{ConfigError, Fixture};
use crate::error::SetupError;
use crate::harness::Harness;
use crate::report::ScenarioRun;

/// What a scenario body runs against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context<'a> {
    pub harness: &'a Harness,
    /// Fixture key, for error messages.
    pub key: &'a str,
    pub fixture: &'a Fixture,
}

impl<'a> Context<'a> {
    pub fn license(&self) -> Result<License, SetupError> {
        let fixture: &'a Fixture = self.fixture;
        Ok(License::from_path(required(self.key, &fixture.license, "license")?)?)
    }

    pub fn epub(&self) -> Result<&'a Path, SetupError> {
        let fixture: &'a Fixture = self.fixture;
        required(self.key, &fixture.epub, "epub")
    }

    pub fn content(&self) -> Result<&'a Path, SetupError> {
        let fixture: &'a Fixture = self.fixture;
        required(self.key, &fixture.content, "content")
    }

    pub fn passphrase(&self) -> Option<&'a str> {
        let fixture: &'a Fixture = self.fixture;
        fixture.passphrase.as_deref()
    }
}

fn required<'f>(
    key: &str,
    path: &'f Option<PathBuf>,
    field: &'static str,
) -> Result<&'f Path, SetupError> {
    path.as_deref().ok_or_else(|| {
        ConfigError::IncompleteFixture {
            key: key.to_string(),
            field,
        }
        .into()
    })
}

/// Structure, link and crypto checks shared by every license scenario,
/// then a GET on the hint page.
pub(crate) async fn license_checks(
    harness: &Harness,
    license: &License,
    passphrase: Option<&str>,
    run: &mut ScenarioRun,
) {
    run.record(
        "license schema",
        structural::license_schema(license, harness.license_schema()),
    );
    run.record("required links present once", links::required_links(license));
    run.record("publication link type", links::publication_link_type(license));
    run.record("status link type", links::status_link_type(license));
    run.record("status link is https", links::status_link_https(license));
    run.record("provider certificate", crypto::certificate(license, harness.ca()));
    run.record("signature", crypto::signature(license));
    run.record("content key length", crypto::content_key_length(license));
    run.record("key check", crypto::key_check(license, passphrase));
    run.record(
        "hint link reachable",
        links::hint_reachable(harness.lsd(), license).await,
    );
    rights::log_rights(license);
}

/// Loan window checks.
pub(crate) fn loan_checks(license: &License, run: &mut ScenarioRun) {
    run.record("loan start present", rights::start_present(license));
    run.record("loan end present", rights::end_present(license));
    run.record("loan start before end", rights::start_before_end(license));
}

/// Link contract checks for register, renew and return.
pub(crate) fn operation_link_checks(status: &StatusDocument, run: &mut ScenarioRun) {
    for op in Operation::ALL {
        run.record(format!("{op} link"), links::operation_link(status, op));
    }
}

/// The URL of the license's status document.
pub(crate) fn status_url(license: &License) -> Result<String, SetupError> {
    Ok(license.required_link("status")?.href.clone())
}

pub(crate) async fn fetch_status(harness: &Harness, url: &str) -> Result<StatusDocument, SetupError> {
    Ok(harness.lsd().fetch_status(url).await?)
}

/// `rights.end` of a license the scenario needs to be a loan.
pub(crate) fn loan_end(license: &License) -> Result<Timestamp, SetupError> {
    license.end()?.ok_or(SetupError::NotALoan)
}

/// Register `device` when the license is still ready, so the scenario
/// starts from `active`.
pub(crate) async fn activate(
    harness: &Harness,
    status: StatusDocument,
    device: &Device,
) -> Result<StatusDocument, SetupError> {
    match status.status() {
        LicenseStatus::Active => Ok(status),
        LicenseStatus::Ready => {
            tracing::info!(device_id = %device.id, "registering to reach active");
            let after = harness.lsd().register(&status, device).await?;
            if after.status() == LicenseStatus::Active {
                Ok(after)
            } else {
                Err(SetupError::WrongStartingState {
                    required: "active",
                    actual: after.status().to_string(),
                })
            }
        }
        other => Err(SetupError::WrongStartingState {
            required: "ready or active",
            actual: other.to_string(),
        }),
    }
}
