//! # lcpt-cli — Conformance Harness Command Line
//!
//! Provides the `lcpt` command:
//!
//! - `lcpt run`: run the scenario catalogue, or a selection of it.
//! - `lcpt list`: list catalogued scenarios.
//! - `lcpt license`, `lcpt publication`, `lcpt lsd`: check one file
//!   outside the catalogue.
//! - `lcpt check-config`: load and validate the configuration.
//!
//! ```bash
//! lcpt --config conformance.yaml run
//! lcpt --config conformance.yaml run --scenario register --scenario return --format json
//! lcpt --config conformance.yaml license book.lcpl --passphrase "open sesame"
//! ```
//!
//! ## Exit codes
//!
//! `0` when every scenario succeeded, `1` when a check failed or errored or
//! a scenario aborted, `2` when the configuration cannot be used.

pub mod adhoc;
pub mod check_config;
pub mod list;
pub mod run;

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use lcpt_suite::{ConfigError, Harness, Report, SuiteConfig};

/// Every scenario succeeded.
pub const EXIT_SUCCESS: u8 = 0;
/// A check failed or errored, or a scenario aborted.
pub const EXIT_FAILURE: u8 = 1;
/// The configuration cannot be used.
pub const EXIT_CONFIG: u8 = 2;

/// Report rendering.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Load the configuration and build the harness from it.
pub fn open_harness(config: &Path) -> Result<Harness, ConfigError> {
    let config = SuiteConfig::load(config)?;
    Harness::new(config)
}

/// Like [`open_harness`], reporting a configuration error on stdout.
/// `None` means the command should exit with [`EXIT_CONFIG`].
pub fn open_harness_or_report(config: &Path) -> Option<Harness> {
    match open_harness(config) {
        Ok(harness) => Some(harness),
        Err(e) => {
            tracing::error!(config = %config.display(), "configuration rejected");
            println!("CONFIG ERROR: {e}");
            None
        }
    }
}

/// The runtime HTTP calls are awaited on. One thread: calls never overlap.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")
}

/// Print `report` and map it to an exit code.
pub fn print_report(report: &Report, format: ReportFormat) -> Result<u8> {
    match format {
        ReportFormat::Text => print!("{}", report.render_text()),
        ReportFormat::Json => {
            let json = report.to_json().context("failed to render the report as JSON")?;
            println!("{json}");
        }
    }
    Ok(exit_code(report))
}

pub fn exit_code(report: &Report) -> u8 {
    if report.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}
