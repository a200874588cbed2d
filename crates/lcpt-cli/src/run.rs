//! # Run Subcommand
//!
//! Runs the scenario catalogue. Without `--scenario`, every default
//! scenario whose fixture is configured runs; named scenarios run in
//! catalogue order regardless of the order they are given in.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use lcpt_suite::{default_selection, run_catalogue, ScenarioId};

use crate::{open_harness_or_report, print_report, runtime, ReportFormat, EXIT_CONFIG};

/// Arguments for the `lcpt run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario to run; repeat for several. Defaults to every scenario
    /// whose fixture is configured.
    #[arg(long = "scenario", value_name = "ID")]
    pub scenarios: Vec<ScenarioId>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Execute the run subcommand.
///
/// Returns exit code: 0 when every scenario succeeded, 1 otherwise, 2 on a
/// configuration error.
pub fn run_run(args: &RunArgs, config: &Path) -> Result<u8> {
    let Some(harness) = open_harness_or_report(config) else {
        return Ok(EXIT_CONFIG);
    };

    let selection = if args.scenarios.is_empty() {
        default_selection(harness.config())
    } else {
        for id in &args.scenarios {
            if !harness.config().has_fixture(id.fixture()) {
                tracing::warn!(scenario = %id, fixture = id.fixture(), "fixture not configured, scenario will abort");
            }
        }
        args.scenarios.clone()
    };
    if selection.is_empty() {
        println!("No scenario selected: no configured fixture matches the catalogue.");
        return Ok(EXIT_CONFIG);
    }
    tracing::info!(count = selection.len(), "running scenarios");

    let report = runtime()?.block_on(run_catalogue(&harness, &selection));
    print_report(&report, args.format)
}
