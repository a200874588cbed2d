//! # lcpt-suite — Conformance Scenarios
//!
//! Drives a license server and a status server through the scenario
//! catalogue and reports, per scenario, the outcome of every named check.
//!
//! ## Layers
//!
//! - **Configuration** (`config.rs`): [`SuiteConfig`] loaded from YAML, with
//!   the schemas, CA certificate, server settings and named fixtures.
//! - **Harness** (`harness.rs`): compiled schemas, CA and HTTP clients,
//!   built once and shared read-only by every scenario.
//! - **Checks** (`checks/`): plain functions returning an [`Outcome`].
//! - **Catalogue** (`catalogue.rs`): the static [`ScenarioId`] table.
//! - **Runner** (`runner.rs`): resolves fixtures, runs scenarios in
//!   catalogue order, collects the [`Report`].
//!
//! ## Outcomes
//!
//! A check passes, fails (the server or document is wrong) or errors (the
//! check could not be evaluated). A setup failure aborts its scenario and
//! the run continues with the next one.
//!
//! ## Example
//!
//! ```ignore
//! let config = SuiteConfig::load("conformance.yaml")?;
//! let harness = Harness::new(config)?;
//! let selection = default_selection(harness.config());
//! let report = run_catalogue(&harness, &selection).await;
//! print!("{}", report.render_text());
//! ```

pub mod catalogue;
pub mod checks;
pub mod config;
pub mod error;
pub mod harness;
pub mod report;
pub mod runner;
pub(crate) mod scenarios;

pub use catalogue::{Descriptor, ScenarioId, UnknownScenario, CATALOGUE};
pub use config::{ConfigError, Fixture, SuiteConfig};
pub use error::SetupError;
pub use harness::Harness;
pub use report::{CheckResult, Outcome, Report, ScenarioReport, ScenarioRun, Totals};
pub use runner::{default_selection, run_adhoc, run_catalogue, run_scenario, AdHoc};
