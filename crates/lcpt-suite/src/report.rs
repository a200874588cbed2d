//! # Check Outcomes and Reports
//!
//! A scenario records one [`CheckResult`] per named check. A failing check
//! never stops the scenario; a setup error does, and is kept in
//! [`ScenarioReport::aborted`].
//!
//! The [`Report`] renders as plain text for a terminal or as JSON for CI.

use std::fmt;

use serde::Serialize;

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum Outcome {
    /// The server or document behaved as required.
    Pass,
    /// The server or document contradicts the requirement.
    Fail {
        /// Expected versus actual.
        message: String,
    },
    /// The check could not be evaluated.
    Error {
        /// What went wrong.
        error: String,
    },
}

impl Outcome {
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
        }
    }

    pub fn error(error: impl fmt::Display) -> Self {
        Self::Error {
            error: error.to_string(),
        }
    }

    /// `Pass` when `ok`, otherwise `Fail` with `message`.
    pub fn check(ok: bool, message: impl FnOnce() -> String) -> Self {
        if ok {
            Self::Pass
        } else {
            Self::fail(message())
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail { message } => write!(f, "FAIL: {message}"),
            Self::Error { error } => write!(f, "ERROR: {error}"),
        }
    }
}

/// A named check and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub outcome: Outcome,
}

/// Everything recorded while running one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    /// Scenario id, e.g. `register.again`.
    pub id: String,
    pub description: String,
    /// Checks in the order they ran.
    pub checks: Vec<CheckResult>,
    /// The setup error that stopped the scenario early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl ScenarioReport {
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.outcome.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| matches!(c.outcome, Outcome::Fail { .. }))
            .count()
    }

    pub fn errors(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| matches!(c.outcome, Outcome::Error { .. }))
            .count()
    }

    /// No failure, no error, not aborted.
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.checks.iter().all(|c| c.outcome.is_pass())
    }

    /// Outcome of the first check named `name`.
    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.checks.iter().find(|c| c.name == name).map(|c| &c.outcome)
    }
}

/// Accumulates the checks of a running scenario.
#[derive(Debug)]
pub struct ScenarioRun {
    report: ScenarioReport,
}

impl ScenarioRun {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            report: ScenarioReport {
                id: id.into(),
                description: description.into(),
                checks: Vec::new(),
                aborted: None,
            },
        }
    }

    /// Record a check. Returns whether it passed.
    pub fn record(&mut self, name: impl Into<String>, outcome: Outcome) -> bool {
        let name = name.into();
        let scenario = self.report.id.as_str();
        match &outcome {
            Outcome::Pass => tracing::info!(scenario, check = %name, "pass"),
            Outcome::Fail { message } => tracing::warn!(scenario, check = %name, %message, "fail"),
            Outcome::Error { error } => tracing::warn!(scenario, check = %name, %error, "error"),
        }
        let passed = outcome.is_pass();
        self.report.checks.push(CheckResult { name, outcome });
        passed
    }

    /// Close the scenario after a setup error.
    pub fn abort(mut self, error: impl fmt::Display) -> ScenarioReport {
        let error = error.to_string();
        tracing::error!(scenario = %self.report.id, %error, "scenario aborted");
        self.report.aborted = Some(error);
        self.report
    }

    /// Close the scenario normally.
    pub fn finish(self) -> ScenarioReport {
        self.report
    }
}

/// Counts over a whole report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub scenarios: usize,
    pub succeeded: usize,
    pub aborted: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

/// The outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub scenarios: Vec<ScenarioReport>,
}

impl Report {
    pub fn push(&mut self, scenario: ScenarioReport) {
        self.scenarios.push(scenario);
    }

    pub fn totals(&self) -> Totals {
        self.scenarios.iter().fold(Totals::default(), |mut t, s| {
            t.scenarios += 1;
            t.succeeded += usize::from(s.is_success());
            t.aborted += usize::from(s.aborted.is_some());
            t.passed += s.passed();
            t.failed += s.failed();
            t.errors += s.errors();
            t
        })
    }

    /// Every scenario succeeded.
    pub fn is_success(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::is_success)
    }

    /// The scenario report for `id`.
    pub fn scenario(&self, id: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Terminal rendering.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for scenario in &self.scenarios {
            out.push_str(&format!("{}: {}\n", scenario.id, scenario.description));
            for check in &scenario.checks {
                out.push_str(&format!("  {}: {}\n", check.outcome, check.name));
            }
            if let Some(error) = &scenario.aborted {
                out.push_str(&format!("  ABORTED: {error}\n"));
            }
        }
        let t = self.totals();
        out.push_str(&format!(
            "\nScenarios: {}/{} passed ({} aborted). Checks: {} passed, {} failed, {} errors.\n",
            t.succeeded, t.scenarios, t.aborted, t.passed, t.failed, t.errors
        ));
        out
    }

    /// JSON rendering, totals included.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Rendered<'a> {
            success: bool,
            totals: Totals,
            scenarios: &'a [ScenarioReport],
        }
        serde_json::to_string_pretty(&Rendered {
            success: self.is_success(),
            totals: self.totals(),
            scenarios: &self.scenarios,
        })
    }
}
