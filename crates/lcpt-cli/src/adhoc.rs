//! # Ad Hoc Subcommands
//!
//! `lcpt license`, `lcpt publication` and `lcpt lsd` check one file given
//! on the command line instead of a configured fixture. The configuration
//! still supplies the schemas, the CA certificate and the HTTP settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use lcpt_suite::{run_adhoc, AdHoc};

use crate::{open_harness_or_report, print_report, runtime, ReportFormat, EXIT_CONFIG};

/// A file to check and the passphrase its license was issued for.
#[derive(Args, Debug)]
pub struct FileArgs {
    /// File to check.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Passphrase for the key check. Without it the key check errors.
    #[arg(long)]
    pub passphrase: Option<String>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Which checks an ad hoc subcommand runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdHocKind {
    License,
    Publication,
    Lsd,
}

/// Execute an ad hoc subcommand.
///
/// Returns exit code: 0 when every check passed, 1 otherwise, 2 on a
/// configuration error.
pub fn run_adhoc_file(kind: AdHocKind, args: &FileArgs, config: &Path) -> Result<u8> {
    let path = std::fs::canonicalize(&args.path)
        .with_context(|| format!("cannot open {}", args.path.display()))?;
    let Some(harness) = open_harness_or_report(config) else {
        return Ok(EXIT_CONFIG);
    };

    let passphrase = args.passphrase.clone();
    let adhoc = match kind {
        AdHocKind::License => AdHoc::license(path, passphrase),
        AdHocKind::Publication => AdHoc::publication(path, passphrase),
        AdHocKind::Lsd => AdHoc::lsd(path, passphrase),
    };
    tracing::info!(?kind, file = %args.path.display(), "ad hoc run");

    let report = runtime()?.block_on(run_adhoc(&harness, adhoc));
    print_report(&report, args.format)
}
