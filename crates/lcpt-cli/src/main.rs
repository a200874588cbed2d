//! # lcpt CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use lcpt_cli::adhoc::{run_adhoc_file, AdHocKind, FileArgs};
use lcpt_cli::check_config::{run_check_config, CheckConfigArgs};
use lcpt_cli::list::{run_list, ListArgs};
use lcpt_cli::run::{run_run, RunArgs};
use lcpt_cli::EXIT_CONFIG;

/// LCP/LSD conformance harness.
///
/// Checks licenses, protected publications, and the behaviour of license
/// and status servers against the LCP and LSD specifications.
#[derive(Parser, Debug)]
#[command(name = "lcpt", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scenario catalogue.
    Run(RunArgs),

    /// List catalogued scenarios with their fixtures.
    List(ListArgs),

    /// Check a license file.
    License(FileArgs),

    /// Check a protected publication and its embedded license.
    Publication(FileArgs),

    /// Walk a license through its status document.
    Lsd(FileArgs),

    /// Load and validate the configuration.
    CheckConfig(CheckConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    match cli.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "lcpt starting");

    if let Commands::List(args) = &cli.command {
        return finish(run_list(args));
    }
    let Some(config) = cli.config.as_deref() else {
        println!("CONFIG ERROR: --config is required for this command");
        return ExitCode::from(EXIT_CONFIG);
    };

    let result = match &cli.command {
        Commands::Run(args) => run_run(args, config),
        Commands::License(args) => run_adhoc_file(AdHocKind::License, args, config),
        Commands::Publication(args) => run_adhoc_file(AdHocKind::Publication, args, config),
        Commands::Lsd(args) => run_adhoc_file(AdHocKind::Lsd, args, config),
        Commands::CheckConfig(args) => run_check_config(args, config),
        Commands::List(args) => run_list(args),
    };
    finish(result)
}

fn finish(result: anyhow::Result<u8>) -> ExitCode {
    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
