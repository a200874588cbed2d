//! `lcpt check-config`: load the configuration, compile the schemas, read
//! the CA certificate, and list the configured fixtures.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use lcpt_suite::default_selection;

use crate::{open_harness_or_report, EXIT_CONFIG, EXIT_SUCCESS};

/// Arguments for the `lcpt check-config` subcommand.
#[derive(Args, Debug)]
pub struct CheckConfigArgs {}

/// Execute the check-config subcommand.
///
/// Returns exit code: 0 when the configuration is usable, 2 otherwise.
pub fn run_check_config(_args: &CheckConfigArgs, config: &Path) -> Result<u8> {
    let Some(harness) = open_harness_or_report(config) else {
        return Ok(EXIT_CONFIG);
    };
    let config = harness.config();
    println!("OK: CA {}", harness.ca().subject());
    for (key, fixture) in &config.data {
        let files: Vec<String> = [&fixture.license, &fixture.epub, &fixture.content]
            .into_iter()
            .flatten()
            .map(|p| p.display().to_string())
            .collect();
        let passphrase = if fixture.passphrase.is_some() { "" } else { " (no passphrase)" };
        println!("  {key}: {}{passphrase}", files.join(", "));
    }
    if config.lcp_server.is_none() {
        println!("  no lcp_server: provisioning disabled");
    }
    println!("{} scenarios runnable by default", default_selection(config).len());
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_schema_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conformance.yaml");
        std::fs::write(
            &path,
            "common:\n  license: { schema: l.json }\n  status: { schema: s.json }\n  crypto: { cacert: ca.pem }\n",
        )
        .unwrap();
        let code = run_check_config(&CheckConfigArgs {}, &path).unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conformance.yaml");
        std::fs::write(&path, "common: [unterminated").unwrap();
        let code = run_check_config(&CheckConfigArgs {}, &path).unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
