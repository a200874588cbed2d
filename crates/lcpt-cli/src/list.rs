//! `lcpt list`: print the scenario catalogue.

use anyhow::Result;
use clap::Args;
use lcpt_suite::CATALOGUE;

use crate::EXIT_SUCCESS;

/// Arguments for the `lcpt list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list scenarios that run by default.
    #[arg(long)]
    pub default_only: bool,
}

/// Execute the list subcommand.
pub fn run_list(args: &ListArgs) -> Result<u8> {
    print!("{}", render(args.default_only));
    Ok(EXIT_SUCCESS)
}

fn render(default_only: bool) -> String {
    let width = CATALOGUE
        .iter()
        .map(|d| d.id.as_str().len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for d in CATALOGUE.iter().filter(|d| d.default || !default_only) {
        let marker = if d.default { "" } else { " (on request)" };
        out.push_str(&format!(
            "{:width$}  {:4}  {}{marker}\n",
            d.id.as_str(),
            d.fixture,
            d.description
        ));
    }
    out
}
