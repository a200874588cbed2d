//! Errors that stop a scenario before its checks can mean anything.

use lcpt_client::{LifecycleError, TransportError};
use lcpt_model::{LicenseError, StatusError};
use lcpt_publication::PublicationError;
use thiserror::Error;

use crate::config::ConfigError;

/// A scenario setup failure. Recorded as the scenario's abort reason.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Fixture or server section missing from the configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The license cannot be loaded.
    #[error(transparent)]
    License(#[from] LicenseError),

    /// The publication cannot be opened or read.
    #[error(transparent)]
    Publication(#[from] PublicationError),

    /// A status document lacks a link the scenario follows.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// A status document or license cannot be fetched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An operation needed to reach the scenario's starting state failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The scenario needs a loan license.
    #[error("license has no rights.end, a loan license is required")]
    NotALoan,

    /// The scenario needs the license in a given state.
    #[error("license is {actual}, the scenario needs it {required}")]
    WrongStartingState {
        required: &'static str,
        actual: String,
    },

    /// A provisioning input file cannot be used.
    #[error("content record {path}: {reason}")]
    ContentRecord { path: String, reason: String },
}
