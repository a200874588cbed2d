//! # lcpt-client — HTTP Side of the Conformance Harness
//!
//! Two typed clients:
//!
//! - [`StatusClient`] fetches status documents and licenses and drives the
//!   register / renew / return operations through the status document's
//!   templated links.
//! - [`ProvisioningClient`] asks a license server to store an encrypted
//!   content and to generate a license and a protected publication for it.
//!
//! ## Execution model
//!
//! Both clients are async (`reqwest`), but the harness awaits every call
//! before issuing the next one; a single-threaded runtime is enough.
//! Transport failures are retried with exponential backoff; responses are
//! never retried, whatever their status code.

pub mod config;
pub mod error;
pub mod provisioning;
pub(crate) mod retry;
pub mod status;
pub mod template;

pub use config::{BasicAuth, ClientConfig};
pub use error::{LifecycleError, TransportError};
pub use provisioning::{ContentRecord, PartialLicense, ProvisioningClient};
pub use status::{check_operation_link, Device, RenewEnd, RenewRequest, StatusClient};
pub use template::TemplateError;
