//! # Harness
//!
//! Everything a scenario needs, built once from the configuration: the two
//! compiled schemas, the CA certificate, and the HTTP clients.

use lcpt_client::{ProvisioningClient, StatusClient};
use lcpt_crypto::Certificate;
use lcpt_schema::SchemaValidator;

use crate::config::{ConfigError, SuiteConfig};

/// Shared, read-only scenario context.
#[derive(Debug)]
pub struct Harness {
    config: SuiteConfig,
    license_schema: SchemaValidator,
    status_schema: SchemaValidator,
    ca: Certificate,
    lsd: StatusClient,
    lcp: Option<ProvisioningClient>,
}

impl Harness {
    /// Validate `config` and load what it points to.
    pub fn new(config: SuiteConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let license_schema = SchemaValidator::from_file(&config.common.license.schema)?;
        let status_schema = SchemaValidator::from_file(&config.common.status.schema)?;
        let ca = Certificate::from_path(&config.common.crypto.cacert)?;
        tracing::debug!(subject = %ca.subject(), "CA certificate loaded");

        let lsd = StatusClient::new(&config.lsd_client_config())?;
        let lcp = match config.lcp_server {
            Some(_) => {
                let (base, client) = config.lcp_client_config()?;
                Some(ProvisioningClient::new(base, &client)?)
            }
            None => None,
        };

        Ok(Self {
            config,
            license_schema,
            status_schema,
            ca,
            lsd,
            lcp,
        })
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn license_schema(&self) -> &SchemaValidator {
        &self.license_schema
    }

    pub fn status_schema(&self) -> &SchemaValidator {
        &self.status_schema
    }

    pub fn ca(&self) -> &Certificate {
        &self.ca
    }

    pub fn lsd(&self) -> &StatusClient {
        &self.lsd
    }

    /// The license server client, when `lcp_server` is configured.
    pub fn lcp(&self) -> Result<&ProvisioningClient, ConfigError> {
        self.lcp
            .as_ref()
            .ok_or(ConfigError::MissingSection("lcp_server"))
    }
}
