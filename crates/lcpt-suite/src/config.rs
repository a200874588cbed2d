//! # Suite Configuration
//!
//! One YAML file, loaded from an explicit path. Relative paths inside it
//! resolve against the file's own directory, so a configuration and its
//! fixtures can be moved together.
//!
//! ```yaml
//! common:
//!   license: { schema: schemas/license.schema.json }
//!   status:  { schema: schemas/status.schema.json }
//!   crypto:  { cacert: certs/cacert.pem }
//! http: { timeout_secs: 30, retries: 3 }
//! lsd_server: { auth: { user: u, passwd: p } }
//! lcp_server: { base_uri: https://lcp.example, auth: { user: u, passwd: p } }
//! data:
//!   b1: { license: fixtures/b1.lcpl, passphrase: "..." }
//!   e1: { epub: fixtures/e1.epub, passphrase: "..." }
//!   c1: { content: fixtures/content.json, passphrase: "...", text_hint: "..." }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lcpt_client::{BasicAuth, ClientConfig};
use serde::Deserialize;
use url::Url;

/// Configuration errors. All are fatal before any scenario runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file cannot be read.
    #[error("cannot read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML or misses required keys.
    #[error("invalid configuration {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A file named by the configuration does not exist.
    #[error("{what} not found: {}", path.display())]
    MissingFile { what: String, path: PathBuf },

    /// A scenario asked for a fixture the configuration does not define.
    #[error("no fixture '{0}' in configuration data")]
    UnknownFixture(String),

    /// A fixture lacks a member a scenario needs.
    #[error("fixture '{key}' has no {field}")]
    IncompleteFixture { key: String, field: &'static str },

    /// A section needed by the requested scenarios is absent.
    #[error("configuration has no {0} section")]
    MissingSection(&'static str),

    /// `lcp_server.base_uri` is not a URL.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A schema file cannot be compiled.
    #[error("{0}")]
    Schema(#[from] lcpt_schema::SchemaError),

    /// The CA certificate cannot be loaded.
    #[error("CA certificate: {0}")]
    Certificate(#[from] lcpt_core::CryptoError),

    /// The HTTP clients cannot be built.
    #[error("{0}")]
    Client(#[from] lcpt_client::TransportError),
}

/// `{ schema: PATH }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaRef {
    pub schema: PathBuf,
}

/// `common.crypto`.
#[derive(Debug, Clone, Deserialize)]
pub struct CryptoConfig {
    /// Root certificate provider certificates must chain to.
    pub cacert: PathBuf,
}

/// `common`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommonConfig {
    pub license: SchemaRef,
    pub status: SchemaRef,
    pub crypto: CryptoConfig,
}

/// `http`.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_timeout() -> u64 {
    lcpt_client::config::DEFAULT_TIMEOUT_SECS
}

fn default_retries() -> u32 {
    lcpt_client::config::DEFAULT_RETRIES
}

/// `auth`. Custom `Debug` implementation redacts the password.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub user: String,
    pub passwd: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("user", &self.user)
            .field("passwd", &"[REDACTED]")
            .finish()
    }
}

/// `lsd_server`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LsdServerConfig {
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

/// `lcp_server`.
#[derive(Debug, Clone, Deserialize)]
pub struct LcpServerConfig {
    pub base_uri: String,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

/// An entry of `data`. Custom `Debug` implementation redacts the
/// passphrase.
#[derive(Clone, Default, Deserialize)]
pub struct Fixture {
    /// License file.
    #[serde(default)]
    pub license: Option<PathBuf>,
    /// Protected publication.
    #[serde(default)]
    pub epub: Option<PathBuf>,
    /// Encryption tool output describing an encrypted content.
    #[serde(default)]
    pub content: Option<PathBuf>,
    /// Passphrase the license was issued for.
    #[serde(default)]
    pub passphrase: Option<String>,
    /// Hint sent when requesting new licenses.
    #[serde(default)]
    pub text_hint: Option<String>,
}

impl std::fmt::Debug for Fixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fixture")
            .field("license", &self.license)
            .field("epub", &self.epub)
            .field("content", &self.content)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .field("text_hint", &self.text_hint)
            .finish()
    }
}

impl Fixture {
    /// A fixture naming only a license file.
    pub fn from_license(path: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        Self {
            license: Some(path.into()),
            passphrase,
            ..Self::default()
        }
    }

    /// A fixture naming only a protected publication.
    pub fn from_epub(path: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        Self {
            epub: Some(path.into()),
            passphrase,
            ..Self::default()
        }
    }

    fn resolve(&mut self, base: &Path) {
        for path in [&mut self.license, &mut self.epub, &mut self.content]
            .into_iter()
            .flatten()
        {
            *path = resolve_path(path, base);
        }
    }
}

/// The whole configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SuiteConfig {
    pub common: CommonConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub lsd_server: Option<LsdServerConfig>,
    #[serde(default)]
    pub lcp_server: Option<LcpServerConfig>,
    #[serde(default)]
    pub data: BTreeMap<String, Fixture>,
}

impl SuiteConfig {
    /// Load and parse a configuration file, resolving relative paths
    /// against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_yaml(&text, base).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), fixtures = config.data.len(), "configuration loaded");
        Ok(config)
    }

    /// Parse configuration text, resolving relative paths against `base`.
    pub fn from_yaml(text: &str, base: &Path) -> Result<Self, serde_yaml::Error> {
        let mut config: Self = serde_yaml::from_str(text)?;
        config.common.license.schema = resolve_path(&config.common.license.schema, base);
        config.common.status.schema = resolve_path(&config.common.status.schema, base);
        config.common.crypto.cacert = resolve_path(&config.common.crypto.cacert, base);
        for fixture in config.data.values_mut() {
            fixture.resolve(base);
        }
        Ok(config)
    }

    /// Check that every file the configuration names exists, and that the
    /// license server URL parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_file("license schema", &self.common.license.schema)?;
        require_file("status schema", &self.common.status.schema)?;
        require_file("CA certificate", &self.common.crypto.cacert)?;
        for (key, fixture) in &self.data {
            let named = [
                ("license", &fixture.license),
                ("epub", &fixture.epub),
                ("content", &fixture.content),
            ];
            for (field, path) in named {
                if let Some(path) = path {
                    require_file(&format!("fixture '{key}' {field}"), path)?;
                }
            }
        }
        if let Some(lcp) = &self.lcp_server {
            parse_url(&lcp.base_uri)?;
        }
        Ok(())
    }

    /// The fixture registered under `key`.
    pub fn fixture(&self, key: &str) -> Result<&Fixture, ConfigError> {
        self.data
            .get(key)
            .ok_or_else(|| ConfigError::UnknownFixture(key.to_string()))
    }

    /// Whether a fixture is registered under `key`.
    pub fn has_fixture(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// HTTP settings for status server calls.
    pub fn lsd_client_config(&self) -> ClientConfig {
        let auth = self.lsd_server.as_ref().and_then(|s| s.auth.as_ref());
        self.client_config(auth)
    }

    /// HTTP settings and base URL for license server calls.
    pub fn lcp_client_config(&self) -> Result<(Url, ClientConfig), ConfigError> {
        let lcp = self
            .lcp_server
            .as_ref()
            .ok_or(ConfigError::MissingSection("lcp_server"))?;
        Ok((parse_url(&lcp.base_uri)?, self.client_config(lcp.auth.as_ref())))
    }

    fn client_config(&self, auth: Option<&AuthConfig>) -> ClientConfig {
        ClientConfig {
            timeout_secs: self.http.timeout_secs,
            retries: self.http.retries,
            auth: auth.map(|a| BasicAuth::new(a.user.clone(), a.passwd.clone())),
        }
    }
}

/// Absolute paths are kept; relative ones are joined to `base`.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn require_file(what: &str, path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::MissingFile {
            what: what.to_string(),
            path: path.to_path_buf(),
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}
