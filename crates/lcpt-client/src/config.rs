//! HTTP client configuration.
//!
//! Built explicitly by the caller (usually from the suite configuration
//! file); nothing is read from the environment.

use zeroize::Zeroizing;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of retries after a transport failure.
pub const DEFAULT_RETRIES: u32 = 3;

/// HTTP basic credentials.
///
/// Custom `Debug` implementation redacts the password.
#[derive(Clone)]
pub struct BasicAuth {
    /// User name.
    pub user: String,
    /// Password, wiped on drop.
    pub password: Zeroizing<String>,
}

impl BasicAuth {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: Zeroizing::new(password.into()),
        }
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Settings shared by the status and provisioning clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a transport failure (connection refused, timeout).
    /// Responses with any status code are never retried.
    pub retries: u32,
    /// Credentials sent with every request, when set.
    pub auth: Option<BasicAuth>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retries: DEFAULT_RETRIES,
            auth: None,
        }
    }
}

impl ClientConfig {
    /// Same settings with credentials.
    pub fn with_auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub(crate) fn build_http(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()
    }
}
