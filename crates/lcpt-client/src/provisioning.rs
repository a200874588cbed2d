//! # License Server Provisioning
//!
//! Drives a license server through the three calls that turn an already
//! encrypted publication into a license and a protected EPUB:
//!
//! | Method | Path | Accepts |
//! |--------|------|---------|
//! | PUT    | `/contents/{id}` | 200, 201 |
//! | POST   | `/contents/{id}/licenses` | 201 |
//! | POST   | `/contents/{id}/publications` | 201 |
//!
//! Encrypting the EPUB is out of scope; the caller supplies the
//! [`ContentRecord`] produced by the encryption tool.

use lcpt_core::Timestamp;
use lcpt_crypto::{hash, HashAlgorithm};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::config::{BasicAuth, ClientConfig};
use crate::error::TransportError;

/// Days of reading granted by generated licenses.
pub const LICENSE_DAYS: i64 = 100;

/// What the encryption tool reports about a protected content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContentRecord {
    pub content_id: String,
    pub content_encryption_key: String,
    pub protected_content_location: String,
    pub protected_content_length: u64,
    pub protected_content_sha256: String,
    pub protected_content_disposition: String,
}

/// `user` member of a partial license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialUser {
    pub id: String,
    pub email: String,
    pub encrypted: Vec<String>,
}

/// `encryption.user_key` member of a partial license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialUserKey {
    pub text_hint: String,
    /// Hex SHA-256 of the passphrase.
    pub user_hash: String,
    pub algorithm: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialEncryption {
    pub user_key: PartialUserKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialRights {
    pub print: u64,
    pub copy: u64,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// The license request body: the server fills in everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialLicense {
    pub provider: String,
    pub user: PartialUser,
    pub encryption: PartialEncryption,
    pub rights: PartialRights,
}

impl PartialLicense {
    /// A license request for a fresh random user, valid from `now` for
    /// [`LICENSE_DAYS`] days.
    pub fn new(passphrase: &str, text_hint: &str, now: Timestamp) -> Self {
        let user_id = Uuid::new_v4().to_string();
        // Only SHA-256 is defined, so the hash cannot fail.
        let user_hash = hash(passphrase, HashAlgorithm::SHA256_URI)
            .map(|k| k.to_hex())
            .unwrap_or_default();
        Self {
            provider: Uuid::new_v4().to_string(),
            user: PartialUser {
                email: format!("{user_id}@lcp.test.local"),
                id: user_id,
                encrypted: vec!["email".to_string()],
            },
            encryption: PartialEncryption {
                user_key: PartialUserKey {
                    text_hint: text_hint.to_string(),
                    user_hash,
                    algorithm: HashAlgorithm::SHA256_URI.to_string(),
                },
            },
            rights: PartialRights {
                print: 10,
                copy: 2048,
                start: now,
                end: now.plus_days(LICENSE_DAYS),
            },
        }
    }
}

/// Client for a license server's provisioning API.
#[derive(Debug, Clone)]
pub struct ProvisioningClient {
    http: reqwest::Client,
    base_url: Url,
    retries: u32,
    auth: Option<BasicAuth>,
}

impl ProvisioningClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: Url, config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self {
            http: config.build_http().map_err(TransportError::Init)?,
            base_url,
            retries: config.retries,
            auth: config.auth.clone(),
        })
    }

    /// Store an encrypted content.
    ///
    /// Calls `PUT {base_url}/contents/{id}`.
    pub async fn store_content(&self, content: &ContentRecord) -> Result<(), TransportError> {
        let path = format!("contents/{}", content.content_id);
        self.call(Method::PUT, &path, content, &[200, 201]).await?;
        Ok(())
    }

    /// Generate a license; returns the license bytes.
    ///
    /// Calls `POST {base_url}/contents/{id}/licenses`.
    pub async fn generate_license(
        &self,
        content_id: &str,
        request: &PartialLicense,
    ) -> Result<Vec<u8>, TransportError> {
        let path = format!("contents/{content_id}/licenses");
        self.call(Method::POST, &path, request, &[201]).await
    }

    /// Generate a protected publication; returns the EPUB bytes.
    ///
    /// Calls `POST {base_url}/contents/{id}/publications`.
    pub async fn generate_publication(
        &self,
        content_id: &str,
        request: &PartialLicense,
    ) -> Result<Vec<u8>, TransportError> {
        let path = format!("contents/{content_id}/publications");
        self.call(Method::POST, &path, request, &[201]).await
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        accept: &[u16],
    ) -> Result<Vec<u8>, TransportError> {
        let url = join(&self.base_url, path)?;
        let endpoint = format!("{method} /{path}");
        tracing::debug!(%endpoint, "provisioning request");

        let resp = crate::retry::retry_send(self.retries, || {
            let mut req = self.http.request(method.clone(), url.clone()).json(body);
            if let Some(auth) = &self.auth {
                req = req.basic_auth(&auth.user, Some(auth.password.as_str()));
            }
            req.send()
        })
        .await
        .map_err(|e| TransportError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(|e| TransportError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        if !accept.contains(&status) {
            return Err(TransportError::Status {
                endpoint,
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        tracing::debug!(%endpoint, status, bytes = bytes.len(), "provisioning response");
        Ok(bytes.to_vec())
    }
}

fn join(base: &Url, path: &str) -> Result<Url, TransportError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path).map_err(|e| TransportError::InvalidUrl {
        url: format!("{base}{path}"),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_license_shape() {
        let now = Timestamp::parse("2017-09-01T10:00:00Z").unwrap();
        let partial = PartialLicense::new("secret", "the usual", now);
        let value = serde_json::to_value(&partial).unwrap();

        assert_eq!(value["rights"]["start"], "2017-09-01T10:00:00Z");
        assert_eq!(value["rights"]["end"], "2017-12-10T10:00:00Z");
        assert_eq!(value["rights"]["print"], 10);
        assert_eq!(value["user"]["encrypted"][0], "email");
        assert!(value["user"]["email"]
            .as_str()
            .unwrap()
            .ends_with("@lcp.test.local"));
        assert_eq!(
            value["encryption"]["user_key"]["user_hash"],
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
        );
    }

    #[test]
    fn test_content_record_field_names() {
        let record: ContentRecord = serde_json::from_value(serde_json::json!({
            "content-id": "c1",
            "content-encryption-key": "a2V5",
            "protected-content-location": "/srv/c1.epub",
            "protected-content-length": 1024,
            "protected-content-sha256": "ab",
            "protected-content-disposition": "book.epub"
        }))
        .unwrap();
        assert_eq!(record.content_id, "c1");
        assert_eq!(record.protected_content_length, 1024);
    }

    #[test]
    fn test_join_keeps_base_path() {
        let base = Url::parse("https://lcp.example/api").unwrap();
        assert_eq!(
            join(&base, "contents/1").unwrap().as_str(),
            "https://lcp.example/api/contents/1"
        );
        let root = Url::parse("https://lcp.example").unwrap();
        assert_eq!(
            join(&root, "contents/1/licenses").unwrap().as_str(),
            "https://lcp.example/contents/1/licenses"
        );
    }
}
