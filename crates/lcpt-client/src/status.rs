//! # Status Document Operations
//!
//! Typed client for a status server. Every mutating operation takes the
//! current [`StatusDocument`] by reference and, on success, returns the
//! document the server answered with; the caller keeps both to compare.
//!
//! | Operation | Link rel | Method | Template variables |
//! |-----------|----------|--------|--------------------|
//! | register  | register | POST   | id, name           |
//! | renew     | renew    | PUT    | end, id, name      |
//! | return    | return   | PUT    | id, name           |
//!
//! A 2xx answer must carry a status document. Any other answer is a
//! [`LifecycleError::Rejected`] with the code and body, for the caller to
//! judge against the lifecycle table.

use lcpt_core::{mime, Link, Timestamp};
use lcpt_model::{License, StatusDocument};
use lcpt_state::Operation;
use reqwest::Method;

use crate::config::{BasicAuth, ClientConfig};
use crate::error::{LifecycleError, TransportError};
use crate::template;

/// A reading device, as identified to the status server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub name: String,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// A device with empty id and name.
    pub fn anonymous() -> Self {
        Self::new("", "")
    }
}

/// The `end` variable of a renew request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewEnd {
    /// Renew until this instant, sent as `YYYY-MM-DDTHH:MM:SSZ`.
    At(Timestamp),
    /// Let the server pick the new end.
    Unspecified,
    /// Send this text verbatim, well-formed or not.
    Raw(String),
}

/// Parameters of a renew call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewRequest {
    pub device: Option<Device>,
    pub end: RenewEnd,
}

/// Client for a status server.
#[derive(Debug, Clone)]
pub struct StatusClient {
    http: reqwest::Client,
    retries: u32,
    auth: Option<BasicAuth>,
}

impl StatusClient {
    /// Create a client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self {
            http: config.build_http().map_err(TransportError::Init)?,
            retries: config.retries,
            auth: config.auth.clone(),
        })
    }

    /// Fetch a status document.
    ///
    /// Calls `GET {url}`; anything but a 2xx carrying a status document is
    /// an error.
    pub async fn fetch_status(&self, url: &str) -> Result<StatusDocument, TransportError> {
        let endpoint = format!("GET {url}");
        let (status, body) = self.send(Method::GET, url, &endpoint).await?;
        if !(200..300).contains(&status) {
            return Err(TransportError::Status {
                endpoint,
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        parse_status(&endpoint, &body)
    }

    /// Fetch the license a status document points to.
    pub async fn fetch_license(&self, status: &StatusDocument) -> Result<License, LifecycleError> {
        let link = status.link("license").ok_or_else(|| LifecycleError::MissingLink {
            rel: "license".to_string(),
        })?;
        let endpoint = format!("GET {}", link.href);
        let (code, body) = self.send(Method::GET, &link.href, &endpoint).await?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Status {
                endpoint,
                status: code,
                body: String::from_utf8_lossy(&body).into_owned(),
            }
            .into());
        }
        License::parse(&body)
            .map_err(|source| TransportError::MalformedLicense { endpoint, source }.into())
    }

    /// Fetch any resource and report its status code.
    pub async fn fetch_resource(&self, url: &str) -> Result<u16, TransportError> {
        let endpoint = format!("GET {url}");
        let (status, _) = self.send(Method::GET, url, &endpoint).await?;
        Ok(status)
    }

    /// Register `device`.
    pub async fn register(
        &self,
        status: &StatusDocument,
        device: &Device,
    ) -> Result<StatusDocument, LifecycleError> {
        let vars = [("id", device.id.as_str()), ("name", device.name.as_str())];
        self.operate(status, Operation::Register, Method::POST, &vars)
            .await
    }

    /// Renew the loan.
    pub async fn renew(
        &self,
        status: &StatusDocument,
        request: &RenewRequest,
    ) -> Result<StatusDocument, LifecycleError> {
        let end = match &request.end {
            RenewEnd::At(t) => Some(t.to_iso8601()),
            RenewEnd::Raw(s) => Some(s.clone()),
            RenewEnd::Unspecified => None,
        };
        let mut vars: Vec<(&str, &str)> = Vec::with_capacity(3);
        if let Some(end) = end.as_deref() {
            vars.push(("end", end));
        }
        if let Some(device) = &request.device {
            vars.push(("id", device.id.as_str()));
            vars.push(("name", device.name.as_str()));
        }
        self.operate(status, Operation::Renew, Method::PUT, &vars)
            .await
    }

    /// Return the license from `device`.
    pub async fn return_license(
        &self,
        status: &StatusDocument,
        device: &Device,
    ) -> Result<StatusDocument, LifecycleError> {
        let vars = [("id", device.id.as_str()), ("name", device.name.as_str())];
        self.operate(status, Operation::Return, Method::PUT, &vars)
            .await
    }

    async fn operate(
        &self,
        status: &StatusDocument,
        operation: Operation,
        method: Method,
        vars: &[(&str, &str)],
    ) -> Result<StatusDocument, LifecycleError> {
        let rel = operation.rel();
        let link = status.link(rel).ok_or_else(|| LifecycleError::MissingLink {
            rel: rel.to_string(),
        })?;
        check_operation_link(link)?;

        let url = template::expand(&link.href, vars).map_err(|source| LifecycleError::Template {
            rel: rel.to_string(),
            source,
        })?;
        let endpoint = format!("{method} {url}");
        tracing::debug!(%operation, %endpoint, "status operation");

        let (code, body) = self.send(method, &url, &endpoint).await?;
        if !(200..300).contains(&code) {
            let body = String::from_utf8_lossy(&body).into_owned();
            tracing::info!(%operation, status_code = code, %body, "operation refused");
            return Err(LifecycleError::Rejected {
                operation,
                status_code: code,
                body,
            });
        }
        Ok(parse_status(&endpoint, &body)?)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        endpoint: &str,
    ) -> Result<(u16, Vec<u8>), TransportError> {
        let parsed = url::Url::parse(url).map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let resp = crate::retry::retry_send(self.retries, || {
            let mut req = self.http.request(method.clone(), parsed.clone());
            if let Some(auth) = &self.auth {
                req = req.basic_auth(&auth.user, Some(auth.password.as_str()));
            }
            req.send()
        })
        .await
        .map_err(|e| TransportError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| TransportError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })?;
        tracing::debug!(%endpoint, status, bytes = body.len(), "response");
        Ok((status, body.to_vec()))
    }
}

/// Refuse a link that cannot be a status operation endpoint.
///
/// The link must be templated, and when it declares a media type it must
/// be the status document's.
pub fn check_operation_link(link: &Link) -> Result<(), LifecycleError> {
    if !link.templated {
        return Err(LifecycleError::NotTemplated {
            rel: link.rel.clone(),
        });
    }
    match link.media_type.as_deref() {
        Some(found) if found != mime::STATUS => Err(LifecycleError::WrongLinkType {
            rel: link.rel.clone(),
            expected: mime::STATUS,
            found: found.to_string(),
        }),
        _ => Ok(()),
    }
}

fn parse_status(endpoint: &str, body: &[u8]) -> Result<StatusDocument, TransportError> {
    StatusDocument::parse(body).map_err(|source| TransportError::MalformedStatus {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(templated: bool, media_type: Option<&str>) -> Link {
        Link {
            rel: "renew".to_string(),
            href: "https://lsd.example/renew{?end}".to_string(),
            media_type: media_type.map(str::to_string),
            templated,
            title: None,
            length: None,
            hash: None,
        }
    }

    #[test]
    fn test_operation_link_gate() {
        assert!(check_operation_link(&link(true, Some(mime::STATUS))).is_ok());
        assert!(check_operation_link(&link(true, None)).is_ok());
        assert!(matches!(
            check_operation_link(&link(false, Some(mime::STATUS))),
            Err(LifecycleError::NotTemplated { .. })
        ));
        assert!(matches!(
            check_operation_link(&link(true, Some(mime::LICENSE))),
            Err(LifecycleError::WrongLinkType { .. })
        ));
    }

    #[test]
    fn test_anonymous_device() {
        let d = Device::anonymous();
        assert!(d.id.is_empty() && d.name.is_empty());
    }
}
