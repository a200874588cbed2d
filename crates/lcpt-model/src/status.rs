//! # Status Document
//!
//! The server-held lifecycle state of one license. The document is parsed
//! into a closed shape: an unknown `status` or event `type` is a parse
//! error, not a value to carry around.

use lcpt_core::{link, Link, ParseError, Timestamp};
use lcpt_schema::{SchemaError, SchemaValidator};
use lcpt_state::{EventType, LicenseStatus, Snapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StatusError;

/// `updated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Updated {
    /// Last change of the license document.
    pub license: Timestamp,
    /// Last change of the status.
    pub status: Timestamp,
}

/// `potential_rights`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PotentialRights {
    /// Latest end date a renewal may reach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Timestamp>,
}

/// An entry of `events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// What happened.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// When.
    pub timestamp: Timestamp,
    /// Device id.
    #[serde(default)]
    pub id: String,
    /// Device name.
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StatusFields {
    #[serde(default)]
    id: Option<String>,
    status: LicenseStatus,
    #[serde(default)]
    message: String,
    updated: Updated,
    #[serde(default)]
    potential_rights: Option<PotentialRights>,
    #[serde(default)]
    events: Option<Vec<Event>>,
    #[serde(default)]
    links: Vec<Link>,
}

/// A parsed status document.
#[derive(Debug, Clone)]
pub struct StatusDocument {
    raw: Value,
    fields: StatusFields,
}

impl StatusDocument {
    /// Parse a status document from JSON bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, StatusError> {
        let raw: Value = serde_json::from_slice(bytes).map_err(ParseError::from)?;
        Self::from_value(raw)
    }

    /// Build from an already parsed JSON value.
    pub fn from_value(raw: Value) -> Result<Self, StatusError> {
        let fields: StatusFields = serde_json::from_value(raw.clone()).map_err(ParseError::from)?;
        Ok(Self { raw, fields })
    }

    /// Validate against the status schema.
    pub fn validate_schema(&self, schema: &SchemaValidator) -> Result<(), SchemaError> {
        schema.validate(&self.raw)
    }

    /// The document as parsed.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// `id`, when present.
    pub fn id(&self) -> Option<&str> {
        self.fields.id.as_deref()
    }

    /// `status`.
    pub fn status(&self) -> LicenseStatus {
        self.fields.status
    }

    /// `message`.
    pub fn message(&self) -> &str {
        &self.fields.message
    }

    /// `updated`.
    pub fn updated(&self) -> Updated {
        self.fields.updated
    }

    /// `potential_rights.end`, when present.
    pub fn potential_rights_end(&self) -> Option<Timestamp> {
        self.fields.potential_rights.and_then(|p| p.end)
    }

    /// `events`, when the document lists them.
    pub fn events(&self) -> Option<&[Event]> {
        self.fields.events.as_deref()
    }

    /// Events of one type, in document order. Empty when events are not
    /// listed.
    pub fn events_of(&self, event_type: EventType) -> impl Iterator<Item = &Event> {
        self.events()
            .unwrap_or_default()
            .iter()
            .filter(move |e| e.event_type == event_type)
    }

    /// Whether an event of `event_type` for the given device is listed.
    pub fn has_event(&self, event_type: EventType, device_id: &str, device_name: &str) -> bool {
        self.events_of(event_type)
            .any(|e| e.id == device_id && e.name == device_name)
    }

    /// All links, in document order.
    pub fn links(&self) -> &[Link] {
        &self.fields.links
    }

    /// First link with relation `rel`.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        link::find(&self.fields.links, rel)
    }

    /// The single link with relation `rel`.
    pub fn required_link(&self, rel: &str) -> Result<&Link, StatusError> {
        match link::count(&self.fields.links, rel) {
            0 => Err(StatusError::MissingLink {
                rel: rel.to_string(),
            }),
            1 => self.link(rel).ok_or(StatusError::MissingLink {
                rel: rel.to_string(),
            }),
            count => Err(StatusError::DuplicateLink {
                rel: rel.to_string(),
                count,
            }),
        }
    }

    /// The lifecycle-relevant projection of the document.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.fields.status,
            updated: self.fields.updated.status,
            events: self.fields.events.as_ref().map(Vec::len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "id": "ef15e740-697f-11e3-949a-0800200c9a66",
            "status": "active",
            "message": "Your license is active",
            "updated": {
                "license": "2017-09-01T10:00:00Z",
                "status": "2017-09-02T12:00:00+02:00"
            },
            "potential_rights": {"end": "2017-12-01T00:00:00Z"},
            "events": [
                {"type": "register", "timestamp": "2017-09-02T10:00:00Z", "id": "6f2bd94-3dcf-4034-a663-5f2a7945ee52", "name": "My reading device 1"},
                {"type": "renew", "timestamp": "2017-09-03T10:00:00Z", "id": "6f2bd94-3dcf-4034-a663-5f2a7945ee52", "name": "My reading device 1"}
            ],
            "links": [
                {"rel": "license", "href": "https://lsd.example/licenses/1", "type": "application/vnd.readium.lcp.license.1.0+json"},
                {"rel": "register", "href": "https://lsd.example/licenses/1/register{?id,name}", "type": "application/vnd.readium.license.status.v1.0+json", "templated": true}
            ]
        })
    }

    #[test]
    fn test_fields() {
        let status = StatusDocument::from_value(doc()).unwrap();
        assert_eq!(status.status(), LicenseStatus::Active);
        assert_eq!(status.message(), "Your license is active");
        assert_eq!(status.updated().status.to_iso8601(), "2017-09-02T10:00:00Z");
        assert_eq!(
            status.potential_rights_end().unwrap().to_iso8601(),
            "2017-12-01T00:00:00Z"
        );
        assert!(status.link("register").unwrap().templated);
    }

    #[test]
    fn test_events() {
        let status = StatusDocument::from_value(doc()).unwrap();
        assert_eq!(status.events().unwrap().len(), 2);
        assert_eq!(status.events_of(EventType::Renew).count(), 1);
        assert!(status.has_event(
            EventType::Register,
            "6f2bd94-3dcf-4034-a663-5f2a7945ee52",
            "My reading device 1"
        ));
        assert!(!status.has_event(EventType::Register, "other", "My reading device 1"));
    }

    #[test]
    fn test_snapshot() {
        let snapshot = StatusDocument::from_value(doc()).unwrap().snapshot();
        assert_eq!(snapshot.status, LicenseStatus::Active);
        assert_eq!(snapshot.events, Some(2));
    }

    #[test]
    fn test_events_optional() {
        let mut raw = doc();
        raw.as_object_mut().unwrap().remove("events");
        raw.as_object_mut().unwrap().remove("potential_rights");
        let status = StatusDocument::from_value(raw).unwrap();
        assert!(status.events().is_none());
        assert_eq!(status.events_of(EventType::Register).count(), 0);
        assert_eq!(status.snapshot().events, None);
        assert_eq!(status.potential_rights_end(), None);
    }

    #[test]
    fn test_unknown_status_is_parse_error() {
        let mut raw = doc();
        raw["status"] = json!("pending");
        assert!(matches!(
            StatusDocument::from_value(raw),
            Err(StatusError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_updated_is_parse_error() {
        let mut raw = doc();
        raw.as_object_mut().unwrap().remove("updated");
        assert!(StatusDocument::from_value(raw).is_err());
    }

    #[test]
    fn test_required_link() {
        let status = StatusDocument::from_value(doc()).unwrap();
        assert!(status.required_link("license").is_ok());
        assert!(matches!(
            status.required_link("renew"),
            Err(StatusError::MissingLink { .. })
        ));
    }

    #[test]
    fn test_parse_bytes() {
        let bytes = serde_json::to_vec(&doc()).unwrap();
        assert!(StatusDocument::parse(&bytes).is_ok());
        assert!(StatusDocument::parse(b"<html>").is_err());
    }
}
