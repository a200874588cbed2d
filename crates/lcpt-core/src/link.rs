//! # Links
//!
//! Licenses and status documents both carry an ordered `links` array of
//! `{rel, href, type?, templated?}` objects. This module defines the shared
//! [`Link`] type and the lookups the harness performs on link lists.

use serde::{Deserialize, Serialize};

/// A link object of a license or status document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Relation, e.g. `status`, `register`.
    pub rel: String,
    /// Target URL or URI template.
    pub href: String,
    /// Media type of the target.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Whether `href` is a URI template.
    #[serde(default, skip_serializing_if = "is_false")]
    pub templated: bool,
    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Size of the target in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    /// Hash of the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Link {
    /// Whether the link points at an `https` URL.
    pub fn is_https(&self) -> bool {
        self.href.starts_with("https://")
    }

    /// Whether the link declares exactly this media type.
    pub fn has_type(&self, media_type: &str) -> bool {
        self.media_type.as_deref() == Some(media_type)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// First link with the given relation.
pub fn find<'a>(links: &'a [Link], rel: &str) -> Option<&'a Link> {
    links.iter().find(|l| l.rel == rel)
}

/// Number of links with the given relation.
pub fn count(links: &[Link], rel: &str) -> usize {
    links.iter().filter(|l| l.rel == rel).count()
}
