//! Link contract checks on licenses and status documents.

use lcpt_client::{check_operation_link, StatusClient};
use lcpt_core::{link, mime, Link};
use lcpt_model::{License, StatusDocument};
use lcpt_state::Operation;

use crate::report::Outcome;

/// Relations a license must carry exactly once.
pub const LICENSE_REQUIRED_RELS: [&str; 3] = ["hint", "publication", "status"];

/// `hint`, `publication` and `status` are each present exactly once.
pub fn required_links(license: &License) -> Outcome {
    let problems: Vec<String> = LICENSE_REQUIRED_RELS
        .iter()
        .filter_map(|rel| license.required_link(rel).err().map(|e| e.to_string()))
        .collect();
    Outcome::check(problems.is_empty(), || problems.join("; "))
}

/// The `hint` link answers a GET with a 2xx.
pub async fn hint_reachable(client: &StatusClient, license: &License) -> Outcome {
    let link = match license.required_link("hint") {
        Ok(link) => link,
        Err(e) => return Outcome::fail(e.to_string()),
    };
    match client.fetch_resource(&link.href).await {
        Ok(code) => Outcome::check((200..300).contains(&code), || {
            format!("hint link {} answered {code}", link.href)
        }),
        Err(e) => Outcome::error(e),
    }
}

/// The `status` link points at an https URL.
pub fn status_link_https(license: &License) -> Outcome {
    match license.required_link("status") {
        Ok(l) => Outcome::check(l.is_https(), || format!("status link {} is not https", l.href)),
        Err(e) => Outcome::fail(e.to_string()),
    }
}

/// The `status` link declares the status document media type.
pub fn status_link_type(license: &License) -> Outcome {
    license_link_type(license, "status", mime::STATUS)
}

/// The `publication` link declares the EPUB media type.
pub fn publication_link_type(license: &License) -> Outcome {
    license_link_type(license, "publication", mime::PUBLICATION)
}

fn license_link_type(license: &License, rel: &str, expected: &str) -> Outcome {
    match license.required_link(rel) {
        Ok(l) => type_is(l, expected),
        Err(e) => Outcome::fail(e.to_string()),
    }
}

fn type_is(l: &Link, expected: &str) -> Outcome {
    Outcome::check(l.has_type(expected), || {
        format!(
            "'{}' link has type {}, expected {expected}",
            l.rel,
            l.media_type.as_deref().unwrap_or("(none)")
        )
    })
}

/// The status document has one `license` link, https, with a license
/// media type (either spelling).
pub fn license_link(status: &StatusDocument) -> Outcome {
    let count = link::count(status.links(), "license");
    if count != 1 {
        return Outcome::fail(format!(
            "status document has {count} 'license' links, exactly one expected"
        ));
    }
    let Some(l) = status.link("license") else {
        return Outcome::fail("status document has no 'license' link");
    };
    if !l.is_https() {
        return Outcome::fail(format!("license link {} is not https", l.href));
    }
    match l.media_type.as_deref() {
        Some(t) if mime::is_license(t) => Outcome::Pass,
        other => Outcome::fail(format!(
            "'license' link has type {}, expected {}",
            other.unwrap_or("(none)"),
            mime::LICENSE
        )),
    }
}

/// The link for `op`, when the status document offers one, is templated
/// and typed as a status document.
pub fn operation_link(status: &StatusDocument, op: Operation) -> Outcome {
    match status.link(op.rel()) {
        None => {
            tracing::info!(rel = op.rel(), "operation not offered by the status document");
            Outcome::Pass
        }
        Some(l) => match check_operation_link(l) {
            Ok(()) => Outcome::Pass,
            Err(e) => Outcome::fail(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn license(links: serde_json::Value) -> License {
        License::from_value(json!({"id": "x", "links": links})).unwrap()
    }

    fn good_links() -> serde_json::Value {
        json!([
            {"rel": "hint", "href": "https://p.example/hint"},
            {"rel": "publication", "href": "https://p.example/b.epub", "type": mime::PUBLICATION},
            {"rel": "status", "href": "https://p.example/status/x", "type": mime::STATUS}
        ])
    }

    #[test]
    fn test_good_license_links() {
        let l = license(good_links());
        assert!(required_links(&l).is_pass());
        assert!(status_link_https(&l).is_pass());
        assert!(status_link_type(&l).is_pass());
        assert!(publication_link_type(&l).is_pass());
    }

    #[test]
    fn test_duplicate_and_missing_rels() {
        let l = license(json!([
            {"rel": "hint", "href": "https://p.example/1"},
            {"rel": "hint", "href": "https://p.example/2"},
            {"rel": "status", "href": "http://p.example/status", "type": "application/json"}
        ]));
        let Outcome::Fail { message } = required_links(&l) else {
            panic!("expected a failure");
        };
        assert!(message.contains("2 'hint' links"));
        assert!(message.contains("'publication'"));
        assert!(!status_link_https(&l).is_pass());
        assert!(!status_link_type(&l).is_pass());
        assert!(!publication_link_type(&l).is_pass());
    }

    fn status(links: serde_json::Value) -> StatusDocument {
        StatusDocument::from_value(json!({
            "status": "ready",
            "message": "",
            "updated": {"license": "2024-01-01T00:00:00Z", "status": "2024-01-01T00:00:00Z"},
            "links": links
        }))
        .unwrap()
    }

    #[test]
    fn test_license_link_accepts_both_spellings() {
        for t in [mime::LICENSE, mime::LICENSE_LEGACY] {
            let s = status(json!([{"rel": "license", "href": "https://l.example/x", "type": t}]));
            assert!(license_link(&s).is_pass(), "{t}");
        }
        let s = status(json!([{"rel": "license", "href": "http://l.example/x", "type": mime::LICENSE}]));
        assert!(!license_link(&s).is_pass());
        let s = status(json!([]));
        assert!(!license_link(&s).is_pass());
    }

    #[test]
    fn test_operation_links() {
        let s = status(json!([
            {"rel": "register", "href": "https://s.example/r{?id,name}", "templated": true,
             "type": mime::STATUS},
            {"rel": "return", "href": "https://s.example/ret", "type": mime::STATUS}
        ]));
        assert!(operation_link(&s, Operation::Register).is_pass());
        assert!(operation_link(&s, Operation::Renew).is_pass());
        assert!(!operation_link(&s, Operation::Return).is_pass());
    }
}
