//! Integration test: schemas that reference each other through absolute
//! `$id` URIs, as the published LCP schemas do.

use lcpt_schema::{SchemaError, SchemaValidator};
use serde_json::json;

const BASE: &str = "https://readium.org/lcp-specs/schema/";

fn write(dir: &std::path::Path, name: &str, value: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path
}

fn license_schema_dir() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "link.schema.json",
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "$id": format!("{BASE}link.schema.json"),
            "type": "object",
            "required": ["rel", "href"],
            "properties": {
                "rel": {"type": "string"},
                "href": {"type": "string"},
                "templated": {"type": "boolean"}
            }
        }),
    );
    let license = write(
        dir.path(),
        "license.schema.json",
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "$id": format!("{BASE}license.schema.json"),
            "type": "object",
            "required": ["id", "issued", "provider", "links"],
            "properties": {
                "id": {"type": "string"},
                "issued": {"type": "string", "format": "date-time"},
                "provider": {"type": "string", "format": "uri"},
                "links": {
                    "type": "array",
                    "items": {"$ref": "link.schema.json"},
                    "minItems": 1
                },
                "rights": {
                    "type": "object",
                    "properties": {
                        "print": {"type": "integer", "minimum": 0},
                        "copy": {"type": "integer", "minimum": 0}
                    }
                }
            }
        }),
    );
    // Not JSON; indexing must skip it.
    std::fs::write(dir.path().join("notes.json"), "draft, do not use").unwrap();
    (dir, license)
}

#[test]
fn test_license_with_absolute_refs_validates() {
    let (_dir, path) = license_schema_dir();
    let validator = SchemaValidator::from_file(&path).unwrap();
    validator
        .validate(&json!({
            "id": "ef15e740-697f-11e3-949a-0800200c9a66",
            "issued": "2017-09-01T10:00:00+02:00",
            "provider": "https://provider.example",
            "links": [{"rel": "hint", "href": "https://provider.example/hint"}],
            "rights": {"print": 10, "copy": 2048}
        }))
        .unwrap();
}

#[test]
fn test_nested_link_violation_reported() {
    let (_dir, path) = license_schema_dir();
    let validator = SchemaValidator::from_file(&path).unwrap();
    let err = validator
        .validate(&json!({
            "id": "x",
            "issued": "2017-09-01T10:00:00Z",
            "provider": "https://provider.example",
            "links": [{"rel": "hint", "href": "https://provider.example/hint", "templated": "yes"}]
        }))
        .unwrap_err();
    match err {
        SchemaError::ValidationFailed { schema_name, violations } => {
            assert_eq!(schema_name, "license.schema.json");
            assert_eq!(violations.first().unwrap().instance_path, "/links/0/templated");
        }
        other => panic!("Expected ValidationFailed, got: {other}"),
    }
}

#[test]
fn test_negative_rights_rejected() {
    let (_dir, path) = license_schema_dir();
    let validator = SchemaValidator::from_file(&path).unwrap();
    let doc = json!({
        "id": "x",
        "issued": "2017-09-01T10:00:00Z",
        "provider": "https://provider.example",
        "links": [{"rel": "hint", "href": "h"}],
        "rights": {"print": -1}
    });
    assert!(!validator.is_valid(&doc));
    assert!(validator.validate(&doc).is_err());
}
