//! Schema conformance.

use lcpt_model::{License, StatusDocument};
use lcpt_schema::{SchemaError, SchemaValidator};

use crate::report::Outcome;

/// The license conforms to the license schema.
pub fn license_schema(license: &License, schema: &SchemaValidator) -> Outcome {
    schema_outcome(license.validate_schema(schema))
}

/// The status document conforms to the status schema.
pub fn status_schema(status: &StatusDocument, schema: &SchemaValidator) -> Outcome {
    schema_outcome(status.validate_schema(schema))
}

fn schema_outcome(result: Result<(), SchemaError>) -> Outcome {
    match result {
        Ok(()) => Outcome::Pass,
        Err(e @ SchemaError::ValidationFailed { .. }) => Outcome::fail(e.to_string()),
        Err(e) => Outcome::error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaValidator {
        SchemaValidator::from_value(
            "license.schema.json",
            &json!({
                "type": "object",
                "required": ["id", "issued"],
                "properties": {"issued": {"type": "string", "format": "date-time"}}
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_license_schema() {
        let ok = License::from_value(json!({"id": "a", "issued": "2024-01-01T00:00:00Z"})).unwrap();
        assert!(license_schema(&ok, &schema()).is_pass());

        let missing = License::from_value(json!({"id": "a"})).unwrap();
        assert!(matches!(license_schema(&missing, &schema()), Outcome::Fail { .. }));

        let bad_date = License::from_value(json!({"id": "a", "issued": "yesterday"})).unwrap();
        assert!(matches!(license_schema(&bad_date, &schema()), Outcome::Fail { .. }));
    }
}
