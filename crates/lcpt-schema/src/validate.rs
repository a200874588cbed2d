//! # Schema Validation
//!
//! Runtime validation of license and status documents against a JSON
//! Schema file. The draft is taken from the schema's `$schema` member;
//! `format` keywords (`date-time`, `uri`) are always asserted.
//!
//! ## Schema Resolution
//!
//! The published schemas reference each other (`link.schema.json` from
//! both the license and the status schema). Every `*.json` file in the root
//! schema's directory is indexed by filename and by `$id`, and `$ref`s are
//! resolved from that index. Unknown URIs resolve to the permissive `{}`
//! schema so that a missing optional reference never triggers a network
//! request.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;
use thiserror::Error;

/// Resolves `$ref` URIs to schemas read from disk.
struct LocalSchemaRetriever {
    /// Map from URI or bare filename to schema value.
    schemas_by_uri: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();

        if let Some(value) = self.schemas_by_uri.get(uri_str) {
            return Ok(value.clone());
        }

        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        if let Some(value) = self.schemas_by_uri.get(filename) {
            return Ok(value.clone());
        }

        tracing::debug!(uri = uri_str, "unresolved schema reference, using permissive schema");
        Ok(serde_json::json!({}))
    }
}

/// Error during schema loading or validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The document did not conform to the schema.
    #[error("{violations} (schema '{schema_name}')")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Every violation, in validator order.
        violations: ValidationViolations,
    },

    /// The schema file could not be loaded.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoadError {
        /// Schema filename or path.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The compiled validator could not be built (e.g., invalid schema).
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema filename or path.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },

    /// IO error reading a schema.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// The violations of a failed validation; empty for load errors.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::ValidationFailed { violations, .. } => violations.violations(),
            _ => &[],
        }
    }
}

/// A single validation violation with structured context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Non-empty collection of validation violations.
///
/// Displays as the first violation followed by a count of the rest.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// The violation reported first.
    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violations.split_first() {
            None => f.write_str("no violations"),
            Some((first, [])) => write!(f, "{first}"),
            Some((first, rest)) => write!(f, "{first} (and {} more)", rest.len()),
        }
    }
}

/// A compiled validator for one schema file.
///
/// Compilation happens once at construction; validation is then cheap and
/// the validator can be shared across scenarios.
pub struct SchemaValidator {
    /// Schema filename, used in error messages.
    name: String,
    /// Path the schema was loaded from, if any.
    path: Option<PathBuf>,
    validator: Validator,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Load and compile the schema at `path`.
    ///
    /// Sibling `*.json` files are loaded too and serve `$ref` resolution.
    ///
    /// # Errors
    ///
    /// `SchemaLoadError` if the file cannot be read or is not JSON,
    /// `ValidatorBuildError` if it is not a valid schema.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("schema")
            .to_string();
        let schema = read_json(path, &name)?;

        let mut siblings = HashMap::new();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            siblings = load_directory(dir)?;
        }

        let validator = build(&name, &schema, siblings)?;
        tracing::debug!(schema = %name, path = %path.display(), "schema compiled");
        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            validator,
        })
    }

    /// Compile an in-memory schema. `$ref`s to other files resolve to `{}`.
    pub fn from_value(name: &str, schema: &Value) -> Result<Self, SchemaError> {
        let validator = build(name, schema, HashMap::new())?;
        Ok(Self {
            name: name.to_string(),
            path: None,
            validator,
        })
    }

    /// Schema filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path the schema was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether `instance` conforms, without collecting violations.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate a parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::ValidationFailed` with every violation if the
    /// document is invalid.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaError> {
        let errors: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(schema = %self.name, count = errors.len(), "schema violations");
            Err(SchemaError::ValidationFailed {
                schema_name: self.name.clone(),
                violations: ValidationViolations { violations: errors },
            })
        }
    }
}

fn read_json(path: &Path, name: &str) -> Result<Value, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|e| SchemaError::SchemaLoadError {
        schema_name: name.to_string(),
        reason: format!("cannot read {}: {e}", path.display()),
    })?;
    serde_json::from_str(&content).map_err(|e| SchemaError::SchemaLoadError {
        schema_name: name.to_string(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Index every `*.json` file in `dir` by filename and by `$id`.
///
/// Files that are not valid JSON are skipped; only the root schema must
/// parse.
fn load_directory(dir: &Path) -> Result<HashMap<String, Value>, SchemaError> {
    let mut schemas_by_uri = HashMap::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !filename.ends_with(".json") {
            continue;
        }
        let filename = filename.to_string();
        match read_json(&path, &filename) {
            Ok(value) => {
                if let Some(id) = value.get("$id").and_then(|v| v.as_str()) {
                    schemas_by_uri.insert(id.to_string(), value.clone());
                }
                schemas_by_uri.insert(filename, value);
            }
            Err(e) => tracing::warn!(error = %e, "skipping sibling schema"),
        }
    }
    Ok(schemas_by_uri)
}

fn options(schemas_by_uri: HashMap<String, Value>) -> ValidationOptions {
    let mut opts = jsonschema::options();
    opts.should_validate_formats(true);
    opts.with_retriever(LocalSchemaRetriever { schemas_by_uri });
    opts
}

fn build(
    name: &str,
    schema: &Value,
    schemas_by_uri: HashMap<String, Value>,
) -> Result<Validator, SchemaError> {
    options(schemas_by_uri)
        .build(schema)
        .map_err(|e| SchemaError::ValidatorBuildError {
            schema_name: name.to_string(),
            reason: e.to_string(),
        })
}
