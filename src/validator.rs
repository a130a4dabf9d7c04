//! Structural validation of schema documents against a meta-schema
//!
//! A document naming a meta-schema through `$schema` is checked against that
//! meta-schema, downloaded on demand. Anything else is checked against the bundled
//! JSON Schema draft-07 meta-schema.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use crate::config::SchemaDocument;
use crate::registry::{RegistryClient, RegistryError};

const DEFAULT_META_SCHEMA: &str = include_str!("meta/draft-07.json");

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("could not fetch the meta-schema {uri}: {source}")]
    MetaSchemaUnavailable {
        uri: String,
        source: RegistryError,
    },

    #[error("the meta-schema cannot be used for validation: {0}")]
    InvalidMetaSchema(String),

    #[error("$schema must be a URI string, found {0}")]
    InvalidSchemaRef(Value),

    #[error("validation was interrupted: {0}")]
    Interrupted(String),
}

/// Outcome of a structural check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub ok: bool,
    /// One line per violation, `<instance path>: <message>`
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn valid() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
        }
    }
}

fn default_meta_schema() -> Result<&'static Value, ValidationError> {
    static META: OnceLock<Result<Value, String>> = OnceLock::new();
    META.get_or_init(|| serde_json::from_str(DEFAULT_META_SCHEMA).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| ValidationError::InvalidMetaSchema(e.clone()))
}

/// Copy of `doc` without the keys the registry manages
fn working_copy(doc: &Value, keys: &[&str]) -> Value {
    let mut copy = doc.clone();
    if let Value::Object(map) = &mut copy {
        for key in keys {
            map.remove(*key);
        }
    }
    copy
}

/// Check `schema` against `meta_schema`, or against draft-07 when none is given
///
/// Neither document is modified: `$id` and `$schema` are removed from a copy of the
/// schema and `$schema` from a copy of the meta-schema before comparing them.
pub fn validate(
    schema: &SchemaDocument,
    meta_schema: Option<&Value>,
) -> Result<ValidationResult, ValidationError> {
    let instance = working_copy(schema, &["$id", "$schema"]);
    let meta = match meta_schema {
        Some(meta) => working_copy(meta, &["$schema"]),
        None => default_meta_schema()?.clone(),
    };

    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&meta)
        .map_err(|e| ValidationError::InvalidMetaSchema(e.to_string()))?;

    let result = match compiled.validate(&instance) {
        Ok(()) => ValidationResult::valid(),
        Err(errors) => ValidationResult {
            ok: false,
            errors: errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    let path = if path.is_empty() { "(root)".to_string() } else { path };
                    format!("{path}: {e}")
                })
                .collect(),
        },
    };
    Ok(result)
}

/// Resolve the meta-schema a document asks for, then validate it
///
/// Fetch failures are reported as [`ValidationError::MetaSchemaUnavailable`], separate
/// from a document that simply fails the check.
pub async fn validate_document(
    schema: &SchemaDocument,
    client: &RegistryClient,
) -> Result<ValidationResult, ValidationError> {
    let meta = match schema.get("$schema") {
        None => None,
        Some(Value::String(uri)) => {
            let meta = client
                .fetch_meta_schema(uri)
                .await
                .map_err(|source| ValidationError::MetaSchemaUnavailable {
                    uri: uri.clone(),
                    source,
                })?;
            Some(meta)
        }
        Some(other) => return Err(ValidationError::InvalidSchemaRef(other.clone())),
    };

    // remote $refs inside the meta-schema are resolved with blocking I/O
    let schema = schema.clone();
    tokio::task::spawn_blocking(move || validate(&schema, meta.as_ref()))
        .await
        .map_err(|e| ValidationError::Interrupted(e.to_string()))?
}
