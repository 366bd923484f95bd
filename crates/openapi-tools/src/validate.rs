//! Structural validation of `OpenAPI` documents.
//!
//! Only the top-level shape is checked here: a parseable mapping with a 3.x `openapi` version,
//! an `info` mapping and a `paths` mapping. Vendor extensions and questionable schemas are left
//! alone; the parameter mapper degrades what it cannot understand instead of rejecting it.

use crate::error::ValidationError;
use serde_json::Value;

/// Check that `spec_text` is a structurally usable `OpenAPI` 3.x document (JSON or YAML).
///
/// A document with an empty `paths` mapping passes: that is a conversion error, not a
/// validation error.
///
/// # Errors
///
/// Returns every violation found.
pub fn validate(spec_text: &str) -> Result<(), ValidationError> {
    parse_document(spec_text).map(|_| ())
}

/// Parse and validate, returning the document as an order-preserving JSON value.
pub(crate) fn parse_document(spec_text: &str) -> Result<Value, ValidationError> {
    // JSON is a valid subset of YAML, so serde_yaml alone is enough.
    let doc: Value = serde_yaml::from_str(spec_text).map_err(|e| {
        ValidationError::single(format!("document is not valid JSON or YAML: {e}"))
    })?;

    let Some(root) = doc.as_object() else {
        return Err(ValidationError::single(format!(
            "document must be a mapping at the top level, found {}",
            kind_of(&doc)
        )));
    };

    let mut violations = Vec::new();

    match root.get("openapi") {
        None if root.contains_key("swagger") => violations.push(
            "Swagger 2.0 documents are not supported (missing 'openapi' field; convert to OpenAPI 3.x)"
                .to_string(),
        ),
        None => violations.push("missing required field 'openapi'".to_string()),
        Some(v) => match version_string(v) {
            None => violations.push(format!(
                "field 'openapi' must be a version string, found {}",
                kind_of(v)
            )),
            Some(version) if major_version(&version) != Some(3) => violations.push(format!(
                "unsupported OpenAPI version '{version}' (expected 3.x)"
            )),
            Some(_) => {}
        },
    }

    match root.get("info") {
        None => violations.push("missing required field 'info'".to_string()),
        Some(v) if !v.is_object() => violations.push(format!(
            "field 'info' must be a mapping, found {}",
            kind_of(v)
        )),
        Some(_) => {}
    }

    match root.get("paths") {
        None => violations.push("missing required field 'paths'".to_string()),
        Some(v) if !v.is_object() => violations.push(format!(
            "field 'paths' must be a mapping, found {}",
            kind_of(v)
        )),
        Some(_) => {}
    }

    if violations.is_empty() {
        Ok(doc)
    } else {
        Err(ValidationError::new(violations))
    }
}

/// YAML turns an unquoted `openapi: 3.1` into a float, so numbers are accepted too.
fn version_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn major_version(version: &str) -> Option<u64> {
    version.split('.').next()?.parse().ok()
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
