//! Operation extraction.
//!
//! Walks `paths` in document order and, within each path item, the HTTP methods in canonical
//! order (see [`HttpMethod`]), producing one [`Operation`] per (path, method) pair.

use crate::model::{HttpMethod, Operation, RawParameter};
use crate::resolver::LocalResolver;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static NON_ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex is valid"));

/// Extract every operation from a validated document.
#[must_use]
pub fn extract_operations(doc: &Value) -> Vec<Operation> {
    let resolver = LocalResolver::new(doc);
    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut operations = Vec::new();
    for (path, path_item) in paths {
        if path.starts_with("x-") {
            continue;
        }
        let path_item = match resolver.resolve_value(path_item) {
            Ok(Value::Object(item)) => item,
            Ok(_) => {
                tracing::warn!(path = %path, "Skipping path: path item is not a mapping");
                continue;
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Skipping path: unresolvable path item");
                continue;
            }
        };

        let shared_params = parameter_list(path_item.get("parameters"), true);

        for method in HttpMethod::ALL {
            let Some(raw_op) = path_item.get(method.key()) else {
                continue;
            };
            let empty = Map::new();
            let op = raw_op.as_object().unwrap_or_else(|| {
                tracing::warn!(
                    method = %method,
                    path = %path,
                    "Operation is not a mapping; emitting it without parameters"
                );
                &empty
            });
            operations.push(build_operation(method, path, op, &shared_params));
        }
    }

    tracing::debug!(count = operations.len(), "Extracted operations");
    operations
}

fn build_operation(
    method: HttpMethod,
    path: &str,
    op: &Map<String, Value>,
    shared_params: &[RawParameter],
) -> Operation {
    let explicit = op
        .get("operationId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let mut parameters = shared_params.to_vec();
    parameters.extend(parameter_list(op.get("parameters"), false));

    Operation {
        method,
        path: path.to_string(),
        operation_id: explicit.map_or_else(|| derive_operation_id(method, path), str::to_string),
        explicit_id: explicit.is_some(),
        summary: non_empty_str(op.get("summary")),
        description: non_empty_str(op.get("description")),
        deprecated: op
            .get("deprecated")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        tags: op
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        parameters,
        request_body: op.get("requestBody").cloned(),
        security: op.get("security").map(security_scheme_names),
    }
}

fn parameter_list(value: Option<&Value>, from_path_item: bool) -> Vec<RawParameter> {
    value
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .map(|p| RawParameter {
                    value: p.clone(),
                    from_path_item,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Derive an operation id from method + path: `GET /users/{id}` → `get-users-id`.
#[must_use]
pub fn derive_operation_id(method: HttpMethod, path: &str) -> String {
    let raw = format!("{}-{}", method.key(), path.to_lowercase()).replace(['{', '}'], "");
    NON_ALNUM_RUN
        .replace_all(&raw, "-")
        .trim_matches('-')
        .to_string()
}

/// Scheme names referenced by a `security` requirement list, sorted and de-duplicated.
///
/// An empty list (explicit "no auth") stays empty.
#[must_use]
pub fn security_scheme_names(security: &Value) -> Vec<String> {
    let names: BTreeSet<&str> = security
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .flat_map(|req| req.keys().map(String::as_str))
        .collect();
    names.into_iter().map(str::to_string).collect()
}

/// Global security requirement of the document, if declared.
#[must_use]
pub fn global_security(doc: &Value) -> Option<Vec<String>> {
    doc.get("security").map(security_scheme_names)
}
