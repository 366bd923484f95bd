//! Parameter mapping.
//!
//! Flattens path/query/header parameters and the request body of one operation into a single
//! input schema. Mapping is best-effort: a parameter or body that cannot be understood is kept
//! as an opaque `object` field and reported as a [`DegradedField`], never as an error.

use crate::model::{
    BodyProperty, DegradedField, FieldLocation, FieldType, InputField, InputSchema, Operation,
    RawParameter,
};
use crate::resolver::LocalResolver;
use mime::Mime;
use openapiv3::{
    MediaType, Parameter, ParameterData, ParameterSchemaOrContent, ReferenceOr, RequestBody,
    Schema, SchemaKind, Type,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Name of the single field a request body maps to.
pub const BODY_FIELD: &str = "body";

/// Nesting depth after which composite schemas stop being inspected.
const MAX_SCHEMA_DEPTH: usize = 8;

/// Flattened input of one operation plus the fields that fell back to opaque typing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedInput {
    pub fields: InputSchema,
    pub degraded: Vec<DegradedField>,
}

/// A field before its final (collision-free) name is chosen.
#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    location: FieldLocation,
    required: bool,
    field_type: FieldType,
    description: Option<String>,
    default: Option<Value>,
    properties: Option<BTreeMap<String, BodyProperty>>,
    degraded: Option<String>,
}

impl Candidate {
    fn opaque(name: String, location: FieldLocation, reason: String) -> Self {
        Self {
            name,
            location,
            required: location == FieldLocation::Path,
            field_type: FieldType::Object,
            description: None,
            default: None,
            properties: None,
            degraded: Some(reason),
        }
    }
}

/// Map every parameter and the request body of `operation` for the tool named `tool_name`.
#[must_use]
pub fn map_operation_input(
    resolver: &LocalResolver<'_>,
    tool_name: &str,
    operation: &Operation,
) -> MappedInput {
    let mut out = MappedInput::default();
    let mut unnamed = Vec::new();

    let mut candidates = merge_parameters(resolver, &operation.parameters, &mut unnamed);
    if let Some(body) = &operation.request_body {
        candidates.push(map_request_body(resolver, body));
    }

    for reason in unnamed {
        out.degraded.push(degraded(tool_name, "<unnamed>", None, reason));
    }

    let mut names: HashSet<String> = HashSet::new();
    for c in candidates {
        let field_name = reserve_field_name(&mut names, &c.name);
        if let Some(reason) = c.degraded {
            out.degraded
                .push(degraded(tool_name, &field_name, Some(c.location), reason));
        }
        let original_name = (field_name != c.name).then(|| c.name.clone());
        out.fields.insert(
            field_name,
            InputField {
                field_type: c.field_type,
                location: c.location,
                required: c.required,
                description: c.description,
                default: c.default,
                original_name,
                properties: c.properties,
            },
        );
    }

    out
}

fn degraded(
    tool: &str,
    field: &str,
    location: Option<FieldLocation>,
    reason: String,
) -> DegradedField {
    tracing::warn!(
        tool = %tool,
        field = %field,
        reason = %reason,
        "Field degraded to opaque object"
    );
    DegradedField {
        tool: tool.to_string(),
        field: field.to_string(),
        location,
        reason,
    }
}

/// Resolve parameters, letting operation-level entries replace path-item entries with the
/// same `(in, name)`.
fn merge_parameters(
    resolver: &LocalResolver<'_>,
    raw_params: &[RawParameter],
    unnamed: &mut Vec<String>,
) -> Vec<Candidate> {
    let mut merged: Vec<Candidate> = Vec::new();
    let mut index: HashMap<(FieldLocation, String), usize> = HashMap::new();

    for raw in raw_params {
        let Some(candidate) = map_parameter(resolver, &raw.value, unnamed) else {
            continue;
        };
        let key = (candidate.location, candidate.name.clone());
        match index.get(&key).copied() {
            Some(i) if !raw.from_path_item => merged[i] = candidate,
            Some(_) => {}
            None => {
                index.insert(key, merged.len());
                merged.push(candidate);
            }
        }
    }

    merged
}

fn map_parameter(
    resolver: &LocalResolver<'_>,
    raw: &Value,
    unnamed: &mut Vec<String>,
) -> Option<Candidate> {
    let param = match resolver.resolve_as::<Parameter>(raw) {
        Ok(p) => p,
        Err(e) => return degraded_parameter(resolver, raw, &e.to_string(), unnamed),
    };

    let (data, location) = match &param {
        Parameter::Path { parameter_data, .. } => (parameter_data, FieldLocation::Path),
        Parameter::Query { parameter_data, .. } => (parameter_data, FieldLocation::Query),
        Parameter::Header { parameter_data, .. } => (parameter_data, FieldLocation::Header),
        Parameter::Cookie { parameter_data, .. } => {
            tracing::debug!(parameter = %parameter_data.name, "Skipping cookie parameter");
            return None;
        }
    };

    Some(parameter_candidate(resolver, data, location))
}

fn parameter_candidate(
    resolver: &LocalResolver<'_>,
    data: &ParameterData,
    location: FieldLocation,
) -> Candidate {
    let required = location == FieldLocation::Path || data.required;

    let schema = match &data.format {
        ParameterSchemaOrContent::Schema(s) => {
            resolver.resolve_reference_or(s).map_err(|e| e.to_string())
        }
        ParameterSchemaOrContent::Content(content) => content
            .values()
            .find_map(|mt| mt.schema.as_ref())
            .ok_or_else(|| "parameter content declares no schema".to_string())
            .and_then(|s| resolver.resolve_reference_or(s).map_err(|e| e.to_string())),
    };

    let mut candidate = match schema {
        Ok(schema) => {
            let (field_type, degraded) = match coarse_type(resolver, &schema, 0) {
                Ok(t) => (t, None),
                Err(reason) => (FieldType::Object, Some(reason)),
            };
            Candidate {
                name: data.name.clone(),
                location,
                required,
                field_type,
                description: schema.schema_data.description.clone(),
                default: schema.schema_data.default.clone(),
                properties: None,
                degraded,
            }
        }
        Err(reason) => Candidate::opaque(data.name.clone(), location, reason),
    };
    candidate.required = required;
    // The parameter's own description beats the schema's.
    if let Some(desc) = non_empty(data.description.as_deref()) {
        candidate.description = Some(desc);
    }
    candidate
}

/// Keep whatever can still be read from a parameter that failed to deserialize.
fn degraded_parameter(
    resolver: &LocalResolver<'_>,
    raw: &Value,
    reason: &str,
    unnamed: &mut Vec<String>,
) -> Option<Candidate> {
    let resolved = resolver.resolve_value(raw).unwrap_or(raw);
    let Some(name) = resolved.get("name").and_then(Value::as_str) else {
        unnamed.push(format!("parameter without a usable name: {reason}"));
        return None;
    };
    let location = match resolved.get("in").and_then(Value::as_str) {
        Some("path") => FieldLocation::Path,
        Some("header") => FieldLocation::Header,
        Some("cookie") => return None,
        _ => FieldLocation::Query,
    };

    let mut candidate =
        Candidate::opaque(name.to_string(), location, format!("malformed parameter: {reason}"));
    candidate.required = location == FieldLocation::Path
        || resolved
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
    candidate.description = non_empty(resolved.get("description").and_then(Value::as_str));
    candidate.default = resolved
        .get("schema")
        .and_then(|s| s.get("default"))
        .cloned();
    Some(candidate)
}

fn map_request_body(resolver: &LocalResolver<'_>, raw: &Value) -> Candidate {
    let body = match resolver.resolve_as::<RequestBody>(raw) {
        Ok(b) => b,
        Err(e) => {
            let mut c = Candidate::opaque(
                BODY_FIELD.to_string(),
                FieldLocation::Body,
                format!("malformed request body: {e}"),
            );
            c.required = resolver
                .resolve_value(raw)
                .ok()
                .and_then(|v| v.get("required"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            return c;
        }
    };

    let mut candidate = Candidate::opaque(BODY_FIELD.to_string(), FieldLocation::Body, String::new());
    candidate.required = body.required;
    candidate.description = non_empty(body.description.as_deref());

    let Some((media_type, mt)) = select_media_type(&body) else {
        candidate.degraded = Some("request body declares no content".to_string());
        return candidate;
    };
    let Some(schema_ref) = mt.schema.as_ref() else {
        candidate.degraded = Some(format!("request body '{media_type}' declares no schema"));
        return candidate;
    };
    let schema = match resolver.resolve_reference_or(schema_ref) {
        Ok(s) => s,
        Err(e) => {
            candidate.degraded = Some(format!("request body schema: {e}"));
            return candidate;
        }
    };

    if candidate.description.is_none() {
        candidate.description = non_empty(schema.schema_data.description.as_deref());
    }
    candidate.default = schema.schema_data.default.clone();

    match object_properties(resolver, &schema, 0) {
        Some(props) => {
            candidate.degraded = None;
            candidate.properties = (!props.is_empty()).then_some(props);
        }
        None => {
            candidate.degraded = Some(format!(
                "request body '{media_type}' is not a simple object schema"
            ));
        }
    }
    candidate
}

/// Prefer `application/json`, then any other JSON media type, then the first declared one.
fn select_media_type(body: &RequestBody) -> Option<(&str, &MediaType)> {
    let parsed: Vec<(&str, Option<Mime>, &MediaType)> = body
        .content
        .iter()
        .map(|(k, v)| (k.as_str(), k.parse::<Mime>().ok(), v))
        .collect();

    let exact = parsed
        .iter()
        .find(|(_, m, _)| m.as_ref().is_some_and(|m| m.essence_str() == "application/json"));
    let jsonish = || {
        parsed.iter().find(|(k, m, _)| match m {
            Some(m) => m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON),
            None => k.to_ascii_lowercase().contains("json"),
        })
    };

    exact
        .or_else(jsonish)
        .or_else(|| parsed.first())
        .map(|(k, _, v)| (*k, *v))
}

/// Top-level properties when `schema` is a simple object (or an `allOf` of simple objects).
fn object_properties(
    resolver: &LocalResolver<'_>,
    schema: &Schema,
    depth: usize,
) -> Option<BTreeMap<String, BodyProperty>> {
    if depth > MAX_SCHEMA_DEPTH {
        return None;
    }
    match &schema.schema_kind {
        SchemaKind::Type(Type::Object(obj)) => {
            Some(map_properties(resolver, &obj.properties, &obj.required))
        }
        SchemaKind::Any(any) if !any.properties.is_empty() => {
            Some(map_properties(resolver, &any.properties, &any.required))
        }
        SchemaKind::AllOf { all_of } => {
            let mut merged = BTreeMap::new();
            for member in all_of {
                let member = resolver.resolve_reference_or(member).ok()?;
                merged.extend(object_properties(resolver, &member, depth + 1)?);
            }
            Some(merged)
        }
        _ => None,
    }
}

fn map_properties<'p>(
    resolver: &LocalResolver<'_>,
    properties: impl IntoIterator<Item = (&'p String, &'p ReferenceOr<Box<Schema>>)>,
    required: &[String],
) -> BTreeMap<String, BodyProperty> {
    properties
        .into_iter()
        .map(|(name, prop)| {
            let schema = resolver.resolve_reference_or(prop).ok();
            let field_type = schema
                .as_deref()
                .and_then(|s| coarse_type(resolver, s, 1).ok())
                .unwrap_or(FieldType::Object);
            let property = BodyProperty {
                field_type,
                required: required.contains(name),
                description: schema
                    .as_deref()
                    .and_then(|s| non_empty(s.schema_data.description.as_deref())),
                default: schema.as_deref().and_then(|s| s.schema_data.default.clone()),
            };
            (name.clone(), property)
        })
        .collect()
}

/// Coarse JSON type of a schema. Errors carry the reason the schema could not be typed.
fn coarse_type(
    resolver: &LocalResolver<'_>,
    schema: &Schema,
    depth: usize,
) -> Result<FieldType, String> {
    if depth > MAX_SCHEMA_DEPTH {
        return Err("schema nesting too deep".to_string());
    }
    match &schema.schema_kind {
        SchemaKind::Type(t) => Ok(match t {
            Type::String { .. } => FieldType::String,
            Type::Number { .. } => FieldType::Number,
            Type::Integer { .. } => FieldType::Integer,
            Type::Boolean { .. } => FieldType::Boolean,
            Type::Array { .. } => FieldType::Array,
            Type::Object { .. } => FieldType::Object,
        }),
        SchemaKind::Any(any) => match any.typ.as_deref() {
            Some(typ) => type_name(typ).ok_or_else(|| format!("unknown schema type '{typ}'")),
            None if !any.properties.is_empty() => Ok(FieldType::Object),
            None => Err("schema declares no type".to_string()),
        },
        SchemaKind::AllOf { all_of } => uniform_type(resolver, all_of, depth, "allOf"),
        SchemaKind::OneOf { one_of } => uniform_type(resolver, one_of, depth, "oneOf"),
        SchemaKind::AnyOf { any_of } => uniform_type(resolver, any_of, depth, "anyOf"),
        SchemaKind::Not { .. } => Err("'not' schemas are not supported".to_string()),
    }
}

/// A composite schema has a coarse type only when every member agrees on it.
fn uniform_type(
    resolver: &LocalResolver<'_>,
    members: &[ReferenceOr<Schema>],
    depth: usize,
    keyword: &str,
) -> Result<FieldType, String> {
    let mut found: Option<FieldType> = None;
    for member in members {
        let schema = resolver
            .resolve_reference_or(member)
            .map_err(|e| format!("{keyword} member: {e}"))?;
        let t = coarse_type(resolver, &schema, depth + 1)
            .map_err(|e| format!("{keyword} member: {e}"))?;
        match found {
            Some(prev) if prev != t => {
                return Err(format!("{keyword} members have mixed types"));
            }
            _ => found = Some(t),
        }
    }
    found.ok_or_else(|| format!("empty {keyword}"))
}

fn type_name(typ: &str) -> Option<FieldType> {
    match typ {
        "string" => Some(FieldType::String),
        "integer" => Some(FieldType::Integer),
        "number" => Some(FieldType::Number),
        "boolean" => Some(FieldType::Boolean),
        "array" => Some(FieldType::Array),
        "object" => Some(FieldType::Object),
        _ => None,
    }
}

fn reserve_field_name(names: &mut HashSet<String>, base: &str) -> String {
    let base = base.to_string();
    if names.insert(base.clone()) {
        return base;
    }

    let mut counter = 1;
    loop {
        let candidate = format!("{base}_{counter}");
        if names.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::extract_operations;
    use serde_json::json;

    fn map_first(doc: &Value) -> MappedInput {
        let ops = extract_operations(doc);
        let resolver = LocalResolver::new(doc);
        map_operation_input(&resolver, "tool", &ops[0])
    }

    #[test]
    fn flattens_path_query_and_header_parameters() {
        let doc = json!({
            "paths": {"/users/{id}": {"get": {"parameters": [
                {"name": "id", "in": "path", "schema": {"type": "integer"}},
                {"name": "limit", "in": "query", "description": "Page size",
                 "schema": {"type": "integer", "default": 20}},
                {"name": "X-Trace", "in": "header", "required": true, "schema": {"type": "string"}},
                {"name": "session", "in": "cookie", "schema": {"type": "string"}}
            ]}}}
        });
        let mapped = map_first(&doc);
        assert!(mapped.degraded.is_empty());
        assert_eq!(mapped.fields.len(), 3);

        let id = &mapped.fields["id"];
        assert_eq!(id.location, FieldLocation::Path);
        assert_eq!(id.field_type, FieldType::Integer);
        assert!(id.required, "path parameters are always required");

        let limit = &mapped.fields["limit"];
        assert!(!limit.required);
        assert_eq!(limit.description.as_deref(), Some("Page size"));
        assert_eq!(limit.default, Some(json!(20)));

        assert!(mapped.fields["X-Trace"].required);
        assert!(!mapped.fields.contains_key("session"));
    }

    #[test]
    fn operation_parameters_override_path_item_parameters() {
        let doc = json!({
            "paths": {"/items": {
                "parameters": [
                    {"name": "q", "in": "query", "description": "shared", "schema": {"type": "string"}},
                    {"name": "q", "in": "header", "schema": {"type": "string"}}
                ],
                "get": {"parameters": [
                    {"name": "q", "in": "query", "required": true, "schema": {"type": "integer"}}
                ]}
            }}
        });
        let mapped = map_first(&doc);
        let q = &mapped.fields["q"];
        assert_eq!(q.location, FieldLocation::Query);
        assert_eq!(q.field_type, FieldType::Integer);
        assert!(q.required);
        assert_eq!(q.description, None);

        let header = &mapped.fields["q_1"];
        assert_eq!(header.location, FieldLocation::Header);
        assert_eq!(header.original_name.as_deref(), Some("q"));
    }

    #[test]
    fn resolves_component_parameters_and_schemas() {
        let doc = json!({
            "components": {
                "parameters": {"Limit": {"name": "limit", "in": "query", "schema": {"$ref": "#/components/schemas/Count"}}},
                "schemas": {"Count": {"type": "integer", "description": "How many"}}
            },
            "paths": {"/x": {"get": {"parameters": [{"$ref": "#/components/parameters/Limit"}]}}}
        });
        let mapped = map_first(&doc);
        let limit = &mapped.fields["limit"];
        assert_eq!(limit.field_type, FieldType::Integer);
        assert_eq!(limit.description.as_deref(), Some("How many"));
    }

    #[test]
    fn composite_and_malformed_parameters_degrade() {
        let doc = json!({
            "paths": {"/x": {"get": {"parameters": [
                {"name": "mixed", "in": "query", "schema": {"oneOf": [{"type": "string"}, {"type": "integer"}]}},
                {"name": "same", "in": "query", "schema": {"anyOf": [{"type": "string"}, {"type": "string"}]}},
                {"name": "broken", "in": "path"},
                {"name": "dangling", "in": "query", "schema": {"$ref": "#/components/schemas/Nope"}},
                {"in": "query"}
            ]}}}
        });
        let mapped = map_first(&doc);

        assert_eq!(mapped.fields["mixed"].field_type, FieldType::Object);
        assert_eq!(mapped.fields["same"].field_type, FieldType::String);
        assert_eq!(mapped.fields["broken"].field_type, FieldType::Object);
        assert!(mapped.fields["broken"].required);
        assert_eq!(mapped.fields["dangling"].field_type, FieldType::Object);

        let degraded: Vec<&str> = mapped.degraded.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(degraded, vec!["<unnamed>", "mixed", "broken", "dangling"]);
        assert!(mapped.degraded.iter().all(|d| d.tool == "tool"));
    }

    #[test]
    fn json_object_body_carries_properties() {
        let doc = json!({
            "components": {"schemas": {"Pet": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string"},
                    "tag": {"type": "string", "default": "{{ .DEFAULT_TAG }}"},
                    "age": {"$ref": "#/components/schemas/Age"}
                }
            }, "Age": {"type": "integer"}}},
            "paths": {"/pets": {"post": {"requestBody": {
                "required": true,
                "content": {
                    "text/plain": {"schema": {"type": "string"}},
                    "application/json; charset=utf-8": {"schema": {"$ref": "#/components/schemas/Pet"}}
                }
            }}}}
        });
        let mapped = map_first(&doc);
        assert!(mapped.degraded.is_empty());

        let body = &mapped.fields[BODY_FIELD];
        assert_eq!(body.location, FieldLocation::Body);
        assert_eq!(body.field_type, FieldType::Object);
        assert!(body.required);

        let props = body.properties.as_ref().unwrap();
        assert!(props["name"].required);
        assert!(!props["tag"].required);
        assert_eq!(props["tag"].default, Some(json!("{{ .DEFAULT_TAG }}")));
        assert_eq!(props["age"].field_type, FieldType::Integer);
    }

    #[test]
    fn all_of_object_bodies_merge_properties() {
        let doc = json!({
            "paths": {"/x": {"put": {"requestBody": {"content": {"application/vnd.api+json": {"schema": {
                "allOf": [
                    {"type": "object", "properties": {"a": {"type": "string"}}},
                    {"type": "object", "required": ["b"], "properties": {"b": {"type": "boolean"}}}
                ]
            }}}}}}}
        });
        let mapped = map_first(&doc);
        let props = mapped.fields[BODY_FIELD].properties.as_ref().unwrap();
        assert_eq!(props.len(), 2);
        assert!(props["b"].required);
        assert!(!mapped.fields[BODY_FIELD].required);
    }

    #[test]
    fn non_object_bodies_are_opaque() {
        let doc = json!({
            "paths": {"/upload": {"post": {"requestBody": {"content": {
                "application/octet-stream": {"schema": {"type": "string", "format": "binary"}}
            }}}}}
        });
        let mapped = map_first(&doc);
        let body = &mapped.fields[BODY_FIELD];
        assert_eq!(body.field_type, FieldType::Object);
        assert!(body.properties.is_none());
        assert_eq!(mapped.degraded.len(), 1);
        assert_eq!(mapped.degraded[0].location, Some(FieldLocation::Body));
    }

    #[test]
    fn body_field_name_avoids_parameter_collisions() {
        let doc = json!({
            "paths": {"/x": {"post": {
                "parameters": [{"name": "body", "in": "query", "schema": {"type": "string"}}],
                "requestBody": {"content": {"application/json": {"schema": {"type": "object"}}}}
            }}}
        });
        let mapped = map_first(&doc);
        assert_eq!(mapped.fields["body"].location, FieldLocation::Query);
        let body = &mapped.fields["body_1"];
        assert_eq!(body.location, FieldLocation::Body);
        assert_eq!(body.original_name.as_deref(), Some("body"));
    }
}
