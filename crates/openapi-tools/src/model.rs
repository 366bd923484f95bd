//! Data types flowing through the translator.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP methods an `OpenAPI` path item can declare.
///
/// Variant order is the canonical extraction order: GET, POST, PUT, PATCH, DELETE, then the
/// remaining methods alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    /// Path-item key for this method (`get`, `post`, ...).
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (path, method) pair extracted from the document.
///
/// Parameters and the request body are kept as raw JSON values; the parameter mapper
/// deserializes them one by one so that a single malformed entry only degrades itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub method: HttpMethod,
    /// Path template (e.g., /pet/{petId})
    pub path: String,
    /// Explicit `operationId`, or one derived from method + path.
    pub operation_id: String,
    /// Whether `operation_id` came from the document.
    pub explicit_id: bool,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    pub tags: Vec<String>,
    /// Path-item level parameters followed by operation-level ones, unresolved.
    pub parameters: Vec<RawParameter>,
    pub request_body: Option<Value>,
    /// Operation-level security override. `Some(vec![])` explicitly disables auth.
    pub security: Option<Vec<String>>,
}

/// A parameter entry exactly as declared, tagged with the level it was declared at.
#[derive(Debug, Clone, PartialEq)]
pub struct RawParameter {
    pub value: Value,
    pub from_path_item: bool,
}

/// Where a flattened input field is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLocation {
    Path,
    Query,
    Header,
    Body,
}

/// Coarse JSON type of an input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

/// One field of a tool's flattened input schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(rename = "in")]
    pub location: FieldLocation,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Original `OpenAPI` name, when the field had to be renamed to avoid a collision.
    #[serde(rename = "originalName", skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    /// Top-level properties of a simple object request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, BodyProperty>>,
}

/// A top-level property of a request body object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyProperty {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Flattened input schema of one tool, keyed by field name.
pub type InputSchema = BTreeMap<String, InputField>;

/// One callable tool derived from one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub method: HttpMethod,
    pub path: String,
    pub base_url: String,
    pub operation_id: String,
    pub input_schema: InputSchema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<String>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// A `{{ .Name }}` placeholder found in the raw spec text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequiredVariable {
    pub name: String,
}

impl RequiredVariable {
    /// The placeholder text a later synchronization step substitutes.
    #[must_use]
    pub fn placeholder(&self) -> String {
        format!("{{{{ .{} }}}}", self.name)
    }
}

/// A parameter or body that fell back to opaque typing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradedField {
    pub tool: String,
    pub field: String,
    pub location: Option<FieldLocation>,
    pub reason: String,
}

/// The generated MCP server config artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McpServerConfig {
    pub name: String,
    pub description: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_order_is_canonical() {
        let mut methods = vec![
            HttpMethod::Trace,
            HttpMethod::Delete,
            HttpMethod::Head,
            HttpMethod::Get,
            HttpMethod::Options,
            HttpMethod::Patch,
            HttpMethod::Put,
            HttpMethod::Post,
        ];
        methods.sort();
        assert_eq!(methods, HttpMethod::ALL.to_vec());
    }

    #[test]
    fn placeholder_round_trips_through_the_marker() {
        let var = RequiredVariable {
            name: "API_KEY".to_string(),
        };
        assert_eq!(var.placeholder(), "{{ .API_KEY }}");
    }
}
