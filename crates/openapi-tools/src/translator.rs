//! The conversion pipeline: validate, extract, name, map, assemble.

use crate::assemble::{ServerLaunch, assemble_config, serialize_config, server_description};
use crate::base_url::resolve_base_url;
use crate::config::{ConvertOptions, TranslatorSettings};
use crate::error::{ConvertError, Result, ValidationError};
use crate::model::{DegradedField, McpServerConfig, Operation, RequiredVariable, ToolDescriptor};
use crate::naming::{ToolNameAllocator, generate_file_name};
use crate::operations::{extract_operations, global_security};
use crate::parameters::map_operation_input;
use crate::resolver::LocalResolver;
use crate::validate::parse_document;
use crate::variables::{has_unresolved_variables, scan_template_variables};
use sha2::{Digest, Sha256};

/// Stateless OpenAPI → MCP server config translator.
///
/// Holds only immutable [`TranslatorSettings`], so one instance can be shared freely across
/// threads.
#[derive(Debug, Clone, Default)]
pub struct OpenApiTranslator {
    settings: TranslatorSettings,
}

/// Everything one conversion produced.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub config: McpServerConfig,
    /// Serialized form of `config`; byte-identical for identical inputs.
    pub config_json: String,
    pub file_name: String,
    pub required_variables: Vec<RequiredVariable>,
    pub warnings: Vec<DegradedField>,
    pub tool_count: usize,
    /// `sha256:<hex>` of the raw spec text.
    pub spec_digest: String,
}

impl Conversion {
    /// Whether the artifact needs template variable resolution before activation.
    #[must_use]
    pub fn needs_variables(&self) -> bool {
        !self.required_variables.is_empty() || has_unresolved_variables(&self.config_json)
    }
}

impl OpenApiTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(settings: TranslatorSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &TranslatorSettings {
        &self.settings
    }

    /// Structural pre-check, callable on its own before [`Self::convert`].
    ///
    /// # Errors
    ///
    /// Returns every structural violation found in the document.
    pub fn validate(&self, spec_text: &str) -> std::result::Result<(), ValidationError> {
        crate::validate::validate(spec_text)
    }

    /// Convert a spec into the serialized server config.
    ///
    /// # Errors
    ///
    /// See [`Self::convert_detailed`].
    pub fn convert(&self, spec_text: &str, options: &ConvertOptions) -> Result<String> {
        self.convert_detailed(spec_text, options)
            .map(|c| c.config_json)
    }

    /// Convert a spec and return the config together with its metadata.
    ///
    /// # Errors
    ///
    /// - [`ConvertError::Validation`] when the document is malformed
    /// - [`ConvertError::NoPaths`] when it declares no operations
    /// - [`ConvertError::NoBaseUrl`] / [`ConvertError::InvalidBaseUrl`] when no usable base URL
    ///   can be resolved
    pub fn convert_detailed(&self, spec_text: &str, options: &ConvertOptions) -> Result<Conversion> {
        let doc = parse_document(spec_text)?;
        let required_variables = scan_template_variables(spec_text);

        let operations = extract_operations(&doc);
        if operations.is_empty() {
            return Err(ConvertError::NoPaths);
        }

        let base_url = resolve_base_url(&doc, &options.base_url)?;
        let server_name = match options.server_name.trim() {
            "" => self.settings.default_server_name.as_str(),
            name => name,
        };

        let resolver = LocalResolver::new(&doc);
        let global = global_security(&doc);
        let mut allocator =
            ToolNameAllocator::new(&options.tool_name_prefix, self.settings.max_tool_name_len);
        let mut warnings = Vec::new();
        let tools: Vec<ToolDescriptor> = operations
            .iter()
            .map(|op| {
                let name = allocator.allocate(&op.operation_id);
                let mapped = map_operation_input(&resolver, &name, op);
                warnings.extend(mapped.degraded);
                tracing::debug!(
                    tool = %name,
                    method = %op.method,
                    path = %op.path,
                    fields = mapped.fields.len(),
                    "Mapped operation"
                );
                ToolDescriptor {
                    description: tool_description(op),
                    method: op.method,
                    path: op.path.clone(),
                    base_url: base_url.clone(),
                    operation_id: op.operation_id.clone(),
                    input_schema: mapped.fields,
                    security: op.security.clone().or_else(|| global.clone()),
                    deprecated: op.deprecated,
                    name,
                }
            })
            .collect();
        let tool_count = tools.len();

        let launch = match options.spec_file_reference() {
            Some(path) => ServerLaunch::SpecFileReference {
                spec_file_path: path.to_string(),
                base_url,
            },
            None => ServerLaunch::EmbeddedTools { base_url, tools },
        };

        let config = assemble_config(
            &self.settings,
            server_name,
            server_description(&doc, tool_count),
            &launch,
            &required_variables,
        )?;
        let config_json = serialize_config(&config)?;

        tracing::info!(
            server = %server_name,
            tools = tool_count,
            degraded = warnings.len(),
            variables = required_variables.len(),
            "Converted OpenAPI document"
        );

        Ok(Conversion {
            file_name: generate_file_name(server_name),
            config,
            config_json,
            required_variables,
            warnings,
            tool_count,
            spec_digest: spec_digest(spec_text),
        })
    }
}

/// Summary, else description, else a generated `Calls METHOD /path`.
fn tool_description(op: &Operation) -> String {
    op.summary
        .clone()
        .or_else(|| op.description.clone())
        .unwrap_or_else(|| format!("Calls {} {}", op.method, op.path))
}

/// `sha256:<hex>` digest of the raw spec text.
#[must_use]
pub fn spec_digest(spec_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(spec_text.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const SPEC: &str = r#"
openapi: 3.0.3
info:
  title: Pets
servers:
  - url: https://pets.example/v1
security:
  - apiKey: []
paths:
  /pets:
    get:
      summary: List pets
      operationId: listPets
    post:
      security: []
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                name: {type: string}
  /pets/{id}:
    get:
      operationId: list_pets
      deprecated: true
      parameters:
        - {name: id, in: path, schema: {type: integer}}
"#;

    fn embedded_tools(conversion: &Conversion) -> Vec<Value> {
        let payload: Value = serde_json::from_str(&conversion.config.args[2]).unwrap();
        payload["tools"].as_array().unwrap().clone()
    }

    #[test]
    fn converts_every_operation_into_a_tool() {
        let translator = OpenApiTranslator::new();
        let conversion = translator
            .convert_detailed(SPEC, &ConvertOptions::new("pets"))
            .unwrap();

        assert_eq!(conversion.tool_count, 3);
        assert_eq!(conversion.file_name, "pets-openapi-mcp.json");
        assert_eq!(conversion.config.description, "Pets");
        assert!(conversion.warnings.is_empty());
        assert!(!conversion.needs_variables());
        assert!(conversion.spec_digest.starts_with("sha256:"));

        let tools = embedded_tools(&conversion);
        assert_eq!(tools[0]["name"], "listpets");
        assert_eq!(tools[0]["description"], "List pets");
        assert_eq!(tools[0]["security"], serde_json::json!(["apiKey"]));
        assert_eq!(tools[1]["name"], "post-pets");
        assert_eq!(tools[1]["description"], "Calls POST /pets");
        assert_eq!(tools[1]["security"], serde_json::json!([]));
        assert_eq!(tools[1]["inputSchema"]["body"]["in"], "body");
        assert_eq!(tools[2]["name"], "list_pets");
        assert_eq!(tools[2]["deprecated"], true);
        assert_eq!(tools[2]["inputSchema"]["id"]["required"], true);
    }

    #[test]
    fn blank_server_name_uses_the_default() {
        let conversion = OpenApiTranslator::new()
            .convert_detailed(SPEC, &ConvertOptions::default())
            .unwrap();
        assert_eq!(conversion.config.name, "openapi-server");
        assert_eq!(conversion.file_name, "openapi-server-openapi-mcp.json");
    }

    #[test]
    fn spec_file_reference_skips_embedding() {
        let options = ConvertOptions::new("pets")
            .with_base_url("https://staging.example")
            .with_spec_file_path("environments/dev/pets.openapi.json");
        let conversion = OpenApiTranslator::new()
            .convert_detailed(SPEC, &options)
            .unwrap();
        assert_eq!(
            conversion.config.args,
            vec![
                "openapi-runtime",
                "--config-path",
                "environments/dev/pets.openapi.json",
                "--base-url",
                "https://staging.example",
            ]
        );
        assert_eq!(conversion.tool_count, 3);
    }

    #[test]
    fn translator_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OpenApiTranslator>();
    }

    #[test]
    fn digest_is_stable() {
        assert_eq!(spec_digest("abc"), spec_digest("abc"));
        assert_eq!(
            spec_digest(""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
