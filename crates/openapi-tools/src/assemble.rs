//! Config assembly: turns the extracted tools (or a spec-file pointer) into the final
//! [`McpServerConfig`] and its JSON text.

use crate::config::TranslatorSettings;
use crate::error::Result;
use crate::model::{McpServerConfig, RequiredVariable, ToolDescriptor};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const CONFIG_DATA_FLAG: &str = "--config-data";
pub const CONFIG_PATH_FLAG: &str = "--config-path";
pub const BASE_URL_FLAG: &str = "--base-url";

/// How the runtime gets at the tools of the generated server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerLaunch {
    /// Tools are extracted now and passed inline.
    EmbeddedTools {
        base_url: String,
        tools: Vec<ToolDescriptor>,
    },
    /// The runtime loads the spec file itself and reconverts lazily.
    SpecFileReference {
        spec_file_path: String,
        base_url: String,
    },
}

/// Inline runtime payload passed with `--config-data`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedRuntimeConfig<'a> {
    name: &'a str,
    base_url: &'a str,
    tools: &'a [ToolDescriptor],
}

impl ServerLaunch {
    fn runtime_args(&self, settings: &TranslatorSettings, server_name: &str) -> Result<Vec<String>> {
        let mut args = vec![settings.runtime_subcommand.clone()];
        match self {
            ServerLaunch::EmbeddedTools { base_url, tools } => {
                let payload = serde_json::to_string(&EmbeddedRuntimeConfig {
                    name: server_name,
                    base_url,
                    tools,
                })?;
                args.push(CONFIG_DATA_FLAG.to_string());
                args.push(payload);
            }
            ServerLaunch::SpecFileReference {
                spec_file_path,
                base_url,
            } => {
                args.extend([
                    CONFIG_PATH_FLAG.to_string(),
                    spec_file_path.clone(),
                    BASE_URL_FLAG.to_string(),
                    base_url.clone(),
                ]);
            }
        }
        Ok(args)
    }
}

/// Build the server config. `env` carries each required variable as its own placeholder.
///
/// # Errors
///
/// Returns an error if the embedded tool payload cannot be serialized.
pub fn assemble_config(
    settings: &TranslatorSettings,
    server_name: &str,
    description: String,
    launch: &ServerLaunch,
    variables: &[RequiredVariable],
) -> Result<McpServerConfig> {
    let env: BTreeMap<String, String> = variables
        .iter()
        .map(|v| (v.name.clone(), v.placeholder()))
        .collect();

    Ok(McpServerConfig {
        name: server_name.to_string(),
        description,
        command: settings.runtime_command.clone(),
        args: launch.runtime_args(settings, server_name)?,
        env,
    })
}

/// `info.description`, else `info.title`, else a generated default.
#[must_use]
pub fn server_description(doc: &Value, tool_count: usize) -> String {
    let info = doc.get("info");
    ["description", "title"]
        .iter()
        .filter_map(|key| info.and_then(|i| i.get(*key)).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map_or_else(
            || format!("OpenAPI MCP server with {tool_count} tools"),
            str::to_string,
        )
}

/// Pretty JSON with a trailing newline; key order is fixed by struct and map ordering.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_config(config: &McpServerConfig) -> Result<String> {
    let mut json = serde_json::to_string_pretty(config)?;
    json.push('\n');
    Ok(json)
}
