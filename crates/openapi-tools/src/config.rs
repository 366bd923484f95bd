use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_NAME: &str = "openapi-server";
pub const DEFAULT_RUNTIME_COMMAND: &str = "stn";
pub const DEFAULT_RUNTIME_SUBCOMMAND: &str = "openapi-runtime";
pub const DEFAULT_MAX_TOOL_NAME_LEN: usize = 64;
pub const DEFAULT_MAX_SPEC_BYTES: usize = 10 * 1024 * 1024;

/// Per-call options for one conversion.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Name of the generated server. Empty means the configured default.
    #[serde(default)]
    pub server_name: String,

    /// Prefix prepended to every tool name. May be empty.
    #[serde(default)]
    pub tool_name_prefix: String,

    /// Override base URL from spec. Empty means "use the first declared server".
    #[serde(default)]
    pub base_url: String,

    /// Path of the spec file the runtime should load lazily instead of embedded tools.
    #[serde(default)]
    pub spec_file_path: Option<String>,
}

impl ConvertOptions {
    #[must_use]
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tool_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tool_name_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_spec_file_path(mut self, path: impl Into<String>) -> Self {
        self.spec_file_path = Some(path.into());
        self
    }

    /// The spec-file reference, if one was supplied. Blank strings count as absent.
    #[must_use]
    pub fn spec_file_reference(&self) -> Option<&str> {
        self.spec_file_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Settings shared by every conversion made through one translator.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslatorSettings {
    /// Command the agent runtime executes to launch the generated server.
    pub runtime_command: String,

    /// First argument passed to `runtime_command`.
    pub runtime_subcommand: String,

    /// Server name used when the caller leaves it empty.
    pub default_server_name: String,

    /// Upper bound on generated tool name length (including collision suffixes).
    pub max_tool_name_len: usize,

    /// Callers reject spec documents larger than this before converting.
    pub max_spec_bytes: usize,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            runtime_command: DEFAULT_RUNTIME_COMMAND.to_string(),
            runtime_subcommand: DEFAULT_RUNTIME_SUBCOMMAND.to_string(),
            default_server_name: DEFAULT_SERVER_NAME.to_string(),
            max_tool_name_len: DEFAULT_MAX_TOOL_NAME_LEN,
            max_spec_bytes: DEFAULT_MAX_SPEC_BYTES,
        }
    }
}
