//! Tool names and artifact file names.

use crate::config::DEFAULT_SERVER_NAME;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const CONFIG_FILE_SUFFIX: &str = "-openapi-mcp";
pub const SPEC_FILE_SUFFIX: &str = ".openapi.json";

const MIN_TOOL_NAME_LEN: usize = 8;

static UNSAFE_TOOL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]+").expect("static regex is valid"));
static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]+").expect("static regex is valid"));

/// Hands out tool names that are unique within one conversion call.
#[derive(Debug)]
pub struct ToolNameAllocator {
    prefix: String,
    max_len: usize,
    allocated: HashSet<String>,
}

impl ToolNameAllocator {
    #[must_use]
    pub fn new(prefix: &str, max_len: usize) -> Self {
        Self {
            prefix: prefix.trim().to_string(),
            max_len: max_len.max(MIN_TOOL_NAME_LEN),
            allocated: HashSet::new(),
        }
    }

    /// Allocate the name for `operation_id`, suffixing `-2`, `-3`, ... on collision.
    pub fn allocate(&mut self, operation_id: &str) -> String {
        let candidate = if self.prefix.is_empty() {
            operation_id.to_string()
        } else {
            format!("{}_{operation_id}", self.prefix)
        };
        let base = sanitize_tool_name(&candidate, self.max_len);

        if self.allocated.insert(base.clone()) {
            return base;
        }

        let mut counter = 2usize;
        loop {
            let suffix = format!("-{counter}");
            let keep = self.max_len.saturating_sub(suffix.len());
            let stem = truncate_name(&base, keep);
            let name = format!("{stem}{suffix}");
            if self.allocated.insert(name.clone()) {
                tracing::debug!(base = %base, name = %name, "Tool name collision resolved");
                return name;
            }
            counter += 1;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.allocated.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allocated.is_empty()
    }
}

/// Restrict to `[a-z0-9_-]`, lowercase, and cap the length.
#[must_use]
pub fn sanitize_tool_name(raw: &str, max_len: usize) -> String {
    let lower = raw.to_lowercase();
    let replaced = UNSAFE_TOOL_CHARS.replace_all(&lower, "_");
    let name = truncate_name(replaced.trim_matches(['_', '-']), max_len);
    if name.is_empty() {
        "tool".to_string()
    } else {
        name
    }
}

/// Sanitized names are ASCII, so byte truncation is safe.
fn truncate_name(name: &str, max_len: usize) -> String {
    let cut = if name.len() > max_len {
        &name[..max_len]
    } else {
        name
    };
    cut.trim_end_matches(['_', '-']).to_string()
}

/// Stable filename for the generated config: `<sanitized-name>-openapi-mcp.json`.
///
/// Pure and idempotent; collision avoidance on disk is the caller's job.
#[must_use]
pub fn generate_file_name(server_name: &str) -> String {
    let stem = file_stem(server_name);
    if stem.ends_with(CONFIG_FILE_SUFFIX) {
        format!("{stem}.json")
    } else {
        format!("{stem}{CONFIG_FILE_SUFFIX}.json")
    }
}

/// Companion filename for the raw spec: `<sanitized-name>.openapi.json`.
#[must_use]
pub fn spec_file_name(server_name: &str) -> String {
    let stem = file_stem(server_name);
    let stem = stem.strip_suffix(CONFIG_FILE_SUFFIX).unwrap_or(&stem);
    format!("{stem}{SPEC_FILE_SUFFIX}")
}

fn file_stem(server_name: &str) -> String {
    let trimmed = server_name.trim();
    let without_ext = if trimmed.to_ascii_lowercase().ends_with(".json") {
        &trimmed[..trimmed.len() - ".json".len()]
    } else {
        trimmed
    };
    let lower = without_ext.to_lowercase();
    let sanitized = UNSAFE_FILE_CHARS.replace_all(&lower, "-");
    let stem = sanitized.trim_matches('-');
    if stem.is_empty() {
        DEFAULT_SERVER_NAME.to_string()
    } else {
        stem.to_string()
    }
}
