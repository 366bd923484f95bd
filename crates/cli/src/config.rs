use anyhow::Context as _;
use openapi_mcp_tools::TranslatorSettings;
use std::path::{Path, PathBuf};

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let base = if let Ok(v) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(v)
    } else {
        let home = std::env::var("HOME").context("HOME is not set")?;
        PathBuf::from(home).join(".config")
    };
    Ok(base.join("openapi-mcp").join("settings.json"))
}

/// Load translator settings from `path` (JSON or YAML).
///
/// A missing file yields the defaults unless `required` is set, which is the case when the
/// path was given explicitly on the command line.
pub fn load_settings(path: &Path, required: bool) -> anyhow::Result<TranslatorSettings> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            tracing::debug!(path = %path.display(), "No settings file; using defaults");
            return Ok(TranslatorSettings::default());
        }
        Err(e) => return Err(e).with_context(|| format!("read config {}", path.display())),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(TranslatorSettings::default());
    }
    // JSON is a subset of YAML.
    let settings: TranslatorSettings =
        serde_yaml::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))?;
    Ok(settings)
}
