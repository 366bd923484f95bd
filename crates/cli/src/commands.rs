use anyhow::Context as _;
use openapi_mcp_tools::{
    Conversion, ConvertOptions, OpenApiTranslator, TranslatorSettings, generate_file_name,
    scan_template_variables, spec_file_name,
};
use owo_colors::{OwoColorize as _, Stream};
use serde::Serialize;
use std::io::Read as _;
use std::path::{Path, PathBuf};

use crate::persist::{WrittenFiles, spec_reference};
use crate::{ConvertArgs, InstallArgs, NamingArgs};

impl NamingArgs {
    fn options(&self) -> ConvertOptions {
        ConvertOptions::new(self.name.trim())
            .with_tool_name_prefix(self.prefix.trim())
            .with_base_url(self.base_url.trim())
    }
}

/// Outcome of `install`, printed as JSON on stdout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstallSummary {
    status: InstallStatus,
    server_name: String,
    config_path: PathBuf,
    spec_path: PathBuf,
    tools: usize,
    required_variables: Vec<String>,
    degraded_fields: usize,
    spec_digest: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum InstallStatus {
    Installed,
    /// Written, but placeholders must be resolved before the server can start.
    VariablesNeeded,
}

pub fn validate(settings: &TranslatorSettings, spec: &Path) -> anyhow::Result<()> {
    let text = read_spec(spec, settings.max_spec_bytes)?;
    OpenApiTranslator::new()
        .validate(&text)
        .with_context(|| format!("validate {}", spec.display()))?;
    println!(
        "{} {} is a valid OpenAPI document",
        "✓".if_supports_color(Stream::Stdout, |t| t.green().to_string()),
        spec.display()
    );
    Ok(())
}

pub fn convert(settings: TranslatorSettings, args: &ConvertArgs) -> anyhow::Result<()> {
    let text = read_spec(&args.spec, settings.max_spec_bytes)?;
    let translator = OpenApiTranslator::with_settings(settings);

    let mut options = args.naming.options();
    if let Some(path) = &args.spec_file_path {
        options = options.with_spec_file_path(path.clone());
    }
    let conversion = translator
        .convert_detailed(&text, &options)
        .with_context(|| format!("convert {}", args.spec.display()))?;
    report_degraded(&conversion);

    if args.stdout {
        print!("{}", conversion.config_json);
    } else {
        let path = args.out_dir.join(&conversion.file_name);
        let mut files = WrittenFiles::new();
        files.write(&path, &conversion.config_json, args.force)?;
        files.commit();
        println!("{}", path.display());
    }

    report_variables(&conversion);
    Ok(())
}

pub fn install(settings: TranslatorSettings, args: &InstallArgs) -> anyhow::Result<()> {
    let text = read_spec(&args.spec, settings.max_spec_bytes)?;
    let translator = OpenApiTranslator::with_settings(settings);
    translator
        .validate(&text)
        .with_context(|| format!("validate {}", args.spec.display()))?;

    let mut options = args.naming.options();
    if options.server_name.is_empty() {
        options.server_name = translator.settings().default_server_name.clone();
    }
    let spec_name = spec_file_name(&options.server_name);
    let spec_path = args.env_dir.join(&spec_name);
    if !args.embed {
        options = options.with_spec_file_path(spec_reference(&args.env_dir, &spec_name));
    }

    // Convert before touching the directory: a rejected document must not disturb it.
    let conversion = translator
        .convert_detailed(&text, &options)
        .with_context(|| format!("convert {}", args.spec.display()))?;
    let stored_spec = normalize_to_json(&text)?;
    let config_path = args.env_dir.join(&conversion.file_name);

    // A failed write rolls back everything written so far when `files` drops.
    let mut files = WrittenFiles::new();
    files.write(&spec_path, &stored_spec, args.force)?;
    files.write(&config_path, &conversion.config_json, args.force)?;
    files.commit();

    tracing::info!(
        server = %options.server_name,
        config = %config_path.display(),
        spec = %spec_path.display(),
        "Installed MCP server config"
    );
    report_degraded(&conversion);

    let summary = InstallSummary {
        status: if conversion.needs_variables() {
            InstallStatus::VariablesNeeded
        } else {
            InstallStatus::Installed
        },
        server_name: options.server_name.clone(),
        config_path,
        spec_path,
        tools: conversion.tool_count,
        required_variables: conversion
            .required_variables
            .iter()
            .map(|v| v.name.clone())
            .collect(),
        degraded_fields: conversion.warnings.len(),
        spec_digest: conversion.spec_digest.clone(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    report_variables(&conversion);
    Ok(())
}

pub fn variables(settings: &TranslatorSettings, spec: &Path, json: bool) -> anyhow::Result<()> {
    let text = read_spec(spec, settings.max_spec_bytes)?;
    let names: Vec<String> = scan_template_variables(&text)
        .into_iter()
        .map(|v| v.name)
        .collect();
    if json {
        println!("{}", serde_json::to_string(&names)?);
    } else {
        for name in names {
            println!("{name}");
        }
    }
    Ok(())
}

pub fn filename(name: &str, spec: bool) {
    if spec {
        println!("{}", spec_file_name(name));
    } else {
        println!("{}", generate_file_name(name));
    }
}

/// Read a spec from a file or stdin (`-`), rejecting anything above `max_bytes`.
fn read_spec(path: &Path, max_bytes: usize) -> anyhow::Result<String> {
    let limit = u64::try_from(max_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    let mut buf = Vec::new();
    if path == Path::new("-") {
        std::io::stdin()
            .lock()
            .take(limit)
            .read_to_end(&mut buf)
            .context("read spec from stdin")?;
    } else {
        std::fs::File::open(path)
            .with_context(|| format!("open {}", path.display()))?
            .take(limit)
            .read_to_end(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
    }

    if buf.len() > max_bytes {
        anyhow::bail!(
            "{} exceeds the maximum spec size of {max_bytes} bytes",
            path.display()
        );
    }
    String::from_utf8(buf).with_context(|| format!("{} is not valid UTF-8", path.display()))
}

/// The stored spec is always JSON; YAML input is re-encoded.
fn normalize_to_json(text: &str) -> anyhow::Result<String> {
    if serde_json::from_str::<serde_json::Value>(text).is_ok() {
        return Ok(text.to_string());
    }
    let doc: serde_json::Value = serde_yaml::from_str(text).context("re-encode YAML spec")?;
    let mut json = serde_json::to_string_pretty(&doc)?;
    json.push('\n');
    Ok(json)
}

fn report_degraded(conversion: &Conversion) {
    if conversion.warnings.is_empty() {
        return;
    }
    eprintln!(
        "{} {} field(s) fell back to opaque object typing",
        "warning:".if_supports_color(Stream::Stderr, |t| t.yellow().bold().to_string()),
        conversion.warnings.len()
    );
}

fn report_variables(conversion: &Conversion) {
    if !conversion.needs_variables() {
        return;
    }
    let names: Vec<&str> = conversion
        .required_variables
        .iter()
        .map(|v| v.name.as_str())
        .collect();
    eprintln!(
        "{} {}; resolve them before activating the config",
        "variables needed:".if_supports_color(Stream::Stderr, |t| t.yellow().bold().to_string()),
        names.join(", ")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_specs_are_stored_as_json() {
        let json = normalize_to_json("openapi: 3.0.0\ninfo: {title: x}\n").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["openapi"], "3.0.0");
        assert_eq!(value["info"]["title"], "x");

        let original = r#"{"openapi": "3.0.0"}"#;
        assert_eq!(normalize_to_json(original).unwrap(), original);
    }

    #[test]
    fn oversized_specs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.json");
        std::fs::write(&path, "x".repeat(64)).unwrap();
        assert!(read_spec(&path, 63).is_err());
        assert_eq!(read_spec(&path, 64).unwrap().len(), 64);
    }
}
