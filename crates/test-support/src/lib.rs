use anyhow::Context as _;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Petstore-style document: refs, a shared path parameter, a degraded `oneOf` query parameter
/// and two operation ids that sanitize to the same tool name.
pub const PETSTORE_YAML: &str = include_str!("../fixtures/petstore.yaml");

/// Number of (path, method) pairs in [`PETSTORE_YAML`].
pub const PETSTORE_OPERATIONS: usize = 7;

/// JSON document whose server URL and a header default are `{{ .Name }}` placeholders.
pub const TEMPLATED_JSON: &str = include_str!("../fixtures/templated.json");

/// Smallest document that converts: one path, one operation, one server.
pub const MINIMAL_JSON: &str = r#"{
  "openapi": "3.0.0",
  "info": {"title": "Minimal", "version": "1"},
  "servers": [{"url": "https://spec.example"}],
  "paths": {"/ping": {"get": {"operationId": "ping"}}}
}"#;

/// Valid document with an empty `paths` mapping.
pub const EMPTY_PATHS_JSON: &str = r#"{
  "openapi": "3.0.0",
  "info": {"title": "Empty", "version": "1"},
  "paths": {}
}"#;

/// Write `contents` to `dir/name`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_spec(dir: &Path, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Captured result of one CLI invocation.
#[derive(Debug)]
pub struct CmdOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run `bin` with `args` and an isolated config home, capturing both streams.
///
/// `XDG_CONFIG_HOME` points at `config_home` so a developer's settings file never leaks in.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned.
pub fn run_cli(bin: &str, config_home: &Path, args: &[&str]) -> anyhow::Result<CmdOutput> {
    let out = Command::new(bin)
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .output()
        .with_context(|| format!("spawn {bin}"))?;
    Ok(CmdOutput {
        code: out.status.code(),
        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
    })
}

/// Fresh temporary directory.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn temp_dir() -> anyhow::Result<tempfile::TempDir> {
    tempfile::tempdir().context("create temp dir")
}
