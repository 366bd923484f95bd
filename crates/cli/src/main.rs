//! `openapi-mcp`: convert `OpenAPI` documents into MCP server configs.
//!
//! Usage:
//!   openapi-mcp validate petstore.yaml
//!   openapi-mcp convert petstore.yaml --name petstore --out-dir ./configs
//!   openapi-mcp install petstore.yaml --name petstore --env-dir ~/.config/station/environments/default
//!   openapi-mcp variables petstore.yaml
//!   openapi-mcp filename "My Server"

mod commands;
mod config;
mod logging;
mod persist;

use clap::{Args, Parser, Subcommand};
use openapi_mcp_tools::{ConvertError, ValidationError};
use owo_colors::{OwoColorize as _, Stream};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(name = "openapi-mcp", version)]
#[command(about = "Convert OpenAPI documents into MCP server configs", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Check a document before converting it
    openapi-mcp validate petstore.yaml

    # Print the generated config
    openapi-mcp convert petstore.yaml --name petstore --stdout

    # Store spec + config in an environment directory
    openapi-mcp install petstore.yaml --name petstore --env-dir ./environments/default

    # Read the spec from stdin
    curl -s https://petstore3.swagger.io/api/v3/openapi.json | openapi-mcp convert - --stdout
")]
struct Cli {
    /// Settings file (JSON or YAML). Defaults to `$XDG_CONFIG_HOME/openapi-mcp/settings.json`.
    #[arg(long, global = true, env = "OPENAPI_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overridden by `RUST_LOG`).
    #[arg(long, global = true, default_value = "warn", env = "OPENAPI_MCP_LOG_LEVEL")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Command the runtime executes to launch generated servers (overrides settings).
    #[arg(long, global = true)]
    runtime_command: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that a document is a structurally valid `OpenAPI` 3.x document
    Validate {
        /// Spec file (JSON or YAML), or `-` for stdin
        spec: PathBuf,
    },

    /// Convert a document into an MCP server config
    Convert(ConvertArgs),

    /// Store the spec and its spec-file-reference config in an environment directory
    Install(InstallArgs),

    /// List the `{{ .Name }}` template variables a document needs
    Variables {
        /// Spec file (JSON or YAML), or `-` for stdin
        spec: PathBuf,

        /// Print a JSON array instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Print the config filename generated for a server name
    Filename {
        name: String,

        /// Print the companion spec filename instead
        #[arg(long)]
        spec: bool,
    },
}

#[derive(Args)]
pub struct NamingArgs {
    /// Server name (defaults to the configured default server name)
    #[arg(long, short = 'n', default_value = "")]
    pub name: String,

    /// Prefix for every generated tool name
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Base URL override (defaults to the first server declared by the document)
    #[arg(long, default_value = "")]
    pub base_url: String,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Spec file (JSON or YAML), or `-` for stdin
    pub spec: PathBuf,

    #[command(flatten)]
    pub naming: NamingArgs,

    /// Point the runtime at this spec file instead of embedding tools
    #[arg(long)]
    pub spec_file_path: Option<String>,

    /// Directory to write the config into
    #[arg(long, short = 'o', default_value = ".", conflicts_with = "stdout")]
    pub out_dir: PathBuf,

    /// Print the config to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Replace an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct InstallArgs {
    /// Spec file (JSON or YAML), or `-` for stdin
    pub spec: PathBuf,

    #[command(flatten)]
    pub naming: NamingArgs,

    /// Environment directory receiving `<name>.openapi.json` and `<name>-openapi-mcp.json`
    #[arg(long)]
    pub env_dir: PathBuf,

    /// Embed the extracted tools instead of referencing the stored spec file
    #[arg(long)]
    pub embed: bool,

    /// Replace existing files
    #[arg(long)]
    pub force: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init(&cli.log_level, cli.log_format) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!(
                "{} {err:#}",
                "error:".if_supports_color(Stream::Stderr, |t| t.red().bold().to_string())
            );
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let (config_path, required) = match cli.config {
        Some(p) => (p, true),
        None => (config::default_config_path()?, false),
    };
    let mut settings = config::load_settings(&config_path, required)?;
    if let Some(command) = cli.runtime_command {
        settings.runtime_command = command;
    }

    match cli.command {
        Command::Validate { spec } => commands::validate(&settings, &spec),
        Command::Convert(args) => commands::convert(settings, &args),
        Command::Install(args) => commands::install(settings, &args),
        Command::Variables { spec, json } => commands::variables(&settings, &spec, json),
        Command::Filename { name, spec } => {
            commands::filename(&name, spec);
            Ok(())
        }
    }
}

/// 2 for faults in the input document, 1 for everything else.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    let client_fault = err.chain().any(|cause| {
        cause.downcast_ref::<ValidationError>().is_some()
            || cause
                .downcast_ref::<ConvertError>()
                .is_some_and(ConvertError::is_client_fault)
    });
    if client_fault {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}
