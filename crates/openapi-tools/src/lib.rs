//! `OpenAPI` -> MCP server config translation.
//!
//! Converts an `OpenAPI` 3.x document (JSON or YAML) into a deterministic MCP server config:
//! one tool per (path, method) pair, each with a flattened input schema, plus the command line
//! an agent runtime uses to launch the server.
//!
//! The crate is pure: it performs **no** I/O. Persisting the artifact (and cleaning up after a
//! failed write) is the caller's job.
//!
//! ```
//! use openapi_mcp_tools::{ConvertOptions, OpenApiTranslator};
//!
//! let spec = r#"{
//!   "openapi": "3.0.0",
//!   "info": {"title": "Pets"},
//!   "servers": [{"url": "https://pets.example"}],
//!   "paths": {"/pets": {"get": {"operationId": "listPets"}}}
//! }"#;
//!
//! let json = OpenApiTranslator::new()
//!     .convert(spec, &ConvertOptions::new("pets"))
//!     .unwrap();
//! assert!(json.contains("\"name\": \"pets\""));
//! ```

pub mod assemble;
pub mod base_url;
pub mod config;
pub mod error;
pub mod model;
pub mod naming;
pub mod operations;
pub mod parameters;
pub mod resolver;
pub mod translator;
pub mod validate;
pub mod variables;

pub use config::{ConvertOptions, TranslatorSettings};
pub use error::{ConvertError, Result, ValidationError};
pub use model::{
    DegradedField, FieldLocation, FieldType, HttpMethod, InputField, McpServerConfig,
    RequiredVariable, ToolDescriptor,
};
pub use naming::{generate_file_name, spec_file_name};
pub use translator::{Conversion, OpenApiTranslator};
pub use variables::{has_unresolved_variables, scan_template_variables};
