//! Error types for `openapi-mcp-tools`.

use thiserror::Error;

/// A document that is malformed or missing required top-level structure.
///
/// Carries every violation found, not only the first one, so callers can report them all at once.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid OpenAPI document: {}", .violations.join("; "))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

impl ValidationError {
    #[must_use]
    pub fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }

    #[must_use]
    pub fn single(violation: impl Into<String>) -> Self {
        Self {
            violations: vec![violation.into()],
        }
    }
}

/// Main error type for a conversion call.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The document failed structural validation (client-input fault).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Structurally valid document that declares no paths.
    #[error("Conversion error: the document declares no paths")]
    NoPaths,

    /// Neither an explicit base URL nor a declared server is available.
    #[error("Conversion error: no base URL resolvable (no override given and no servers declared)")]
    NoBaseUrl,

    #[error("Conversion error: invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    /// JSON serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    /// `true` for faults in the caller's input document, `false` for processing faults.
    #[must_use]
    pub fn is_client_fault(&self) -> bool {
        matches!(self, ConvertError::Validation(_))
    }
}

/// Failure to follow a `$ref` inside the document.
///
/// Never surfaced from a conversion: the parameter mapper turns it into a degraded field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("external $ref '{0}' is not resolved (only local '#/...' refs are supported)")]
    External(String),

    #[error("unsupported $ref fragment (expected JSON pointer starting with '/'): {0}")]
    BadFragment(String),

    #[error("unresolved $ref '{0}'")]
    Missing(String),

    #[error("cyclic $ref detected while resolving: {0}")]
    Cycle(String),

    #[error("referenced value '{reference}' has an unexpected shape: {message}")]
    Shape { reference: String, message: String },
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;
