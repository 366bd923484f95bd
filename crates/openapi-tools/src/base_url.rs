//! Base URL resolution: explicit override, then the first declared server, otherwise an error.

use crate::error::{ConvertError, Result};
use crate::variables::has_unresolved_variables;
use openapiv3::Server;
use serde_json::Value;
use url::Url;

/// Pick the single backend base URL for the generated server.
///
/// # Errors
///
/// Returns [`ConvertError::NoBaseUrl`] when neither source yields a URL, and
/// [`ConvertError::InvalidBaseUrl`] when the chosen URL is not an absolute http(s) URL.
/// URLs holding a template placeholder are passed through unchecked.
pub fn resolve_base_url(doc: &Value, override_url: &str) -> Result<String> {
    let override_url = override_url.trim();
    let chosen = if override_url.is_empty() {
        let declared = first_server_url(doc).ok_or(ConvertError::NoBaseUrl)?;
        tracing::debug!(base_url = %declared, "Using first declared server as base URL");
        declared
    } else {
        tracing::debug!(base_url = %override_url, "Using base URL override");
        override_url.to_string()
    };

    check_base_url(&chosen)?;
    Ok(chosen.trim_end_matches('/').to_string())
}

/// First non-empty entry of `servers`, with `{var}` server variables replaced by their defaults.
fn first_server_url(doc: &Value) -> Option<String> {
    let first = doc.get("servers")?.as_array()?.first()?;
    let url = match serde_json::from_value::<Server>(first.clone()) {
        Ok(server) => substitute_server_variables(&server),
        // Tolerate odd variable blocks; the url itself is all we need.
        Err(_) => first.get("url")?.as_str()?.to_string(),
    };
    let url = url.trim().to_string();
    (!url.is_empty()).then_some(url)
}

fn substitute_server_variables(server: &Server) -> String {
    let mut url = server.url.clone();
    for (name, var) in server.variables.iter().flatten() {
        url = url.replace(&format!("{{{name}}}"), &var.default);
    }
    url
}

fn check_base_url(url: &str) -> Result<()> {
    if has_unresolved_variables(url) {
        return Ok(());
    }

    let parsed = Url::parse(url).map_err(|e| ConvertError::InvalidBaseUrl {
        url: url.to_string(),
        message: format!("{e}; must be an absolute http(s) URL (set the base URL explicitly)"),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConvertError::InvalidBaseUrl {
            url: url.to_string(),
            message: format!("unsupported scheme '{other}' (expected http or https)"),
        }),
    }
}
