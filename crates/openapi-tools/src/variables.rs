//! Template variable detection on the raw spec text.
//!
//! Runs before parsing: placeholders may sit in values that would otherwise fail strict typing
//! (e.g. an integer field holding `"{{ .PORT }}"`).

use crate::model::RequiredVariable;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Literal marker for an unresolved placeholder.
pub const TEMPLATE_MARKER: &str = "{{ .";

static TEMPLATE_VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{ \.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("static regex is valid")
});

/// Every distinct `{{ .Name }}` identifier, in order of first appearance.
#[must_use]
pub fn scan_template_variables(spec_text: &str) -> Vec<RequiredVariable> {
    let mut seen = HashSet::new();
    TEMPLATE_VARIABLE
        .captures_iter(spec_text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| seen.insert(*name))
        .map(|name| RequiredVariable {
            name: name.to_string(),
        })
        .collect()
}

/// Whether `text` still needs variable resolution before activation.
#[must_use]
pub fn has_unresolved_variables(text: &str) -> bool {
    text.contains(TEMPLATE_MARKER)
}
