//! Local `$ref` resolver.
//!
//! The `openapiv3` crate models `$ref`s using `ReferenceOr<T>` but does not automatically resolve them.
//! Conversion is a pure function of the document text, so only local refs (`#/...`) are followed;
//! file and URL refs are reported as [`ResolveError::External`] and the caller degrades the field.
//!
//! Resolution works on the raw JSON value of the document and deserializes the target into the
//! requested `openapiv3` type, so one malformed component never breaks unrelated operations.

use crate::error::ResolveError;
use openapiv3::ReferenceOr;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct LocalResolver<'a> {
    root: &'a Value,
}

impl<'a> LocalResolver<'a> {
    #[must_use]
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Follow `$ref` chains starting at `value` until a non-reference value is reached.
    ///
    /// # Errors
    ///
    /// Returns an error for external refs, malformed fragments, missing targets and cycles.
    pub fn resolve_value<'v>(&self, value: &'v Value) -> Result<&'v Value, ResolveError>
    where
        'a: 'v,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut cur = value;

        while let Some(reference) = ref_target(cur) {
            if !seen.insert(reference) {
                return Err(ResolveError::Cycle(reference.to_string()));
            }
            cur = self.lookup(reference)?;
        }

        Ok(cur)
    }

    /// Resolve a raw value (possibly a `$ref`) and deserialize it as `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference cannot be resolved or the target does not have the
    /// shape of `T`.
    pub fn resolve_as<T: DeserializeOwned>(&self, value: &Value) -> Result<T, ResolveError> {
        let target = self.resolve_value(value)?;
        serde_json::from_value(target.clone()).map_err(|e| ResolveError::Shape {
            reference: ref_target(value).unwrap_or("<inline>").to_string(),
            message: e.to_string(),
        })
    }

    /// Resolve an already-typed `ReferenceOr<T>`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve_as`].
    pub fn resolve_reference_or<T>(&self, r: &ReferenceOr<T>) -> Result<T, ResolveError>
    where
        T: Clone + DeserializeOwned,
    {
        match r {
            ReferenceOr::Item(item) => Ok(item.clone()),
            ReferenceOr::Reference { reference } => {
                let target = self.resolve_value(self.lookup(reference)?)?;
                serde_json::from_value(target.clone()).map_err(|e| ResolveError::Shape {
                    reference: reference.clone(),
                    message: e.to_string(),
                })
            }
        }
    }

    fn lookup(&self, reference: &str) -> Result<&'a Value, ResolveError> {
        let Some(frag) = reference.strip_prefix('#') else {
            return Err(ResolveError::External(reference.to_string()));
        };
        if frag.is_empty() {
            return Ok(self.root);
        }
        if !frag.starts_with('/') {
            return Err(ResolveError::BadFragment(reference.to_string()));
        }
        self.root
            .pointer(&decode_pointer(frag))
            .ok_or_else(|| ResolveError::Missing(reference.to_string()))
    }
}

fn ref_target(value: &Value) -> Option<&str> {
    value.as_object()?.get("$ref")?.as_str()
}

/// `$ref` fragments are URI-encoded; JSON pointers are not.
fn decode_pointer(frag: &str) -> String {
    urlencoding::decode(frag)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| frag.to_string())
}
