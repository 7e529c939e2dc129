//! Function catalog data model
//!
//! The catalog is a JSON document generated outside this server. It lists the
//! built-in (`system`) functions and the host-extension functions grouped by
//! host type:
//!
//! ```json
//! {
//!   "generatedAt": "2025-01-01T00:00:00Z",
//!   "system": [{ "name": "print", "namespace": null, "params": [1], "async": false, "primarySync": false }],
//!   "extensions": { "org.bukkit.entity.Player": [ ... ] }
//! }
//! ```
//!
//! Each value in `params` is one independently supported argument count:
//! `[1, 3]` means "1 or 3 arguments", never "1 to 3".

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single catalog entry (system or extension function)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFunction {
    pub name: String,
    pub namespace: Option<String>,
    /// Supported argument counts, ascending and distinct after [`CatalogFunction::normalize`]
    pub params: Vec<u32>,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub primary_sync: bool,
}

impl CatalogFunction {
    /// Two entries describe the same function iff namespace and name match exactly
    pub fn same_function(&self, other: &CatalogFunction) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }

    /// Smallest supported argument count
    pub fn min_arity(&self) -> u32 {
        self.params.first().copied().unwrap_or(0)
    }

    /// Sort and deduplicate `params`; an empty list means "no parameters".
    pub fn normalize(&mut self) {
        self.params.sort_unstable();
        self.params.dedup();
        if self.params.is_empty() {
            self.params.push(0);
        }
    }
}

/// The whole catalog document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub generated_at: String,
    pub system: Vec<CatalogFunction>,
    /// Host type name -> functions, in document order
    pub extensions: IndexMap<String, Vec<CatalogFunction>>,
}

impl Catalog {
    /// Parse, validate and normalize a catalog document.
    ///
    /// Returns the reason for rejection when the text is not JSON or does not
    /// satisfy [`validate_catalog`]. A single malformed entry rejects the
    /// whole document.
    pub fn from_json_str(raw: &str) -> Result<Catalog, String> {
        let value: Value = serde_json::from_str(raw).map_err(|e| format!("malformed JSON: {}", e))?;
        validate_catalog(&value)?;

        // Re-decode from the text so `extensions` keeps document order
        let mut catalog: Catalog = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        catalog.normalize();
        Ok(catalog)
    }

    fn normalize(&mut self) {
        for function in &mut self.system {
            function.normalize();
        }
        for functions in self.extensions.values_mut() {
            for function in functions {
                function.normalize();
            }
        }
    }
}

/// Structural predicate for a catalog document.
///
/// The top level must carry a string `generatedAt`, an array `system` and a
/// non-null object `extensions` whose values are arrays. Every function entry
/// must satisfy [`validate_function`].
pub fn validate_catalog(value: &Value) -> Result<(), String> {
    let object = value
        .as_object()
        .ok_or_else(|| "top level is not an object".to_string())?;

    if !object.get("generatedAt").is_some_and(Value::is_string) {
        return Err("`generatedAt` must be a string".to_string());
    }

    let system = object
        .get("system")
        .and_then(Value::as_array)
        .ok_or_else(|| "`system` must be an array".to_string())?;
    for (index, entry) in system.iter().enumerate() {
        validate_function(entry).map_err(|reason| format!("system[{}]: {}", index, reason))?;
    }

    let extensions = object
        .get("extensions")
        .and_then(Value::as_object)
        .ok_or_else(|| "`extensions` must be an object".to_string())?;
    for (host, functions) in extensions {
        let functions = functions
            .as_array()
            .ok_or_else(|| format!("extensions[{}] must be an array", host))?;
        for (index, entry) in functions.iter().enumerate() {
            validate_function(entry)
                .map_err(|reason| format!("extensions[{}][{}]: {}", host, index, reason))?;
        }
    }

    Ok(())
}

/// Structural predicate for one function entry.
pub fn validate_function(value: &Value) -> Result<(), String> {
    let entry = value
        .as_object()
        .ok_or_else(|| "entry is not an object".to_string())?;

    if !entry.get("name").is_some_and(Value::is_string) {
        return Err("`name` must be a string".to_string());
    }
    // `namespace` must be present, null is allowed
    match entry.get("namespace") {
        Some(Value::Null) | Some(Value::String(_)) => {}
        _ => return Err("`namespace` must be a string or null".to_string()),
    }
    let params = entry
        .get("params")
        .and_then(Value::as_array)
        .ok_or_else(|| "`params` must be an array".to_string())?;
    if !params
        .iter()
        .all(|p| p.as_u64().is_some_and(|n| n <= u32::MAX as u64))
    {
        return Err("`params` must contain non-negative integers".to_string());
    }
    if !entry.get("async").is_some_and(Value::is_boolean) {
        return Err("`async` must be a boolean".to_string());
    }
    if !entry.get("primarySync").is_some_and(Value::is_boolean) {
        return Err("`primarySync` must be a boolean".to_string());
    }

    Ok(())
}
