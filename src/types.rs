//! Core types shared by the walker, renderer and assembler.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reserved path-item key holding parameters shared by every method.
pub const PATH_PARAMETERS_KEY: &str = "parameters";

/// Title shown when the document has no `info.title`.
pub const DEFAULT_TITLE: &str = "Api-Document";

/// Version shown when the document has no `info.version`.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns the `$ref` target if `value` is a reference node.
pub fn ref_name(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

/// One operation found under `paths`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathMethod<'a> {
    /// Path template as written in the document, e.g. `/pets/{id}`.
    pub path: &'a str,
    /// Upper-cased HTTP method.
    pub method: String,
    /// The operation object.
    pub operation: &'a Value,
}

/// The `info` block of a document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentInfo {
    #[serde(default, deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub description: Option<String>,
}

// YAML reads `version: 1.0` as a number.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

impl DocumentInfo {
    /// Read `info` from a document, tolerating a missing or malformed block.
    pub fn from_document(document: &Value) -> Self {
        document
            .get("info")
            .and_then(|info| serde_json::from_value(info.clone()).ok())
            .unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        non_empty(self.title.as_deref()).unwrap_or(DEFAULT_TITLE)
    }

    pub fn version(&self) -> &str {
        non_empty(self.version.as_deref()).unwrap_or(DEFAULT_VERSION)
    }

    pub fn description(&self) -> Option<&str> {
        non_empty(self.description.as_deref())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Options for a Markdown conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Order operations by path then method, and references by key.
    pub sort: bool,
}

impl ConvertOptions {
    /// Create options with source document order preserved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sort mode.
    pub fn sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }
}
