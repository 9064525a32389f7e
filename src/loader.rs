//! Document loading from files and HTTP URLs.
//!
//! Fetches raw text, then detects the format: YAML is tried first, JSON second.

use std::path::Path;

use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::error::LoadError;
use crate::types::json_type_name;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Read a source document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::ReadError` if it can't be read as UTF-8 text.
pub fn read_file(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Fetch a source document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or the server
/// answers with an error status.
#[cfg(feature = "remote")]
pub fn fetch_url(url: &str) -> Result<String, LoadError> {
    debug!(url, "fetching document");

    let network_error = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load raw text from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn load_source(source: &str) -> Result<String, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            fetch_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        read_file(Path::new(source))
    }
}

/// Parse document text, trying YAML first and JSON second.
///
/// # Errors
///
/// Returns `LoadError::UnparsableDocument` if neither parser accepts the text,
/// or `LoadError::NotADocument` if the root isn't a mapping.
pub fn parse_document(content: &str) -> Result<Value, LoadError> {
    let value = match serde_yaml::from_str::<serde_yaml::Value>(content) {
        Ok(yaml) => yaml_to_json(yaml),
        Err(yaml) => {
            debug!(error = %yaml, "YAML parse failed, trying JSON");
            serde_json::from_str(content)
                .map_err(|json| LoadError::UnparsableDocument { yaml, json })?
        }
    };

    if !value.is_object() {
        return Err(LoadError::NotADocument {
            actual: json_type_name(&value).to_string(),
        });
    }
    Ok(value)
}

/// Load and parse a document from a file path or URL.
pub fn load_document(source: &str) -> Result<Value, LoadError> {
    let content = load_source(source)?;
    parse_document(&content)
}

/// Convert a YAML value into the JSON model.
///
/// Mapping keys that aren't strings (status codes like `200:`) are stringified;
/// tags are dropped in favour of the tagged value.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => yaml_number(&n),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else {
        // NaN and infinities have no JSON form
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Null => "null".to_string(),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
