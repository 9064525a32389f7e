//! Error types for loading, upgrading and converting API documents.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while fetching or parsing a source document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("source is not YAML or JSON: {yaml}")]
    UnparsableDocument {
        yaml: serde_yaml::Error,
        #[source]
        json: serde_json::Error,
    },

    #[error("source is not an API document: expected a mapping at the root, got {actual}")]
    NotADocument { actual: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while upgrading a Swagger 2.0 document to OpenAPI 3.
#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error("unsupported document version: {found}")]
    UnsupportedVersion { found: String },
}

/// Errors from the full source-to-Markdown pipeline.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Upgrade(#[from] UpgradeError),
}

impl ConvertError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::Load(e) => e.exit_code(),
            ConvertError::Upgrade(_) => 2,
        }
    }
}
