//! Error types for document loading and invocation

use thiserror::Error;

/// Result type alias for document loading
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Errors that abort loading a document.
///
/// Reference errors abort the whole load rather than skipping the operation
/// being compiled.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid document: {0}")]
    Document(String),

    #[error("failed to fetch document: {0}")]
    Fetch(String),

    #[error("unresolvable reference: {0}")]
    Reference(String),

    #[error("reference cycle detected at: {0}")]
    ReferenceCycle(String),
}

/// Supplied arguments failed an operation's validation model.
///
/// Always returned to the caller before any network attempt; a validation
/// failure never triggers an HTTP call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("missing required argument: {0}")]
    MissingRequired(String),

    #[error("invalid value for '{name}': expected {expected}")]
    Type { name: String, expected: &'static str },
}
