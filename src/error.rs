// ABOUTME: Error types for the error page handler
// ABOUTME: Config lookup, template fetch and handler failures with HTTP status mapping

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read an entry from the configuration store
#[derive(Debug, Error)]
pub enum ConfigLookupError {
    /// Store could not be opened or the lookup itself failed
    #[error("config store `{store}` unavailable: {reason}")]
    Unavailable { store: String, reason: String },
    /// No entry under the requested key
    #[error("config key `{0}` not found")]
    KeyNotFound(String),
    /// Entry exists but has no usable value
    #[error("config entry `{key}` is malformed: {reason}")]
    Malformed { key: String, reason: String },
}

/// Failure to produce the error page template
#[derive(Debug, Error)]
pub enum TemplateFetchError {
    /// Template location could not be resolved
    #[error("failed to resolve template location: {0}")]
    Config(#[from] ConfigLookupError),
    /// Object is missing from the bucket
    #[error("object `{bucket}/{key}` not found")]
    NotFound { bucket: String, key: String },
    /// Object store refused access
    #[error("access denied to `{bucket}/{key}`")]
    AccessDenied { bucket: String, key: String },
    /// Transport or unexpected object store failure
    #[error("object store error: {0}")]
    Storage(String),
    /// Template bytes are not UTF-8
    #[error("template is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    /// Local cache file could not be read or written
    #[error("disk cache I/O failed at {path:?}: {source}")]
    Disk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while handling a viewer event
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Event carried no request record
    #[error("malformed viewer event: {0}")]
    MalformedEvent(String),
    /// Template could not be loaded and the failure policy propagates
    #[error(transparent)]
    Template(#[from] TemplateFetchError),
}

/// Invalid value for a configuration option
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid value `{value}` for `{option}`, expected one of: {expected}")]
    InvalidValue {
        option: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl ConfigLookupError {
    pub fn status_code(&self) -> u16 {
        match self {
            ConfigLookupError::Unavailable { .. } => 503,
            ConfigLookupError::KeyNotFound(_) | ConfigLookupError::Malformed { .. } => 500,
        }
    }
}

impl TemplateFetchError {
    pub fn status_code(&self) -> u16 {
        match self {
            TemplateFetchError::Config(e) => e.status_code(),
            TemplateFetchError::NotFound { .. }
            | TemplateFetchError::AccessDenied { .. }
            | TemplateFetchError::Storage(_)
            | TemplateFetchError::Encoding(_) => 502,
            TemplateFetchError::Disk { .. } => 500,
        }
    }
}

impl HandlerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::MalformedEvent(_) => 400,
            HandlerError::Template(e) => e.status_code(),
        }
    }
}

/// Result type alias for handler operations
pub type Result<T> = std::result::Result<T, HandlerError>;
