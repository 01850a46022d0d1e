//! Error types for configuration and control-message decoding.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading configuration or decoding control messages.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Host is not one of the allowed bind addresses
    #[error("invalid host '{0}': use '0.0.0.0' or '127.0.0.1'")]
    InvalidHost(String),

    /// Port outside the unprivileged range
    #[error("port {0} must be between 1024 and 65535")]
    InvalidPort(u16),

    /// A configuration value is out of range
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Control message is not valid JSON
    #[error("failed to decode control message: {0}")]
    Decode(#[from] serde_json::Error),

    /// Control message is valid JSON but not an object
    #[error("control message must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
