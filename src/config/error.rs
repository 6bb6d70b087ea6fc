//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required environment variables are unset or empty.
    ///
    /// Every missing name is listed, not just the first one encountered.
    #[error("Missing required environment variables:{}", bullet_list(.names))]
    MissingEnvVars { names: Vec<&'static str> },

    /// The credentials file referenced by `GOOGLE_APPLICATION_CREDENTIALS` does not exist.
    #[error("Credentials file not found at {path}")]
    CredentialsNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A numeric setting could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// Storage provider name is not one of the supported backends.
    #[error("unknown storage provider '{value}' (expected gcs or local)")]
    UnknownStorageProvider { value: String },
}

fn bullet_list(names: &[&'static str]) -> String {
    names.iter().map(|name| format!("\n  - {name}")).collect()
}
