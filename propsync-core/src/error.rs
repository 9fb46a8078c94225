//! Error types for propsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required values were absent or empty. Lists every missing
    /// variable name, not just the first.
    #[error("missing required configuration: {}", .names.join(", "))]
    Missing { names: Vec<&'static str> },

    /// Underlying I/O failure reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with file path and serde_yaml line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An explicitly requested config file does not exist.
    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    /// A URL value that is not `http://` or `https://`.
    #[error("{name} must be an http(s) URL, got '{value}'")]
    InvalidUrl { name: &'static str, value: String },

    /// A timeout that is zero or not a number.
    #[error("{name} must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { name: &'static str, value: String },
}
