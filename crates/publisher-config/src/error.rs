//! Error types for connection configuration lookups.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for connection configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// None of the search directories held a connection file.
    #[error("unable to find a connections.toml or config.toml")]
    ConfigurationUnavailable,
    /// The requested connection is absent after all merging.
    #[error("connection {name} not found")]
    ConnectionNotFound {
        /// Name that was looked up.
        name: String,
    },
    /// A connection file could not be parsed as TOML.
    #[error("failed to parse {}", path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// A connection table held values of the wrong type.
    #[error("invalid connection {name}")]
    InvalidConnection {
        /// Connection table name.
        name: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
