//! Configuration error types
//!
//! Everything here is a document-level failure: the file is unreadable,
//! absent, or not valid TOML. These are the only errors that abort an
//! entire assembly run (per-pipeline construction failures are handled by
//! the topology builder's rollback instead).

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading a pipeline configuration document
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Configuration path does not exist
    #[error("pipeline configuration not found at '{path}'")]
    NotFound {
        /// The missing path
        path: String,
    },

    /// Configuration directory contains no TOML files
    #[error("no pipeline configuration files (*.toml) found in '{path}'")]
    NoConfigFiles {
        /// The empty directory
        path: String,
    },

    /// Failed to parse the document as TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// One pipeline table failed to deserialize
    #[error("invalid pipeline '{name}': {source}")]
    InvalidPipeline {
        /// The pipeline whose table is malformed
        name: String,
        /// Underlying deserialization error
        #[source]
        source: toml::de::Error,
    },

    /// The `version` marker is not a recognizable version string
    #[error("invalid version marker '{value}': expected '<major>' or '<major>.<minor>'")]
    InvalidVersion {
        /// The offending value
        value: String,
    },
}

impl ConfigError {
    /// Create an Io error
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a NotFound error
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an InvalidPipeline error
    pub fn invalid_pipeline(name: impl Into<String>, source: toml::de::Error) -> Self {
        Self::InvalidPipeline {
            name: name.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::not_found("/etc/weir/pipelines.toml");
        assert!(err.to_string().contains("/etc/weir/pipelines.toml"));

        let err = ConfigError::InvalidVersion {
            value: "two".into(),
        };
        assert!(err.to_string().contains("two"));

        let err = ConfigError::NoConfigFiles {
            path: "/etc/weir".into(),
        };
        assert!(err.to_string().contains("*.toml"));
    }
}
