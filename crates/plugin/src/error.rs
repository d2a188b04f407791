//! Plugin error types

use thiserror::Error;

use crate::registry::ComponentKind;

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;

/// Errors raised while loading plugins
#[derive(Debug, Error)]
pub enum PluginError {
    /// No factory registered under this type name
    #[error("unknown {kind} plugin '{name}'")]
    UnknownPlugin {
        /// Component kind being loaded
        kind: ComponentKind,
        /// The unrecognized type name
        name: String,
    },

    /// The factory rejected the provided settings
    #[error("{kind} plugin '{name}' rejected its configuration: {message}")]
    InvalidConfiguration {
        /// Component kind being loaded
        kind: ComponentKind,
        /// Plugin type name
        name: String,
        /// What was wrong
        message: String,
    },
}

impl PluginError {
    /// Create an UnknownPlugin error
    pub fn unknown(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self::UnknownPlugin {
            kind,
            name: name.into(),
        }
    }

    /// Create an InvalidConfiguration error
    pub fn invalid_configuration(
        kind: ComponentKind,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidConfiguration {
            kind,
            name: name.into(),
            message: message.into(),
        }
    }
}
