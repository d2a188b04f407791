//! Topology error types
//!
//! Two failure tiers with very different blast radii:
//!
//! - [`TopologyError`] aborts an entire assembly run before any pipeline is
//!   built (unloadable document, structural validation failure).
//! - [`BuildError`] is scoped to one pipeline's construction. The builder
//!   catches it, logs it, rolls back that pipeline and its connected
//!   pipelines, and keeps building the rest.

use thiserror::Error;

use weir_plugin::PluginError;

use crate::router::RouterError;

/// Result type for assembly operations
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors that abort an assembly run outright
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The declaration set is structurally invalid
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The configuration document could not be loaded
    #[error(transparent)]
    Configuration(#[from] weir_config::ConfigError),
}

/// Structural validation failures over the whole declaration set
///
/// Raised by the sequencer before any plugin is instantiated; no pipeline
/// is built once one of these is found.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Two pipelines share a name
    #[error("duplicate pipeline name '{name}'")]
    DuplicatePipeline {
        /// The repeated name
        name: String,
    },

    /// A connector references a pipeline that is not declared
    #[error("pipeline '{pipeline}' references undeclared pipeline '{target}' in its {role}")]
    UnknownTarget {
        /// The referencing pipeline
        pipeline: String,
        /// The missing target
        target: String,
        /// "source" or "sink"
        role: &'static str,
    },

    /// Connector references form a cycle
    #[error("pipeline connectors form a cycle: {chain}")]
    ConnectorCycle {
        /// The offending reference chain, e.g. `a -> b -> a`
        chain: String,
    },

    /// The document's version marker is from a different format generation
    #[error("configuration version {found} is not supported by this host (current: {current})")]
    IncompatibleVersion {
        /// Version declared by the document
        found: String,
        /// Version this host handles
        current: String,
    },
}

/// Per-pipeline construction failures
///
/// Never escapes [`TopologyBuilder::assemble`](crate::TopologyBuilder::assemble);
/// observable only through the failed pipeline's absence from the result.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A plugin failed to load
    #[error("pipeline '{pipeline}': {source}")]
    Plugin {
        /// The pipeline being built
        pipeline: String,
        /// Underlying plugin error
        #[source]
        source: PluginError,
    },

    /// A connector's target pipeline failed to build
    #[error("pipeline '{pipeline}': connected pipeline '{target}' is unavailable")]
    ConnectorUnavailable {
        /// The pipeline being built
        pipeline: String,
        /// The upstream pipeline that could not be provided
        target: String,
    },

    /// Connector recursion re-entered a pipeline still being built
    #[error("pipeline '{pipeline}': connector reference to '{target}' loops back into a pipeline under construction")]
    RecursiveConnector {
        /// The pipeline being built
        pipeline: String,
        /// The in-progress pipeline it looped back into
        target: String,
    },

    /// A route condition failed to compile
    #[error("pipeline '{pipeline}': {source}")]
    Router {
        /// The pipeline being built
        pipeline: String,
        /// Underlying condition error
        #[source]
        source: RouterError,
    },
}

impl BuildError {
    pub(crate) fn plugin(pipeline: impl Into<String>, source: PluginError) -> Self {
        Self::Plugin {
            pipeline: pipeline.into(),
            source,
        }
    }

    pub(crate) fn router(pipeline: impl Into<String>, source: RouterError) -> Self {
        Self::Router {
            pipeline: pipeline.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::UnknownTarget {
            pipeline: "enrich".into(),
            target: "ingest".into(),
            role: "source",
        };
        let msg = err.to_string();
        assert!(msg.contains("enrich"));
        assert!(msg.contains("ingest"));
        assert!(msg.contains("source"));

        let err = ValidationError::ConnectorCycle {
            chain: "a -> b -> a".into(),
        };
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_build_error_display() {
        let err = BuildError::ConnectorUnavailable {
            pipeline: "enrich".into(),
            target: "ingest".into(),
        };
        assert!(err.to_string().contains("unavailable"));
    }
}
