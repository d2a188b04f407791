//! Pipeline declarations
//!
//! A [`PipelineDeclaration`] is the immutable, parsed description of one
//! pipeline: its name, component plugin settings, route declarations,
//! worker count and read batch delay. Declarations are produced once from
//! the configuration document and never mutated; the topology builder may
//! only drop whole declarations from its working set during rollback.

use std::time::Duration;

use crate::setting::{PluginSetting, RoutedPluginSetting};

/// Default number of processor worker threads per pipeline
pub const DEFAULT_WORKERS: usize = 1;

/// Default delay bounding one buffer read in the worker loop
pub const DEFAULT_READ_BATCH_DELAY: Duration = Duration::from_millis(3000);

/// A named route: records matching `condition` carry the route name through
/// the router to any sink gated on it
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDeclaration {
    /// Route name referenced by sink `routes` lists
    pub name: String,

    /// Condition expression (`"log.level == \"error\""`, `"status exists"`)
    pub condition: String,
}

impl RouteDeclaration {
    /// Create a route declaration
    pub fn new(name: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: condition.into(),
        }
    }
}

/// Immutable per-pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineDeclaration {
    name: String,
    source: PluginSetting,
    buffer: PluginSetting,
    processors: Vec<PluginSetting>,
    sinks: Vec<RoutedPluginSetting>,
    routes: Vec<RouteDeclaration>,
    workers: usize,
    read_batch_delay: Duration,
}

impl PipelineDeclaration {
    /// Create a declaration with default workers, delay, and no processors
    /// or routes
    pub fn new(
        name: impl Into<String>,
        source: PluginSetting,
        buffer: PluginSetting,
        sinks: Vec<RoutedPluginSetting>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            buffer,
            processors: Vec::new(),
            sinks,
            routes: Vec::new(),
            workers: DEFAULT_WORKERS,
            read_batch_delay: DEFAULT_READ_BATCH_DELAY,
        }
    }

    /// Set the processor chain (builder style)
    pub fn with_processors(mut self, processors: Vec<PluginSetting>) -> Self {
        self.processors = processors;
        self
    }

    /// Set the route declarations (builder style)
    pub fn with_routes(mut self, routes: Vec<RouteDeclaration>) -> Self {
        self.routes = routes;
        self
    }

    /// Set the worker count (builder style)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the read batch delay (builder style)
    pub fn with_read_batch_delay(mut self, delay: Duration) -> Self {
        self.read_batch_delay = delay;
        self
    }

    /// Pipeline name (unique key in the declaration set)
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source plugin setting
    #[inline]
    pub fn source(&self) -> &PluginSetting {
        &self.source
    }

    /// Buffer plugin setting
    #[inline]
    pub fn buffer(&self) -> &PluginSetting {
        &self.buffer
    }

    /// Ordered processor plugin settings
    #[inline]
    pub fn processors(&self) -> &[PluginSetting] {
        &self.processors
    }

    /// Ordered sink plugin settings with their route sets
    #[inline]
    pub fn sinks(&self) -> &[RoutedPluginSetting] {
        &self.sinks
    }

    /// Route declarations for the router
    #[inline]
    pub fn routes(&self) -> &[RouteDeclaration] {
        &self.routes
    }

    /// Number of processor worker threads
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Delay bounding one buffer read in the worker loop
    #[inline]
    pub fn read_batch_delay(&self) -> Duration {
        self.read_batch_delay
    }
}
