//! Plugin registry - dynamic component creation
//!
//! The registry maps plugin type names to factory functions per component
//! kind, enabling configuration-driven instantiation. The topology builder
//! consumes it through the [`PluginFactory`] trait so tests can substitute
//! failing or counting factories.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use weir_model::{Buffer, PluginSetting, Processor, Sink, Source};

use crate::error::{PluginError, Result};

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;

/// The four component kinds a plugin can provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Record producer
    Source,
    /// Record queue
    Buffer,
    /// Record rewriter
    Processor,
    /// Record deliverer
    Sink,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Source => "source",
            Self::Buffer => "buffer",
            Self::Processor => "processor",
            Self::Sink => "sink",
        };
        f.write_str(s)
    }
}

/// How many instances of a processor one pipeline needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Instantiation {
    /// One instance shared by all workers
    #[default]
    Shared,
    /// One instance per worker thread (the plugin holds per-thread state)
    PerWorker,
}

/// Factory for source plugins
pub trait SourceFactory: Send + Sync {
    /// Create a source from its settings
    fn create(&self, setting: &PluginSetting) -> Result<Arc<dyn Source>>;
}

/// Factory for buffer plugins
pub trait BufferFactory: Send + Sync {
    /// Create a buffer from its settings
    fn create(&self, setting: &PluginSetting) -> Result<Arc<dyn Buffer>>;
}

/// Factory for processor plugins
pub trait ProcessorFactory: Send + Sync {
    /// Create one processor instance from its settings
    fn create(&self, setting: &PluginSetting) -> Result<Box<dyn Processor>>;

    /// How many instances a pipeline should hold
    fn instantiation(&self) -> Instantiation {
        Instantiation::Shared
    }
}

/// Factory for sink plugins
pub trait SinkFactory: Send + Sync {
    /// Create a sink from its settings
    fn create(&self, setting: &PluginSetting) -> Result<Arc<dyn Sink>>;
}

/// The loading contract the topology builder consumes
///
/// `load_processors` is the `load_many` operation: the count function
/// receives the factory's instantiation mode and decides how many instances
/// to create (the builder passes the pipeline's worker count for
/// [`Instantiation::PerWorker`] plugins).
pub trait PluginFactory: Send + Sync {
    /// Load a source plugin
    fn load_source(&self, setting: &PluginSetting) -> Result<Arc<dyn Source>>;

    /// Load a buffer plugin
    fn load_buffer(&self, setting: &PluginSetting) -> Result<Arc<dyn Buffer>>;

    /// Load a sink plugin
    fn load_sink(&self, setting: &PluginSetting) -> Result<Arc<dyn Sink>>;

    /// Load one or more processor instances from a single settings entry
    fn load_processors(
        &self,
        setting: &PluginSetting,
        count: &dyn Fn(Instantiation) -> usize,
    ) -> Result<Vec<Box<dyn Processor>>>;
}

/// Registry mapping plugin type names to factories
///
/// Registration panics on duplicate names: two plugins claiming one type
/// name is a programming error, not a runtime condition.
#[derive(Default)]
pub struct PluginRegistry {
    sources: HashMap<String, Box<dyn SourceFactory>>,
    buffers: HashMap<String, Box<dyn BufferFactory>>,
    processors: HashMap<String, Box<dyn ProcessorFactory>>,
    sinks: HashMap<String, Box<dyn SinkFactory>>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source factory
    ///
    /// # Panics
    /// Panics if a source factory is already registered under `name`.
    pub fn register_source<F: SourceFactory + 'static>(&mut self, name: &str, factory: F) {
        if self
            .sources
            .insert(name.to_string(), Box::new(factory))
            .is_some()
        {
            panic!("source plugin '{name}' already registered");
        }
    }

    /// Register a buffer factory
    ///
    /// # Panics
    /// Panics if a buffer factory is already registered under `name`.
    pub fn register_buffer<F: BufferFactory + 'static>(&mut self, name: &str, factory: F) {
        if self
            .buffers
            .insert(name.to_string(), Box::new(factory))
            .is_some()
        {
            panic!("buffer plugin '{name}' already registered");
        }
    }

    /// Register a processor factory
    ///
    /// # Panics
    /// Panics if a processor factory is already registered under `name`.
    pub fn register_processor<F: ProcessorFactory + 'static>(&mut self, name: &str, factory: F) {
        if self
            .processors
            .insert(name.to_string(), Box::new(factory))
            .is_some()
        {
            panic!("processor plugin '{name}' already registered");
        }
    }

    /// Register a sink factory
    ///
    /// # Panics
    /// Panics if a sink factory is already registered under `name`.
    pub fn register_sink<F: SinkFactory + 'static>(&mut self, name: &str, factory: F) {
        if self
            .sinks
            .insert(name.to_string(), Box::new(factory))
            .is_some()
        {
            panic!("sink plugin '{name}' already registered");
        }
    }

    /// Registered source type names (sorted, for error messages)
    pub fn known_sources(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered sink type names (sorted, for error messages)
    pub fn known_sinks(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.sinks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl PluginFactory for PluginRegistry {
    fn load_source(&self, setting: &PluginSetting) -> Result<Arc<dyn Source>> {
        self.sources
            .get(setting.name())
            .ok_or_else(|| PluginError::unknown(ComponentKind::Source, setting.name()))?
            .create(setting)
    }

    fn load_buffer(&self, setting: &PluginSetting) -> Result<Arc<dyn Buffer>> {
        self.buffers
            .get(setting.name())
            .ok_or_else(|| PluginError::unknown(ComponentKind::Buffer, setting.name()))?
            .create(setting)
    }

    fn load_sink(&self, setting: &PluginSetting) -> Result<Arc<dyn Sink>> {
        self.sinks
            .get(setting.name())
            .ok_or_else(|| PluginError::unknown(ComponentKind::Sink, setting.name()))?
            .create(setting)
    }

    fn load_processors(
        &self,
        setting: &PluginSetting,
        count: &dyn Fn(Instantiation) -> usize,
    ) -> Result<Vec<Box<dyn Processor>>> {
        let factory = self
            .processors
            .get(setting.name())
            .ok_or_else(|| PluginError::unknown(ComponentKind::Processor, setting.name()))?;

        let instances = count(factory.instantiation()).max(1);
        let mut processors = Vec::with_capacity(instances);
        for _ in 0..instances {
            processors.push(factory.create(setting)?);
        }
        Ok(processors)
    }
}
