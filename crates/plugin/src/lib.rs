//! Weir - Plugin
//!
//! Plugin registry and factory: configuration-driven component
//! instantiation.
//!
//! # Design
//!
//! - **Config-driven**: a [`PluginSetting`](weir_model::PluginSetting)
//!   names the plugin type; the registry maps type names to factories
//! - **Compile-time extensibility**: hosts implement the per-kind factory
//!   traits and register them
//! - **Type-safe seams**: factories return trait objects
//!   (`Arc<dyn Source>`, `Box<dyn Processor>`, ...)
//! - **Per-worker instantiation**: a processor factory can declare that
//!   each pipeline worker needs its own instance; `load_processors` takes
//!   a count function over that mode
//!
//! # Example
//!
//! ```
//! use weir_plugin::builtin;
//! use weir_plugin::{Instantiation, PluginFactory};
//! use weir_model::PluginSetting;
//!
//! let registry = builtin::default_registry();
//! let sink = registry.load_sink(&PluginSetting::new("null")).unwrap();
//! sink.output(vec![]);
//! ```

pub mod builtin;
mod error;
mod registry;

pub use error::{PluginError, Result};
pub use registry::{
    BufferFactory, ComponentKind, Instantiation, PluginFactory, PluginRegistry, ProcessorFactory,
    SinkFactory, SourceFactory,
};
