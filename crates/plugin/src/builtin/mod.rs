//! Built-in plugins
//!
//! A small set of plugins that ship with the host, enough to stand up a
//! working pipeline without external services:
//!
//! - `random` source - emits random string records at an interval
//! - `blocking` buffer - bounded in-memory queue with blocking writes
//! - `noop` processor - pass-through
//! - `string_converter` processor - upper/lowercases string payloads
//! - `stdout` sink - JSON lines to stdout
//! - `null` sink - discards everything (benchmarking, routing validation)

mod blocking;
mod null;
mod noop;
mod random;
mod stdout;
mod string_converter;

pub use blocking::{BlockingBuffer, BlockingBufferFactory};
pub use null::{NullSink, NullSinkFactory};
pub use noop::{NoopProcessor, NoopProcessorFactory};
pub use random::{RandomSource, RandomSourceFactory};
pub use stdout::{StdoutSink, StdoutSinkFactory};
pub use string_converter::{StringConverterFactory, StringConverterProcessor};

use crate::registry::PluginRegistry;

/// A registry with every built-in plugin registered
pub fn default_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register_source("random", RandomSourceFactory);
    registry.register_buffer("blocking", BlockingBufferFactory);
    registry.register_processor("noop", NoopProcessorFactory);
    registry.register_processor("string_converter", StringConverterFactory);
    registry.register_sink("stdout", StdoutSinkFactory);
    registry.register_sink("null", NullSinkFactory);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PluginFactory;
    use weir_model::PluginSetting;

    #[test]
    fn test_default_registry_has_builtins() {
        let registry = default_registry();
        assert!(registry.load_source(&PluginSetting::new("random")).is_ok());
        assert!(registry.load_buffer(&PluginSetting::new("blocking")).is_ok());
        assert!(registry.load_sink(&PluginSetting::new("stdout")).is_ok());
        assert!(registry.load_sink(&PluginSetting::new("null")).is_ok());

        let processors = registry
            .load_processors(&PluginSetting::new("noop"), &|_| 1)
            .unwrap();
        assert_eq!(processors.len(), 1);
    }
}
