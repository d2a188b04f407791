//! Noop processor - pass-through
//!
//! Passes batches through unchanged. Useful for testing the stage-group
//! infrastructure and as a placeholder during development.

use weir_model::{PluginSetting, Processor, Record};

use crate::error::Result;
use crate::registry::ProcessorFactory;

/// A processor that passes records through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProcessor;

impl Processor for NoopProcessor {
    fn execute(&self, records: Vec<Record>) -> Vec<Record> {
        records
    }
}

/// Factory for the `noop` processor
pub struct NoopProcessorFactory;

impl ProcessorFactory for NoopProcessorFactory {
    fn create(&self, _setting: &PluginSetting) -> Result<Box<dyn Processor>> {
        Ok(Box::new(NoopProcessor))
    }
}
