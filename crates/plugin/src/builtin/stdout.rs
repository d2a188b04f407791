//! Stdout sink - JSON lines to standard output

use std::sync::Arc;

use weir_model::{PluginSetting, Record, Sink};

use crate::error::Result;
use crate::registry::SinkFactory;

/// Sink printing each record as one JSON line
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn output(&self, records: Vec<Record>) {
        for record in records {
            if let Ok(line) = serde_json::to_string(record.data()) {
                println!("{line}");
            }
        }
    }
}

/// Factory for the `stdout` sink
pub struct StdoutSinkFactory;

impl SinkFactory for StdoutSinkFactory {
    fn create(&self, _setting: &PluginSetting) -> Result<Arc<dyn Sink>> {
        Ok(Arc::new(StdoutSink))
    }
}
