//! Null sink - discards all data
//!
//! Receives batches, counts them, and drops the data. Useful for measuring
//! pipeline throughput without sink I/O and for validating routing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use weir_model::{PluginSetting, Record, Sink};

use crate::error::Result;
use crate::registry::SinkFactory;

/// Sink that discards every record it receives
#[derive(Debug, Default)]
pub struct NullSink {
    discarded: AtomicU64,
}

impl NullSink {
    /// Create a null sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records discarded
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

impl Sink for NullSink {
    fn output(&self, records: Vec<Record>) {
        self.discarded
            .fetch_add(records.len() as u64, Ordering::Relaxed);
    }
}

/// Factory for the `null` sink
pub struct NullSinkFactory;

impl SinkFactory for NullSinkFactory {
    fn create(&self, _setting: &PluginSetting) -> Result<Arc<dyn Sink>> {
        Ok(Arc::new(NullSink::new()))
    }
}
