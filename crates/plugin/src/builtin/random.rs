//! Random source - emits random string records
//!
//! Useful for smoke-testing a pipeline end to end without any network
//! listener. Emits `{"message": "<random string>"}` records on its own
//! thread at a fixed interval until stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::json;
use tracing::debug;

use weir_model::{Buffer, PluginSetting, Record, Source, SourceError};

use crate::error::Result;
use crate::registry::SourceFactory;

const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
const MESSAGE_LEN: usize = 16;

/// Source emitting random string records at a fixed interval
pub struct RandomSource {
    interval: Duration,
    acknowledgements: bool,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RandomSource {
    /// Create a random source
    pub fn new(interval: Duration, acknowledgements: bool) -> Self {
        Self {
            interval,
            acknowledgements,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }
}

impl Source for RandomSource {
    fn start(&self, buffer: Arc<dyn Buffer>) -> std::result::Result<(), SourceError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let running = Arc::clone(&self.running);
        let interval = self.interval;
        let handle = std::thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                let message: String = rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(MESSAGE_LEN)
                    .map(char::from)
                    .collect();
                let record = Record::new(json!({ "message": message }));
                if let Err(e) = buffer.write(record, interval) {
                    debug!(error = %e, "random source dropped a record");
                }
                std::thread::sleep(interval);
            }
        });

        *self.handle.lock() = Some(handle);
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }

    fn acknowledgements_enabled(&self) -> bool {
        self.acknowledgements
    }
}

/// Factory for the `random` source
///
/// Attributes: `interval_ms` (default 500), `acknowledgments` (default
/// false).
pub struct RandomSourceFactory;

impl SourceFactory for RandomSourceFactory {
    fn create(&self, setting: &PluginSetting) -> Result<Arc<dyn Source>> {
        let interval = setting
            .attribute_i64("interval_ms")
            .map(|ms| Duration::from_millis(ms.max(1) as u64))
            .unwrap_or(DEFAULT_INTERVAL);
        let acknowledgements = setting.attribute_bool("acknowledgments").unwrap_or(false);
        Ok(Arc::new(RandomSource::new(interval, acknowledgements)))
    }
}
