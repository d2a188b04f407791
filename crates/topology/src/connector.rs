//! Pipeline connectors
//!
//! A connector links two pipelines in the same process: the upstream
//! pipeline holds it as a sink, the downstream pipeline holds the same
//! connector as its source. Writing to the sink side delivers records
//! straight into the downstream pipeline's buffer.
//!
//! A connector reference in a declaration is a `pipeline` component whose
//! `name` attribute carries the peer pipeline's name. During assembly the
//! two sides are resolved to one shared [`PipelineConnector`] through the
//! run-scoped [`ConnectorRegistry`], keyed by the downstream pipeline's
//! name.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::warn;

use weir_model::{Buffer, PluginSetting, Record, Sink, Source, SourceError};

/// Component type that marks a connector reference
pub const PIPELINE_PLUGIN: &str = "pipeline";

/// Attribute naming the peer pipeline
const TARGET_ATTRIBUTE: &str = "name";

/// Bound on one delivery into the downstream buffer
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Extract the target pipeline name when `setting` is a connector reference
pub fn pipeline_target(setting: &PluginSetting) -> Option<&str> {
    if setting.name() == PIPELINE_PLUGIN {
        setting.attribute_str(TARGET_ATTRIBUTE)
    } else {
        None
    }
}

/// In-process link between an upstream pipeline's sink slot and a
/// downstream pipeline's source slot
///
/// Cloning yields a handle to the same link, so the sink side and the
/// source side observe one shared state.
#[derive(Clone)]
pub struct PipelineConnector {
    inner: Arc<ConnectorInner>,
}

struct ConnectorInner {
    /// Downstream pipeline this connector delivers into
    target: String,
    /// Upstream pipeline name, stamped at source-side resolution
    upstream: RwLock<Option<String>>,
    /// Whether the chain head's source negotiates acknowledgements
    acknowledgements: AtomicBool,
    /// Downstream buffer, present once the source side has started
    buffer: RwLock<Option<Arc<dyn Buffer>>>,
}

impl PipelineConnector {
    /// Create a connector delivering into the pipeline named `target`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ConnectorInner {
                target: target.into(),
                upstream: RwLock::new(None),
                acknowledgements: AtomicBool::new(false),
                buffer: RwLock::new(None),
            }),
        }
    }

    /// The downstream pipeline this connector feeds
    pub fn target(&self) -> &str {
        &self.inner.target
    }

    /// The upstream pipeline, once the source side has resolved
    pub fn upstream(&self) -> Option<String> {
        self.inner.upstream.read().clone()
    }

    /// Record which pipeline feeds this connector
    pub fn set_upstream(&self, name: impl Into<String>) {
        *self.inner.upstream.write() = Some(name.into());
    }

    /// Propagate the upstream source's acknowledgement setting
    pub fn enable_acknowledgements(&self) {
        self.inner.acknowledgements.store(true, Ordering::Relaxed);
    }

    /// Whether the downstream side has started and can accept records
    pub fn is_ready(&self) -> bool {
        self.inner.buffer.read().is_some()
    }
}

impl Source for PipelineConnector {
    fn start(&self, buffer: Arc<dyn Buffer>) -> Result<(), SourceError> {
        *self.inner.buffer.write() = Some(buffer);
        Ok(())
    }

    fn stop(&self) {
        // Stop accepting; the upstream sink side drops further batches.
        *self.inner.buffer.write() = None;
    }

    fn acknowledgements_enabled(&self) -> bool {
        self.inner.acknowledgements.load(Ordering::Relaxed)
    }
}

impl Sink for PipelineConnector {
    fn output(&self, records: Vec<Record>) {
        let buffer = self.inner.buffer.read().clone();
        let Some(buffer) = buffer else {
            warn!(
                target_pipeline = %self.inner.target,
                dropped = records.len(),
                "connected pipeline is not accepting records, dropping batch"
            );
            return;
        };

        let count = records.len();
        if let Err(e) = buffer.write_all(records, WRITE_TIMEOUT) {
            warn!(
                target_pipeline = %self.inner.target,
                dropped = count,
                error = %e,
                "failed to deliver batch to connected pipeline"
            );
        }
    }
}

/// Connectors created during one assembly run, keyed by the downstream
/// pipeline's name
///
/// Whichever side of a link resolves first creates the entry; the other
/// side picks up the same connector.
#[derive(Default)]
pub struct ConnectorRegistry {
    entries: HashMap<String, PipelineConnector>,
}

impl ConnectorRegistry {
    /// The connector delivering into `target`, creating it if absent
    pub fn get_or_create(&mut self, target: &str) -> PipelineConnector {
        self.entries
            .entry(target.to_string())
            .or_insert_with(|| PipelineConnector::new(target))
            .clone()
    }

    /// The connector delivering into `target`, if one was resolved
    pub fn get(&self, target: &str) -> Option<&PipelineConnector> {
        self.entries.get(target)
    }

    /// Drop the connector delivering into `target` (pipeline rollback)
    pub fn remove(&mut self, target: &str) -> Option<PipelineConnector> {
        self.entries.remove(target)
    }

    /// Number of live connectors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no connectors were resolved
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
