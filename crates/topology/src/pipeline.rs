//! The assembled pipeline and its runtime loop
//!
//! A [`Pipeline`] owns one source, one decorated buffer, the processor
//! stage groups, a router and the routed sinks. [`Pipeline::start`] starts
//! the source and spawns the worker threads; each worker repeatedly reads a
//! batch from the buffer, runs it through its processor chain and routes
//! the result to the sinks. [`Pipeline::stop`] stops the source, waits for
//! the buffer and processors to drain within the shutdown timeouts, then
//! joins the workers and shuts the sinks down.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use weir_model::{Buffer, DataFlowComponent, Processor, Sink, Source, SourceError};

use crate::connector::PipelineConnector;
use crate::router::Router;

/// How long each stage of an orderly shutdown may take
#[derive(Debug, Clone, Copy)]
pub struct ShutdownTimeouts {
    /// Buffer drain and processor flush
    pub processor: Duration,
    /// Sink flush
    pub sink: Duration,
    /// Extra time for in-flight peer-forwarded records
    pub peer_drain: Duration,
}

impl Default for ShutdownTimeouts {
    fn default() -> Self {
        Self {
            processor: Duration::from_secs(30),
            sink: Duration::from_secs(30),
            peer_drain: Duration::ZERO,
        }
    }
}

/// What feeds a pipeline: a source plugin or an upstream connector
pub enum PipelineSource {
    /// A real source plugin, the entry point of a chain
    Plugin(Arc<dyn Source>),
    /// The receiving side of a link from an upstream pipeline
    Connector(PipelineConnector),
}

impl PipelineSource {
    /// Whether this pipeline is fed by an upstream pipeline
    pub fn is_connector(&self) -> bool {
        matches!(self, Self::Connector(_))
    }

    /// The connector, when fed by an upstream pipeline
    pub fn as_connector(&self) -> Option<&PipelineConnector> {
        match self {
            Self::Connector(connector) => Some(connector),
            Self::Plugin(_) => None,
        }
    }

    fn as_source(&self) -> &dyn Source {
        match self {
            Self::Plugin(source) => source.as_ref(),
            Self::Connector(connector) => connector,
        }
    }
}

/// One fully assembled, runnable pipeline
pub struct Pipeline {
    name: String,
    source: PipelineSource,
    buffer: Arc<dyn Buffer>,
    /// One group per processor stage; workers pick an instance by index
    processor_sets: Vec<Vec<Arc<dyn Processor>>>,
    sinks: Vec<DataFlowComponent<Arc<dyn Sink>>>,
    router: Router,
    workers: usize,
    read_batch_delay: Duration,
    timeouts: ShutdownTimeouts,
    running: AtomicBool,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: impl Into<String>,
        source: PipelineSource,
        buffer: Arc<dyn Buffer>,
        processor_sets: Vec<Vec<Box<dyn Processor>>>,
        router: Router,
        sinks: Vec<DataFlowComponent<Arc<dyn Sink>>>,
        workers: usize,
        read_batch_delay: Duration,
        timeouts: ShutdownTimeouts,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            buffer,
            processor_sets: processor_sets
                .into_iter()
                .map(|set| set.into_iter().map(Arc::from).collect())
                .collect(),
            sinks,
            router,
            workers,
            read_batch_delay,
            timeouts,
            running: AtomicBool::new(false),
            worker_handles: Mutex::new(Vec::new()),
        }
    }

    /// The pipeline's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What feeds this pipeline
    pub fn source(&self) -> &PipelineSource {
        &self.source
    }

    /// The decorated buffer between source and workers
    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.buffer
    }

    /// The routed sinks
    pub fn sinks(&self) -> &[DataFlowComponent<Arc<dyn Sink>>] {
        &self.sinks
    }

    /// Number of processor stages
    pub fn processor_stages(&self) -> usize {
        self.processor_sets.len()
    }

    /// The compiled route table
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Worker thread count
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Delay bounding one buffer read in the worker loop
    pub fn read_batch_delay(&self) -> Duration {
        self.read_batch_delay
    }

    /// Whether this pipeline's source negotiates acknowledgements
    pub fn acknowledgements_enabled(&self) -> bool {
        self.source.as_source().acknowledgements_enabled()
    }

    /// Whether the pipeline is started
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the source and spawn the worker threads
    ///
    /// Idempotent; a second call on a running pipeline does nothing.
    pub fn start(self: &Arc<Self>) -> Result<(), SourceError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Err(e) = self.source.as_source().start(self.buffer.clone()) {
            self.running.store(false, Ordering::SeqCst);
            return Err(e);
        }

        let mut handles = self.worker_handles.lock();
        for index in 0..self.workers {
            let pipeline = Arc::clone(self);
            let handle = thread::Builder::new()
                .name(format!("{}-worker-{index}", self.name))
                .spawn(move || pipeline.worker_loop(index));
            match handle {
                Ok(handle) => handles.push(handle),
                Err(e) => error!(pipeline = %self.name, error = %e, "failed to spawn worker"),
            }
        }
        info!(pipeline = %self.name, workers = self.workers, "pipeline started");
        Ok(())
    }

    fn worker_loop(&self, index: usize) {
        debug!(pipeline = %self.name, worker = index, "worker running");
        while self.running.load(Ordering::SeqCst) {
            let records = self.buffer.read(self.read_batch_delay);
            if records.is_empty() {
                continue;
            }
            self.run_batch(records, index);
        }
        debug!(pipeline = %self.name, worker = index, "worker exiting");
    }

    fn run_batch(&self, mut records: Vec<weir_model::Record>, worker_index: usize) {
        for set in &self.processor_sets {
            // Shared stages hold one instance, per-worker stages hold one
            // per worker thread.
            let processor = &set[worker_index % set.len()];
            records = processor.execute(records);
            if records.is_empty() {
                return;
            }
        }

        for sink in &self.sinks {
            let selected = self.router.select(&records, sink);
            if !selected.is_empty() {
                sink.component().output(selected);
            }
        }
    }

    /// Stop the source, drain, then shut workers and sinks down
    ///
    /// Idempotent; returns once the pipeline is fully stopped.
    pub fn stop(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        info!(pipeline = %self.name, "stopping pipeline");

        // Cut intake first so the drain below can finish.
        self.source.as_source().stop();

        for set in &self.processor_sets {
            for processor in set {
                processor.prepare_for_shutdown();
            }
        }

        let drain_budget = self.timeouts.processor + self.timeouts.peer_drain;
        if !self.drain(drain_budget) {
            warn!(
                pipeline = %self.name,
                timeout_ms = drain_budget.as_millis() as u64,
                "pipeline did not drain before shutdown timeout, records may be lost"
            );
        }

        self.running.store(false, Ordering::SeqCst);
        let handles = std::mem::take(&mut *self.worker_handles.lock());
        for handle in handles {
            if handle.join().is_err() {
                error!(pipeline = %self.name, "worker panicked");
            }
        }

        for sink in &self.sinks {
            sink.component().shutdown();
        }
        info!(pipeline = %self.name, "pipeline stopped");
    }

    /// Wait for the buffer to empty and processors to flush; true when done
    fn drain(&self, budget: Duration) -> bool {
        let deadline = Instant::now() + budget;
        loop {
            let drained = self.buffer.is_empty()
                && self
                    .processor_sets
                    .iter()
                    .flatten()
                    .all(|p| p.is_ready_for_shutdown());
            if drained {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(20));
        }
    }
}

/// Assembled pipelines, iterable in build order
#[derive(Default)]
pub struct PipelineMap {
    order: Vec<String>,
    pipelines: HashMap<String, Arc<Pipeline>>,
}

impl std::fmt::Debug for PipelineMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineMap")
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl PipelineMap {
    /// Add a pipeline at the end of the build order
    pub(crate) fn insert(&mut self, pipeline: Arc<Pipeline>) {
        let name = pipeline.name().to_string();
        if self.pipelines.insert(name.clone(), pipeline).is_none() {
            self.order.push(name);
        }
    }

    /// Remove a pipeline, keeping the order of the rest
    pub(crate) fn remove(&mut self, name: &str) -> Option<Arc<Pipeline>> {
        let removed = self.pipelines.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    /// Look up a pipeline by name
    pub fn get(&self, name: &str) -> Option<&Arc<Pipeline>> {
        self.pipelines.get(name)
    }

    /// Whether a pipeline with `name` was assembled
    pub fn contains(&self, name: &str) -> bool {
        self.pipelines.contains_key(name)
    }

    /// Number of assembled pipelines
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no pipeline survived assembly
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Pipeline names in build order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Pipelines in build order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Pipeline>> {
        self.order.iter().filter_map(|name| self.pipelines.get(name))
    }

    /// Pipelines in reverse build order (shutdown order)
    pub fn iter_reverse(&self) -> impl Iterator<Item = &Arc<Pipeline>> {
        self.order
            .iter()
            .rev()
            .filter_map(|name| self.pipelines.get(name))
    }
}
