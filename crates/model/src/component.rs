//! Component contracts
//!
//! The four trait-object seams every plugin implements. The topology
//! builder only ever handles these as `Arc<dyn _>` / `Box<dyn _>`; concrete
//! behavior (network listeners, disk staging, object-store uploads) lives
//! behind them.
//!
//! # Threading
//!
//! All components are `Send + Sync`: a pipeline's worker threads share its
//! processors and sinks, and a buffer's write path may be shared through
//! the fan-out decoration.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{BufferError, SourceError};
use crate::record::Record;

/// Produces records into a pipeline's buffer
pub trait Source: Send + Sync {
    /// Start producing into `buffer`
    ///
    /// Returns once production is running (implementations spawn their own
    /// threads or register the buffer for later writes).
    fn start(&self, buffer: Arc<dyn Buffer>) -> Result<(), SourceError>;

    /// Stop producing; must be idempotent
    fn stop(&self);

    /// Whether this source tracks end-to-end acknowledgements
    ///
    /// Connectors feeding a pipeline whose source reports `true` must also
    /// report `true`, preserving at-least-once delivery across the hop.
    fn acknowledgements_enabled(&self) -> bool {
        false
    }
}

/// Queues records between a source and a pipeline's workers
pub trait Buffer: Send + Sync {
    /// Write one record, waiting up to `timeout` for capacity
    fn write(&self, record: Record, timeout: Duration) -> Result<(), BufferError>;

    /// Write a batch of records, waiting up to `timeout` for capacity
    ///
    /// The default implementation writes records one at a time and stops at
    /// the first failure.
    fn write_all(&self, records: Vec<Record>, timeout: Duration) -> Result<(), BufferError> {
        for record in records {
            self.write(record, timeout)?;
        }
        Ok(())
    }

    /// Read a batch, waiting up to `timeout` for data
    ///
    /// An empty batch means the wait elapsed with nothing to read.
    fn read(&self, timeout: Duration) -> Vec<Record>;

    /// Whether the buffer holds no records
    ///
    /// Used by shutdown to decide when the pipeline has drained.
    fn is_empty(&self) -> bool;
}

/// Rewrites batches of records between the buffer and the router
pub trait Processor: Send + Sync {
    /// Process a batch, returning the records to pass downstream
    fn execute(&self, records: Vec<Record>) -> Vec<Record>;

    /// Whether this processor needs records distributed across peers
    ///
    /// When the first instance of a stage group reports `true`, the whole
    /// group is wrapped by the peer forwarder provider at assembly time.
    fn requires_peer_forwarding(&self) -> bool {
        false
    }

    /// Signal that shutdown is imminent; flush any held state
    fn prepare_for_shutdown(&self) {}

    /// Whether the processor has no in-flight state left
    fn is_ready_for_shutdown(&self) -> bool {
        true
    }
}

/// Delivers records out of a pipeline
pub trait Sink: Send + Sync {
    /// Deliver a batch of records
    fn output(&self, records: Vec<Record>);

    /// Flush and release resources; must be idempotent
    fn shutdown(&self) {}
}

impl std::fmt::Debug for dyn Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Source")
    }
}

impl std::fmt::Debug for dyn Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Buffer")
    }
}

impl std::fmt::Debug for dyn Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Sink")
    }
}

/// A sink paired with the set of route names gating which records reach it
///
/// An empty route set means the component receives all records.
#[derive(Debug, Clone)]
pub struct DataFlowComponent<T> {
    component: T,
    routes: HashSet<String>,
}

impl<T> DataFlowComponent<T> {
    /// Pair a component with its route names
    pub fn new(component: T, routes: impl IntoIterator<Item = String>) -> Self {
        Self {
            component,
            routes: routes.into_iter().collect(),
        }
    }

    /// The wrapped component
    #[inline]
    pub fn component(&self) -> &T {
        &self.component
    }

    /// The route names gating this component
    #[inline]
    pub fn routes(&self) -> &HashSet<String> {
        &self.routes
    }

    /// Whether this component receives every record
    #[inline]
    pub fn accepts_all(&self) -> bool {
        self.routes.is_empty()
    }
}
