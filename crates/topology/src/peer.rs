//! Peer forwarding seams
//!
//! Stateful processors may need to see all records for a partition key,
//! even when those records entered through another host. The builder stays
//! agnostic of how that happens: a [`PeerForwarderProvider`] contributes
//! receive buffers (fanned into the pipeline's buffer) and wraps processor
//! chains that require forwarding. The default [`LocalPeerForwarder`] is
//! the single-host case and contributes nothing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use weir_model::{Buffer, Processor};

/// Integration point for cross-host record forwarding
pub trait PeerForwarderProvider: Send + Sync {
    /// Buffers receiving records forwarded from peers for `pipeline_name`,
    /// keyed by the forwarding plugin they serve
    fn receive_buffers_for(&self, pipeline_name: &str) -> HashMap<String, Arc<dyn Buffer>>;

    /// Wrap a processor chain whose head requires peer forwarding
    ///
    /// Called once per processor group whose instances report
    /// [`requires_peer_forwarding`](Processor::requires_peer_forwarding).
    fn decorate_processors(
        &self,
        processors: Vec<Box<dyn Processor>>,
        pipeline_name: &str,
        plugin_name: &str,
        workers: usize,
    ) -> Vec<Box<dyn Processor>>;

    /// Extra time granted at shutdown for in-flight forwarded records
    fn drain_timeout(&self) -> Option<Duration> {
        None
    }
}

/// Single-host provider: no receive buffers, chains pass through unwrapped
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPeerForwarder;

impl PeerForwarderProvider for LocalPeerForwarder {
    fn receive_buffers_for(&self, _pipeline_name: &str) -> HashMap<String, Arc<dyn Buffer>> {
        HashMap::new()
    }

    fn decorate_processors(
        &self,
        processors: Vec<Box<dyn Processor>>,
        _pipeline_name: &str,
        _plugin_name: &str,
        _workers: usize,
    ) -> Vec<Box<dyn Processor>> {
        processors
    }
}
