//! Topology builder
//!
//! Turns a validated declaration set into runnable [`Pipeline`]s. Assembly
//! walks the sequencer's order; when a pipeline's source references an
//! upstream pipeline that is not built yet, the builder recurses into the
//! upstream first, so a chain always comes up head-first.
//!
//! Failure isolation is the core contract: one pipeline failing to build
//! never aborts the run. The failure is logged once, the pipeline and every
//! pipeline connected to it (upstream and downstream, transitively) are
//! rolled back, and assembly continues with the remaining declarations.
//! Disconnected pipelines are unaffected.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info};

use weir_config::{Config, DocumentVersion};
use weir_model::{DataFlowComponent, PipelineDeclaration, Sink};
use weir_plugin::{Instantiation, PluginFactory};

use crate::breaker::CircuitBreakerManager;
use crate::buffer::decorate_buffer;
use crate::connector::{ConnectorRegistry, PipelineConnector, pipeline_target};
use crate::error::{BuildError, Result, ValidationError};
use crate::peer::{LocalPeerForwarder, PeerForwarderProvider};
use crate::pipeline::{Pipeline, PipelineMap, PipelineSource, ShutdownTimeouts};
use crate::router::{DefaultRouterFactory, RouterFactory};
use crate::sequencer;

/// Assembles pipeline topologies from declarations
pub struct TopologyBuilder {
    plugins: Arc<dyn PluginFactory>,
    peer_forwarder: Arc<dyn PeerForwarderProvider>,
    breakers: CircuitBreakerManager,
    router_factory: Arc<dyn RouterFactory>,
    timeouts: ShutdownTimeouts,
}

impl TopologyBuilder {
    /// A builder loading plugins from `plugins`, with local peer
    /// forwarding, no circuit breaker and the built-in route language
    pub fn new(plugins: Arc<dyn PluginFactory>) -> Self {
        Self {
            plugins,
            peer_forwarder: Arc::new(LocalPeerForwarder),
            breakers: CircuitBreakerManager::disabled(),
            router_factory: Arc::new(DefaultRouterFactory),
            timeouts: ShutdownTimeouts::default(),
        }
    }

    /// Use a cross-host peer forwarding provider
    pub fn with_peer_forwarder(mut self, provider: Arc<dyn PeerForwarderProvider>) -> Self {
        self.peer_forwarder = provider;
        self
    }

    /// Gate entry-point pipelines with circuit breakers
    pub fn with_circuit_breakers(mut self, breakers: CircuitBreakerManager) -> Self {
        self.breakers = breakers;
        self
    }

    /// Use a different route condition language
    pub fn with_router_factory(mut self, factory: Arc<dyn RouterFactory>) -> Self {
        self.router_factory = factory;
        self
    }

    /// Override the shutdown stage timeouts
    pub fn with_shutdown_timeouts(mut self, timeouts: ShutdownTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Load a configuration document and assemble its topology
    ///
    /// # Errors
    ///
    /// Returns an error when the document cannot be loaded, declares an
    /// unsupported version, or fails structural validation.
    pub fn assemble_from_file<P: AsRef<Path>>(&self, path: P) -> Result<PipelineMap> {
        let config = Config::from_file(path)?;

        if let Some(version) = config.version()
            && !version.compatible_with(&DocumentVersion::CURRENT)
        {
            return Err(ValidationError::IncompatibleVersion {
                found: version.to_string(),
                current: DocumentVersion::CURRENT.to_string(),
            }
            .into());
        }

        self.assemble(config.into_declarations())
    }

    /// Assemble every pipeline in `declarations`
    ///
    /// The returned map holds the pipelines that built successfully, in
    /// build order. Pipelines rolled back after a construction failure are
    /// simply absent.
    ///
    /// # Errors
    ///
    /// Returns an error only for structural validation failures; individual
    /// construction failures are logged and rolled back instead.
    pub fn assemble(&self, declarations: Vec<PipelineDeclaration>) -> Result<PipelineMap> {
        let order = sequencer::sequence(&declarations)?;
        info!(pipelines = declarations.len(), "assembling topology");

        let mut ctx = AssemblyContext::new(declarations);
        for name in &order {
            // Skip pipelines already built through upstream recursion or
            // rolled back by an earlier failure.
            if !ctx.pipelines.contains(name) && ctx.declarations.contains_key(name) {
                self.build_pipeline(name, &mut ctx);
            }
        }

        info!(
            built = ctx.pipelines.len(),
            dropped = order.len() - ctx.pipelines.len(),
            "topology assembled"
        );
        Ok(ctx.pipelines)
    }

    /// Build one pipeline, rolling back its connected pipelines on failure
    fn build_pipeline(&self, name: &str, ctx: &mut AssemblyContext) {
        let Some(declaration) = ctx.declarations.get(name).cloned() else {
            return;
        };
        info!(pipeline = %name, "building pipeline");

        ctx.in_progress.insert(name.to_string());
        let result = self.try_build(&declaration, ctx);
        ctx.in_progress.remove(name);

        match result {
            Ok(pipeline) => ctx.pipelines.insert(pipeline),
            Err(e) => {
                error!(
                    pipeline = %name,
                    error = %e,
                    "pipeline construction failed, removing it and its connected pipelines"
                );
                remove_connected(name, ctx);
            }
        }
    }

    fn try_build(
        &self,
        declaration: &PipelineDeclaration,
        ctx: &mut AssemblyContext,
    ) -> std::result::Result<Arc<Pipeline>, BuildError> {
        let name = declaration.name();
        let workers = declaration.workers();

        let source = match pipeline_target(declaration.source()) {
            Some(target) => {
                PipelineSource::Connector(self.resolve_source_connector(name, target, ctx)?)
            }
            None => PipelineSource::Plugin(
                self.plugins
                    .load_source(declaration.source())
                    .map_err(|e| BuildError::plugin(name, e))?,
            ),
        };

        debug!(pipeline = %name, buffer = %declaration.buffer().name(), "building buffer");
        let primary = self
            .plugins
            .load_buffer(declaration.buffer())
            .map_err(|e| BuildError::plugin(name, e))?;

        debug!(pipeline = %name, stages = declaration.processors().len(), "building processors");
        let mut processor_sets = Vec::with_capacity(declaration.processors().len());
        for setting in declaration.processors() {
            let instances = self
                .plugins
                .load_processors(setting, &|mode| match mode {
                    Instantiation::PerWorker => workers,
                    Instantiation::Shared => 1,
                })
                .map_err(|e| BuildError::plugin(name, e))?;

            // Instances of one stage come from one factory, so the first
            // speaks for the group.
            let group = if instances.first().is_some_and(|p| p.requires_peer_forwarding()) {
                self.peer_forwarder
                    .decorate_processors(instances, name, setting.name(), workers)
            } else {
                instances
            };
            processor_sets.push(group);
        }

        debug!(pipeline = %name, sinks = declaration.sinks().len(), "building sinks");
        let mut sinks = Vec::with_capacity(declaration.sinks().len());
        for routed in declaration.sinks() {
            let sink: Arc<dyn Sink> = match pipeline_target(routed.setting()) {
                Some(target) => Arc::new(ctx.connectors.get_or_create(target)),
                None => self
                    .plugins
                    .load_sink(routed.setting())
                    .map_err(|e| BuildError::plugin(name, e))?,
            };
            sinks.push(DataFlowComponent::new(sink, routed.routes().iter().cloned()));
        }

        let secondaries: Vec<_> = self
            .peer_forwarder
            .receive_buffers_for(name)
            .into_values()
            .collect();
        let buffer = decorate_buffer(
            primary,
            secondaries,
            source.is_connector(),
            self.breakers.global_breaker(),
        );

        let router = self
            .router_factory
            .build(declaration.routes())
            .map_err(|e| BuildError::router(name, e))?;

        let timeouts = ShutdownTimeouts {
            peer_drain: self.peer_forwarder.drain_timeout().unwrap_or_default(),
            ..self.timeouts
        };

        Ok(Arc::new(Pipeline::new(
            name,
            source,
            buffer,
            processor_sets,
            router,
            sinks,
            workers,
            declaration.read_batch_delay(),
            timeouts,
        )))
    }

    /// Resolve the connector feeding a pipeline whose source references
    /// `target`, building the upstream pipeline first when needed
    fn resolve_source_connector(
        &self,
        name: &str,
        target: &str,
        ctx: &mut AssemblyContext,
    ) -> std::result::Result<PipelineConnector, BuildError> {
        if ctx.in_progress.contains(target) {
            return Err(BuildError::RecursiveConnector {
                pipeline: name.to_string(),
                target: target.to_string(),
            });
        }

        if !ctx.pipelines.contains(target) && ctx.declarations.contains_key(target) {
            debug!(pipeline = %name, upstream = %target, "building upstream pipeline first");
            self.build_pipeline(target, ctx);
        }

        let Some(upstream) = ctx.pipelines.get(target) else {
            return Err(BuildError::ConnectorUnavailable {
                pipeline: name.to_string(),
                target: target.to_string(),
            });
        };
        let acknowledgements = upstream.acknowledgements_enabled();

        // Keyed by the downstream pipeline, i.e. this one. The upstream's
        // sink side may already have created the entry.
        let connector = ctx.connectors.get_or_create(name);
        connector.set_upstream(target);
        if acknowledgements {
            connector.enable_acknowledgements();
        }
        Ok(connector)
    }
}

/// Working state for one assembly run
struct AssemblyContext {
    /// Declarations not yet consumed; rollback removes entries so a failed
    /// pipeline is never retried
    declarations: HashMap<String, PipelineDeclaration>,
    pipelines: PipelineMap,
    connectors: ConnectorRegistry,
    /// Pipelines currently being built, guarding connector recursion
    in_progress: HashSet<String>,
}

impl AssemblyContext {
    fn new(declarations: Vec<PipelineDeclaration>) -> Self {
        Self {
            declarations: declarations
                .into_iter()
                .map(|d| (d.name().to_string(), d))
                .collect(),
            pipelines: PipelineMap::default(),
            connectors: ConnectorRegistry::default(),
            in_progress: HashSet::new(),
        }
    }
}

/// Depth-first removal of a failed pipeline and everything connected to it
///
/// Follows connector references in both directions from the declaration.
/// Removing each declaration as it is visited terminates the walk on
/// cycles and shared branches.
fn remove_connected(name: &str, ctx: &mut AssemblyContext) {
    let Some(declaration) = ctx.declarations.remove(name) else {
        return;
    };
    if ctx.pipelines.remove(name).is_some() {
        info!(pipeline = %name, "removed connected pipeline");
    }
    ctx.connectors.remove(name);

    if let Some(target) = pipeline_target(declaration.source()) {
        remove_connected(target, ctx);
    }
    for sink in declaration.sinks() {
        if let Some(target) = pipeline_target(sink.setting()) {
            remove_connected(target, ctx);
        }
    }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
