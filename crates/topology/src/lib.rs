//! Weir Topology
//!
//! Assembly of runnable pipeline graphs from declarative configuration.
//! A declaration set describes pipelines (source, buffer, processors,
//! routes, sinks); the [`TopologyBuilder`] validates it as a whole, builds
//! each pipeline through a [`PluginFactory`](weir_plugin::PluginFactory),
//! links pipelines referencing each other through in-process connectors and
//! returns the surviving pipelines in build order.
//!
//! ```text
//!             TopologyBuilder::assemble
//!                       |
//!      sequencer (validate + attempt order)
//!                       |
//!        per pipeline: source | buffer | processors | router | sinks
//!                       |                  |
//!            connector registry     buffer decoration
//!          (cross-pipeline links)  (fan-out, breaker)
//!                       |
//!                  PipelineMap
//! ```
//!
//! # Failure isolation
//!
//! One pipeline failing to build never aborts assembly: the failure is
//! logged, the pipeline and everything connected to it are rolled back, and
//! disconnected pipelines come up normally. Only structural validation
//! (duplicate names, dangling or cyclic connector references, an
//! incompatible document version) fails the whole run.

mod breaker;
mod buffer;
mod builder;
mod connector;
mod error;
mod peer;
mod pipeline;
mod router;
pub mod sequencer;

pub use breaker::{CircuitBreaker, CircuitBreakerManager, ManualBreaker};
pub use buffer::{CircuitBreakingBuffer, FanOutBuffer};
pub use builder::TopologyBuilder;
pub use connector::{ConnectorRegistry, PIPELINE_PLUGIN, PipelineConnector, pipeline_target};
pub use error::{BuildError, Result, TopologyError, ValidationError};
pub use peer::{LocalPeerForwarder, PeerForwarderProvider};
pub use pipeline::{Pipeline, PipelineMap, PipelineSource, ShutdownTimeouts};
pub use router::{DefaultRouterFactory, Router, RouterError, RouterFactory};
