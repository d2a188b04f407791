//! Weir - Model
//!
//! The declarative model and component contracts shared by every Weir crate.
//!
//! # Overview
//!
//! A Weir deployment is described as a set of named pipelines. Each pipeline
//! declaration names a source, a buffer, an ordered chain of processors, a
//! router and one or more sinks, all as plugin settings. This crate holds:
//!
//! - The immutable declaration types ([`PipelineDeclaration`],
//!   [`PluginSetting`], [`RoutedPluginSetting`], [`RouteDeclaration`])
//! - The component contracts ([`Source`], [`Buffer`], [`Processor`],
//!   [`Sink`]) that plugin implementations fulfil
//! - The [`Record`] flowing through buffers and processors
//! - [`DataFlowComponent`] pairing a sink with its route-name set
//!
//! Everything that assembles or runs pipelines lives downstream in
//! `weir-plugin` and `weir-topology`.

mod component;
mod declaration;
mod error;
mod record;
mod setting;

pub use component::{Buffer, DataFlowComponent, Processor, Sink, Source};
pub use declaration::{
    DEFAULT_READ_BATCH_DELAY, DEFAULT_WORKERS, PipelineDeclaration, RouteDeclaration,
};
pub use error::{BufferError, SourceError};
pub use record::Record;
pub use setting::{Attributes, PluginSetting, RoutedPluginSetting};
