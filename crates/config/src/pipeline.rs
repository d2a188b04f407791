//! Raw pipeline tables
//!
//! The serde-facing shape of one `[pipelines.<name>]` table and its
//! conversion into the immutable [`PipelineDeclaration`] model, applying
//! defaults (buffer, workers, read batch delay) where the document is
//! silent.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use weir_model::{PipelineDeclaration, PluginSetting, RouteDeclaration, RoutedPluginSetting};

/// Buffer plugin used when a pipeline declares none
pub const DEFAULT_BUFFER_PLUGIN: &str = "blocking";

/// One `[pipelines.<name>]` table as it appears in the document
#[derive(Debug, Deserialize)]
pub(crate) struct RawPipeline {
    /// Processor worker thread count
    workers: Option<usize>,

    /// Delay bounding one buffer read in the worker loop
    read_batch_delay_ms: Option<u64>,

    /// Source component (required)
    source: RawComponent,

    /// Buffer component; defaults to the `blocking` buffer
    buffer: Option<RawComponent>,

    /// Ordered processor chain (`[[pipelines.<name>.processor]]`)
    #[serde(default, rename = "processor")]
    processors: Vec<RawComponent>,

    /// Sinks (`[[pipelines.<name>.sink]]`)
    #[serde(default, rename = "sink")]
    sinks: Vec<RawSink>,

    /// Named routes (`[[pipelines.<name>.route]]`)
    #[serde(default, rename = "route")]
    routes: Vec<RawRoute>,
}

/// A component table: `type = "..."` plus free-form plugin attributes
#[derive(Debug, Deserialize)]
pub(crate) struct RawComponent {
    #[serde(rename = "type")]
    kind: String,

    #[serde(flatten)]
    attributes: HashMap<String, toml::Value>,
}

impl RawComponent {
    fn into_setting(self) -> PluginSetting {
        PluginSetting::with_attributes(self.kind, self.attributes)
    }
}

/// A sink table: a component plus the route names gating it
#[derive(Debug, Deserialize)]
pub(crate) struct RawSink {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default)]
    routes: Vec<String>,

    #[serde(flatten)]
    attributes: HashMap<String, toml::Value>,
}

impl RawSink {
    fn into_setting(self) -> RoutedPluginSetting {
        RoutedPluginSetting::new(
            PluginSetting::with_attributes(self.kind, self.attributes),
            self.routes,
        )
    }
}

/// A route table: name plus condition expression
#[derive(Debug, Deserialize)]
pub(crate) struct RawRoute {
    name: String,
    condition: String,
}

impl RawPipeline {
    /// Convert into the immutable declaration, applying defaults
    pub(crate) fn into_declaration(self, name: &str) -> PipelineDeclaration {
        let buffer = self
            .buffer
            .map(RawComponent::into_setting)
            .unwrap_or_else(|| PluginSetting::new(DEFAULT_BUFFER_PLUGIN));

        let mut declaration = PipelineDeclaration::new(
            name,
            self.source.into_setting(),
            buffer,
            self.sinks.into_iter().map(RawSink::into_setting).collect(),
        )
        .with_processors(
            self.processors
                .into_iter()
                .map(RawComponent::into_setting)
                .collect(),
        )
        .with_routes(
            self.routes
                .into_iter()
                .map(|r| RouteDeclaration::new(r.name, r.condition))
                .collect(),
        );

        if let Some(workers) = self.workers {
            declaration = declaration.with_workers(workers);
        }
        if let Some(delay_ms) = self.read_batch_delay_ms {
            declaration = declaration.with_read_batch_delay(Duration::from_millis(delay_ms));
        }
        declaration
    }
}
