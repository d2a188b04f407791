use super::*;

use std::time::Duration;

use parking_lot::Mutex;

use weir_model::{
    Buffer, BufferError, PluginSetting, Processor, Record, RoutedPluginSetting, Source,
    SourceError,
};
use weir_plugin::{ComponentKind, PluginError};

use crate::breaker::ManualBreaker;
use crate::connector::PIPELINE_PLUGIN;
use crate::error::TopologyError;

const TIMEOUT: Duration = Duration::from_millis(50);

/// Plugin stand-in: any type name loads, `broken` fails, `forwarding`
/// processors request peer forwarding. Every load is recorded.
#[derive(Default)]
struct TestPlugins {
    loaded: Mutex<Vec<String>>,
}

impl TestPlugins {
    fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, kind: ComponentKind, setting: &PluginSetting) {
        self.loaded.lock().push(format!("{kind}:{}", setting.name()));
    }

    fn load_count(&self, entry: &str) -> usize {
        self.loaded.lock().iter().filter(|e| *e == entry).count()
    }
}

impl PluginFactory for TestPlugins {
    fn load_source(
        &self,
        setting: &PluginSetting,
    ) -> weir_plugin::Result<Arc<dyn weir_model::Source>> {
        if setting.name() == "broken" {
            return Err(PluginError::invalid_configuration(
                ComponentKind::Source,
                "broken",
                "boom",
            ));
        }
        self.record(ComponentKind::Source, setting);
        Ok(Arc::new(TestSource {
            acknowledgements: setting.attribute_bool("acknowledgements").unwrap_or(false),
        }))
    }

    fn load_buffer(&self, setting: &PluginSetting) -> weir_plugin::Result<Arc<dyn Buffer>> {
        if setting.name() == "broken" {
            return Err(PluginError::invalid_configuration(
                ComponentKind::Buffer,
                "broken",
                "boom",
            ));
        }
        self.record(ComponentKind::Buffer, setting);
        Ok(Arc::new(TestBuffer::default()))
    }

    fn load_sink(
        &self,
        setting: &PluginSetting,
    ) -> weir_plugin::Result<Arc<dyn weir_model::Sink>> {
        if setting.name() == "broken" {
            return Err(PluginError::invalid_configuration(
                ComponentKind::Sink,
                "broken",
                "boom",
            ));
        }
        self.record(ComponentKind::Sink, setting);
        Ok(Arc::new(TestSink))
    }

    fn load_processors(
        &self,
        setting: &PluginSetting,
        count: &dyn Fn(Instantiation) -> usize,
    ) -> weir_plugin::Result<Vec<Box<dyn Processor>>> {
        if setting.name() == "broken" {
            return Err(PluginError::invalid_configuration(
                ComponentKind::Processor,
                "broken",
                "boom",
            ));
        }
        let mode = if setting.name() == "per_worker" {
            Instantiation::PerWorker
        } else {
            Instantiation::Shared
        };
        let mut processors: Vec<Box<dyn Processor>> = Vec::new();
        for _ in 0..count(mode) {
            self.record(ComponentKind::Processor, setting);
            processors.push(Box::new(TestProcessor {
                forwarding: setting.name() == "forwarding",
            }));
        }
        Ok(processors)
    }
}

struct TestSource {
    acknowledgements: bool,
}

impl Source for TestSource {
    fn start(&self, _buffer: Arc<dyn Buffer>) -> std::result::Result<(), SourceError> {
        Ok(())
    }
    fn stop(&self) {}
    fn acknowledgements_enabled(&self) -> bool {
        self.acknowledgements
    }
}

#[derive(Default)]
struct TestBuffer {
    records: Mutex<Vec<Record>>,
}

impl Buffer for TestBuffer {
    fn write(&self, record: Record, _timeout: Duration) -> std::result::Result<(), BufferError> {
        self.records.lock().push(record);
        Ok(())
    }
    fn read(&self, _timeout: Duration) -> Vec<Record> {
        std::mem::take(&mut self.records.lock())
    }
    fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

struct TestSink;

impl weir_model::Sink for TestSink {
    fn output(&self, _records: Vec<Record>) {}
}

struct TestProcessor {
    forwarding: bool,
}

impl Processor for TestProcessor {
    fn execute(&self, records: Vec<Record>) -> Vec<Record> {
        records
    }
    fn requires_peer_forwarding(&self) -> bool {
        self.forwarding
    }
}

fn connector_ref(target: &str) -> PluginSetting {
    PluginSetting::new(PIPELINE_PLUGIN).with_attribute("name", target)
}

fn sink(setting: PluginSetting) -> RoutedPluginSetting {
    RoutedPluginSetting::unrouted(setting)
}

/// A pipeline with a `random` source and a `null` sink
fn simple(name: &str) -> PipelineDeclaration {
    PipelineDeclaration::new(
        name,
        PluginSetting::new("random"),
        PluginSetting::new("blocking"),
        vec![sink(PluginSetting::new("null"))],
    )
}

/// `name` sinking into pipeline `target`
fn head(name: &str, target: &str) -> PipelineDeclaration {
    PipelineDeclaration::new(
        name,
        PluginSetting::new("random"),
        PluginSetting::new("blocking"),
        vec![sink(connector_ref(target))],
    )
}

/// `name` sourced from pipeline `target`
fn tail(name: &str, target: &str) -> PipelineDeclaration {
    PipelineDeclaration::new(
        name,
        connector_ref(target),
        PluginSetting::new("blocking"),
        vec![sink(PluginSetting::new("null"))],
    )
}

fn builder(plugins: &Arc<TestPlugins>) -> TopologyBuilder {
    TopologyBuilder::new(plugins.clone() as Arc<dyn PluginFactory>)
}

#[test]
fn test_independent_pipelines_build_in_declaration_order() {
    let plugins = TestPlugins::arc();
    let map = builder(&plugins)
        .assemble(vec![simple("metrics"), simple("logs"), simple("traces")])
        .unwrap();

    let names: Vec<_> = map.names().collect();
    assert_eq!(names, ["metrics", "logs", "traces"]);
}

#[test]
fn test_validation_failure_aborts_assembly() {
    let plugins = TestPlugins::arc();
    let err = builder(&plugins)
        .assemble(vec![simple("dup"), simple("dup")])
        .unwrap_err();
    assert!(matches!(err, TopologyError::Validation(_)));
    // Nothing was instantiated
    assert!(plugins.loaded.lock().is_empty());
}

#[test]
fn test_connector_links_both_sides_to_one_connector() {
    let plugins = TestPlugins::arc();
    let map = builder(&plugins)
        .assemble(vec![head("ingest", "enrich"), tail("enrich", "ingest")])
        .unwrap();

    assert_eq!(map.names().collect::<Vec<_>>(), ["ingest", "enrich"]);

    let enrich = map.get("enrich").unwrap();
    let connector = enrich.source().as_connector().expect("connector source");
    assert_eq!(connector.target(), "enrich");
    assert_eq!(connector.upstream().as_deref(), Some("ingest"));

    // The upstream's sink side is the same link: once the downstream side
    // starts, output from ingest lands in enrich's buffer.
    connector.start(enrich.buffer().clone()).unwrap();
    let ingest = map.get("ingest").unwrap();
    ingest.sinks()[0]
        .component()
        .output(vec![Record::from_string("hop")]);
    assert!(!enrich.buffer().is_empty());
}

#[test]
fn test_upstream_reference_builds_upstream_first() {
    let plugins = TestPlugins::arc();
    // Downstream declared first; only its source names the link
    let map = builder(&plugins)
        .assemble(vec![tail("enrich", "ingest"), simple("ingest")])
        .unwrap();

    assert_eq!(map.names().collect::<Vec<_>>(), ["ingest", "enrich"]);
}

#[test]
fn test_shared_upstream_is_built_once() {
    let plugins = TestPlugins::arc();
    let upstream = PipelineDeclaration::new(
        "ingest",
        PluginSetting::new("random"),
        PluginSetting::new("blocking"),
        vec![sink(connector_ref("left")), sink(connector_ref("right"))],
    );
    let map = builder(&plugins)
        .assemble(vec![tail("left", "ingest"), tail("right", "ingest"), upstream])
        .unwrap();

    assert_eq!(map.len(), 3);
    assert_eq!(plugins.load_count("source:random"), 1);
}

#[test]
fn test_buffer_failure_rolls_back_connected_chain() {
    let plugins = TestPlugins::arc();
    let broken_head = PipelineDeclaration::new(
        "ingest",
        PluginSetting::new("random"),
        PluginSetting::new("broken"),
        vec![sink(connector_ref("enrich"))],
    );

    let map = builder(&plugins)
        .assemble(vec![broken_head, tail("enrich", "ingest"), simple("metrics")])
        .unwrap();

    // The chain is gone, the disconnected pipeline is untouched
    assert_eq!(map.names().collect::<Vec<_>>(), ["metrics"]);
}

#[test]
fn test_downstream_failure_removes_built_upstream() {
    let plugins = TestPlugins::arc();
    let broken_tail = PipelineDeclaration::new(
        "enrich",
        connector_ref("ingest"),
        PluginSetting::new("blocking"),
        vec![sink(PluginSetting::new("broken"))],
    );

    let map = builder(&plugins)
        .assemble(vec![head("ingest", "enrich"), broken_tail, simple("metrics")])
        .unwrap();

    // ingest built successfully before enrich failed, then was rolled back
    assert_eq!(map.names().collect::<Vec<_>>(), ["metrics"]);
}

#[test]
fn test_three_stage_chain_failure_removes_all_stages() {
    let plugins = TestPlugins::arc();
    let broken_middle = PipelineDeclaration::new(
        "enrich",
        connector_ref("ingest"),
        PluginSetting::new("broken"),
        vec![sink(connector_ref("deliver"))],
    );

    let map = builder(&plugins)
        .assemble(vec![
            head("ingest", "enrich"),
            broken_middle,
            tail("deliver", "enrich"),
            simple("metrics"),
        ])
        .unwrap();

    assert_eq!(map.names().collect::<Vec<_>>(), ["metrics"]);
}

#[test]
fn test_route_compile_failure_rolls_back_pipeline() {
    let plugins = TestPlugins::arc();
    let bad_routes = PipelineDeclaration::new(
        "routed",
        PluginSetting::new("random"),
        PluginSetting::new("blocking"),
        vec![sink(PluginSetting::new("null"))],
    )
    .with_routes(vec![weir_model::RouteDeclaration::new("bad", "nonsense")]);

    let map = builder(&plugins)
        .assemble(vec![bad_routes, simple("metrics")])
        .unwrap();
    assert_eq!(map.names().collect::<Vec<_>>(), ["metrics"]);
}

#[test]
fn test_acknowledgements_propagate_to_connector() {
    let plugins = TestPlugins::arc();
    let acking_head = PipelineDeclaration::new(
        "ingest",
        PluginSetting::new("random").with_attribute("acknowledgements", true),
        PluginSetting::new("blocking"),
        vec![sink(connector_ref("enrich"))],
    );

    let map = builder(&plugins)
        .assemble(vec![acking_head, tail("enrich", "ingest")])
        .unwrap();

    let enrich = map.get("enrich").unwrap();
    assert!(enrich.acknowledgements_enabled());
    assert!(map.get("ingest").unwrap().acknowledgements_enabled());
}

#[test]
fn test_breaker_gates_entry_pipelines_only() {
    let plugins = TestPlugins::arc();
    let breaker = Arc::new(ManualBreaker::new());
    breaker.open();

    let map = builder(&plugins)
        .with_circuit_breakers(CircuitBreakerManager::with_global(breaker))
        .assemble(vec![head("ingest", "enrich"), tail("enrich", "ingest")])
        .unwrap();

    let ingest = map.get("ingest").unwrap();
    assert_eq!(
        ingest.buffer().write(Record::from_string("x"), TIMEOUT),
        Err(BufferError::CircuitOpen)
    );

    // Connector-fed pipelines keep draining while the breaker is open
    let enrich = map.get("enrich").unwrap();
    enrich
        .buffer()
        .write(Record::from_string("x"), TIMEOUT)
        .unwrap();
}

#[test]
fn test_per_worker_processors_get_one_instance_per_worker() {
    let plugins = TestPlugins::arc();
    let declaration = PipelineDeclaration::new(
        "ingest",
        PluginSetting::new("random"),
        PluginSetting::new("blocking"),
        vec![sink(PluginSetting::new("null"))],
    )
    .with_workers(3)
    .with_processors(vec![
        PluginSetting::new("per_worker"),
        PluginSetting::new("noop"),
    ]);

    let map = builder(&plugins).assemble(vec![declaration]).unwrap();
    assert_eq!(map.get("ingest").unwrap().processor_stages(), 2);
    assert_eq!(plugins.load_count("processor:per_worker"), 3);
    assert_eq!(plugins.load_count("processor:noop"), 1);
}

#[test]
fn test_peer_forwarder_contributes_buffers_and_decoration() {
    use crate::peer::PeerForwarderProvider;

    struct RecordingForwarder {
        receive: Arc<TestBuffer>,
        decorated: Mutex<Vec<String>>,
    }

    impl PeerForwarderProvider for RecordingForwarder {
        fn receive_buffers_for(&self, _pipeline: &str) -> HashMap<String, Arc<dyn Buffer>> {
            let mut buffers: HashMap<String, Arc<dyn Buffer>> = HashMap::new();
            buffers.insert("forwarding".to_string(), self.receive.clone());
            buffers
        }

        fn decorate_processors(
            &self,
            processors: Vec<Box<dyn Processor>>,
            _pipeline: &str,
            plugin: &str,
            _workers: usize,
        ) -> Vec<Box<dyn Processor>> {
            self.decorated.lock().push(plugin.to_string());
            processors
        }
    }

    let receive = Arc::new(TestBuffer::default());
    let forwarder = Arc::new(RecordingForwarder {
        receive: receive.clone(),
        decorated: Mutex::new(Vec::new()),
    });

    let plugins = TestPlugins::arc();
    let declaration = PipelineDeclaration::new(
        "ingest",
        PluginSetting::new("random"),
        PluginSetting::new("blocking"),
        vec![sink(PluginSetting::new("null"))],
    )
    .with_processors(vec![
        PluginSetting::new("forwarding"),
        PluginSetting::new("noop"),
    ]);

    let map = builder(&plugins)
        .with_peer_forwarder(forwarder.clone())
        .assemble(vec![declaration])
        .unwrap();

    // Only the forwarding stage was decorated
    assert_eq!(*forwarder.decorated.lock(), ["forwarding"]);

    // The receive buffer participates in the fan-out write path
    let ingest = map.get("ingest").unwrap();
    ingest
        .buffer()
        .write(Record::from_string("x"), TIMEOUT)
        .unwrap();
    assert!(!receive.is_empty());
}

#[test]
fn test_assemble_from_file() {
    use std::io::Write as _;

    let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
    write!(
        file,
        r#"
version = "2"

[pipelines.ingest.source]
type = "random"

[[pipelines.ingest.sink]]
type = "pipeline"
name = "enrich"

[pipelines.enrich.source]
type = "pipeline"
name = "ingest"

[[pipelines.enrich.sink]]
type = "stdout"
"#
    )
    .unwrap();

    let plugins = TestPlugins::arc();
    let map = builder(&plugins).assemble_from_file(file.path()).unwrap();
    assert_eq!(map.names().collect::<Vec<_>>(), ["ingest", "enrich"]);
}

#[test]
fn test_assemble_from_file_rejects_incompatible_version() {
    use std::io::Write as _;

    let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
    write!(file, "version = \"9\"\n[pipelines.ingest.source]\ntype = \"random\"\n").unwrap();

    let plugins = TestPlugins::arc();
    let err = builder(&plugins).assemble_from_file(file.path()).unwrap_err();
    assert!(matches!(
        err,
        TopologyError::Validation(ValidationError::IncompatibleVersion { .. })
    ));
}

#[test]
fn test_assemble_from_file_missing_path() {
    let plugins = TestPlugins::arc();
    let err = builder(&plugins)
        .assemble_from_file("/nonexistent/weir.toml")
        .unwrap_err();
    assert!(matches!(err, TopologyError::Configuration(_)));
}
