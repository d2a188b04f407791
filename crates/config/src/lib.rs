//! Weir Configuration
//!
//! TOML-based pipeline configuration loading. A document is a set of named
//! pipeline tables plus an optional `version` marker; loading yields the
//! immutable [`PipelineDeclaration`](weir_model::PipelineDeclaration) set
//! in document order.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use weir_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(
//!     r#"
//! [pipelines.ingest.source]
//! type = "random"
//!
//! [[pipelines.ingest.sink]]
//! type = "stdout"
//! "#,
//! )
//! .unwrap();
//! assert_eq!(config.declarations()[0].name(), "ingest");
//! ```
//!
//! # Files and directories
//!
//! [`Config::from_file`] accepts either a single `.toml` file or a
//! directory, in which case every `*.toml` file in it (sorted by file
//! name) is concatenated into one document before parsing. Duplicate
//! pipeline names across files surface as TOML duplicate-key errors.
//!
//! # Example Document
//!
//! ```toml
//! version = "2"
//!
//! [pipelines.ingest]
//! workers = 2
//!
//! [pipelines.ingest.source]
//! type = "random"
//! interval_ms = 100
//!
//! [[pipelines.ingest.sink]]
//! type = "pipeline"
//! name = "enrich"
//!
//! [pipelines.enrich.source]
//! type = "pipeline"
//! name = "ingest"
//!
//! [[pipelines.enrich.sink]]
//! type = "stdout"
//! ```

mod error;
mod pipeline;
mod version;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use weir_model::PipelineDeclaration;

pub use error::{ConfigError, Result};
pub use pipeline::DEFAULT_BUFFER_PLUGIN;
pub use version::DocumentVersion;

use pipeline::RawPipeline;

/// A parsed pipeline configuration document
#[derive(Debug)]
pub struct Config {
    version: Option<DocumentVersion>,
    declarations: Vec<PipelineDeclaration>,
}

/// The document as serde sees it; pipeline tables stay raw `toml::Value`s
/// so each can be deserialized under its own name for error reporting.
#[derive(Debug, Deserialize)]
struct RawDocument {
    version: Option<String>,

    #[serde(default)]
    pipelines: toml::Table,
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let raw: RawDocument = toml::from_str(s)?;

        let version = raw
            .version
            .map(|v| v.parse::<DocumentVersion>())
            .transpose()?;

        // toml::Table preserves insertion order, so declaration order is
        // document order.
        let mut declarations = Vec::with_capacity(raw.pipelines.len());
        for (name, value) in raw.pipelines {
            let raw_pipeline = RawPipeline::deserialize(value)
                .map_err(|e| ConfigError::invalid_pipeline(&name, e))?;
            declarations.push(raw_pipeline.into_declaration(&name));
        }

        Ok(Self {
            version,
            declarations,
        })
    }
}

impl Config {
    /// Load configuration from a TOML file or a directory of TOML files
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist, a file cannot be read,
    /// a directory holds no `*.toml` files, or the document is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.is_file() {
            let contents =
                fs::read_to_string(path).map_err(|e| ConfigError::io(path.display().to_string(), e))?;
            return contents.parse();
        }

        if path.is_dir() {
            return Self::from_directory(path);
        }

        Err(ConfigError::not_found(path.display().to_string()))
    }

    /// Merge every `*.toml` file in `dir` (sorted by file name) and parse
    fn from_directory(dir: &Path) -> Result<Self> {
        let entries =
            fs::read_dir(dir).map_err(|e| ConfigError::io(dir.display().to_string(), e))?;

        let mut files: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(ConfigError::NoConfigFiles {
                path: dir.display().to_string(),
            });
        }

        let mut merged = String::new();
        for file in &files {
            let contents = fs::read_to_string(file)
                .map_err(|e| ConfigError::io(file.display().to_string(), e))?;
            merged.push_str(&contents);
            merged.push('\n');
        }

        merged.parse()
    }

    /// The document's version marker, when present
    #[inline]
    pub fn version(&self) -> Option<&DocumentVersion> {
        self.version.as_ref()
    }

    /// The pipeline declarations in document order
    #[inline]
    pub fn declarations(&self) -> &[PipelineDeclaration] {
        &self.declarations
    }

    /// Consume the config, returning the declarations in document order
    #[inline]
    pub fn into_declarations(self) -> Vec<PipelineDeclaration> {
        self.declarations
    }
}
