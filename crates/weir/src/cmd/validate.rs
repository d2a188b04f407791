//! Validate command - structural checks without instantiating plugins

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use weir_config::{Config, DocumentVersion};
use weir_topology::sequencer;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to a pipeline configuration file or directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let path = args.config.unwrap_or_else(super::default_config_path);

    let config = Config::from_file(&path)
        .with_context(|| format!("failed to load '{}'", path.display()))?;

    if let Some(version) = config.version()
        && !version.compatible_with(&DocumentVersion::CURRENT)
    {
        anyhow::bail!(
            "configuration version {version} is not supported (current: {})",
            DocumentVersion::CURRENT
        );
    }

    let order = sequencer::sequence(config.declarations())?;

    println!("{}: {} pipeline(s), build order:", path.display(), order.len());
    for name in &order {
        let declaration = config
            .declarations()
            .iter()
            .find(|d| d.name() == *name)
            .context("sequencer returned an undeclared pipeline")?;
        println!(
            "  {} (source: {}, processors: {}, sinks: {}, workers: {})",
            name,
            declaration.source().name(),
            declaration.processors().len(),
            declaration.sinks().len(),
            declaration.workers(),
        );
    }

    Ok(())
}
