//! Serve command - assemble the topology and run it until interrupted

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::info;

use weir_plugin::builtin;
use weir_topology::TopologyBuilder;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to a pipeline configuration file or directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let path = args.config.unwrap_or_else(super::default_config_path);
    info!(config = %path.display(), "loading pipeline configuration");

    let registry = Arc::new(builtin::default_registry());
    let builder = TopologyBuilder::new(registry);

    let pipelines = builder
        .assemble_from_file(&path)
        .with_context(|| format!("failed to assemble topology from '{}'", path.display()))?;

    if pipelines.is_empty() {
        bail!("no pipeline could be assembled from '{}'", path.display());
    }

    // Downstream pipelines start first so every connector is accepting
    // records before its upstream source produces any.
    for pipeline in pipelines.iter_reverse() {
        pipeline
            .start()
            .with_context(|| format!("failed to start pipeline '{}'", pipeline.name()))?;
    }
    info!(pipelines = pipelines.len(), "weir running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    // Stop head-first: cutting intake at the top lets downstream
    // pipelines drain what is already in flight.
    for pipeline in pipelines.iter() {
        pipeline.stop();
    }
    info!("all pipelines stopped");

    Ok(())
}
