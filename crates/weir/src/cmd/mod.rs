//! CLI subcommands

pub mod serve;
pub mod validate;

use std::path::PathBuf;

/// Configuration path used when none is given on the command line
pub fn default_config_path() -> PathBuf {
    PathBuf::from("configs/pipelines.toml")
}
