//! Subcommand implementations

pub mod check;
pub mod graph;
pub mod list;
pub mod param;

use anyhow::{Context, Result};
use cube_di::Config;
use std::path::Path;
use tracing::debug;

/// Load a configuration file, attaching the path to any error
pub fn load(file: &Path) -> Result<Config> {
    debug!(file = %file.display(), "Loading configuration");
    Config::from_path(file).with_context(|| format!("Failed to load {}", file.display()))
}
