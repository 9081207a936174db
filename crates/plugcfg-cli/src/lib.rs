//! # plugcfg-cli — Plugin Configuration Command-Line Interface
//!
//! Drives the editor pipeline from a terminal, with schemas read from a
//! directory laid out as `<schema-dir>/<category>/<plugin>.json`.
//!
//! ## Subcommands
//!
//! - `example` — print the annotated example configuration for a plugin
//! - `validate` — validate plugin data, printing one diagnostic per line,
//!   and optionally merge it into a persisted plugin map
//! - `catalog` — list supported plugins by category from an upstream list
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; pipeline behavior lives in
//!   `plugcfg-editor`.
//! - Handlers return `anyhow::Result<u8>`; the binary maps the code to the
//!   process exit status.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use plugcfg_core::PipelineConfig;
use plugcfg_editor::{DirectorySchemaSource, PipelineOrchestrator, SchemaCategory};

pub mod catalog;
pub mod example;
pub mod validate;

/// Where to find a plugin's schema.
#[derive(Args, Debug, Clone)]
pub struct SchemaLocation {
    /// Plugin name, e.g. `limit-count`.
    pub plugin: String,

    /// Directory holding `<category>/<plugin>.json` schema files.
    #[arg(long, default_value = "schemas")]
    pub schema_dir: PathBuf,

    /// Scope the plugin is configured for (`route` or `consumer`).
    #[arg(long, default_value = "route")]
    pub category: SchemaCategory,
}

impl SchemaLocation {
    /// An orchestrator reading schemas from `schema_dir`.
    pub fn orchestrator(
        &self,
        config: PipelineConfig,
    ) -> PipelineOrchestrator<DirectorySchemaSource> {
        PipelineOrchestrator::with_config(DirectorySchemaSource::new(&self.schema_dir), config)
    }
}

/// Defaults, then the optional YAML file, then `PLUGCFG_*` variables.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config
        .apply_env()
        .context("invalid PLUGCFG_* environment variable")?;
    Ok(config)
}
