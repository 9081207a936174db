//! # Example Subcommand
//!
//! Prints the annotated example configuration for one plugin, the text the
//! editor pre-fills when a plugin is opened.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use plugcfg_core::PipelineConfig;

use crate::SchemaLocation;

/// Arguments for the `example` subcommand.
#[derive(Args, Debug)]
pub struct ExampleArgs {
    #[command(flatten)]
    pub schema: SchemaLocation,

    /// Write the example to this file instead of stdout.
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Print the bare example as JSON, without annotations.
    #[arg(long)]
    pub json: bool,
}

/// Execute the `example` subcommand.
pub async fn run_example(args: &ExampleArgs, config: PipelineConfig) -> Result<u8> {
    let orchestrator = args.schema.orchestrator(config);
    let example = orchestrator
        .annotated_example(&args.schema.plugin, args.schema.category)
        .await
        .with_context(|| format!("failed to build example for '{}'", args.schema.plugin))?;

    let text = if args.json {
        let mut json = serde_json::to_string_pretty(&example.value)?;
        json.push('\n');
        json
    } else {
        example.text()
    };

    match &args.out {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "example written");
        }
        None => print!("{text}"),
    }
    Ok(0)
}
