//! # plugcfg CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, loads the
//! pipeline configuration and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plugcfg_cli::catalog::{run_catalog, CatalogArgs};
use plugcfg_cli::example::{run_example, ExampleArgs};
use plugcfg_cli::load_config;
use plugcfg_cli::validate::{run_validate, ValidateArgs};

/// Plugin configuration toolkit.
///
/// Prints annotated example configurations generated from plugin schemas,
/// validates plugin data against them, and lists the supported plugins.
#[derive(Parser, Debug)]
#[command(name = "plugcfg", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML pipeline configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the annotated example configuration for a plugin.
    Example(ExampleArgs),

    /// Validate plugin data against the plugin's schema.
    Validate(ValidateArgs),

    /// List supported plugins by category.
    Catalog(CatalogArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = load_config(cli.config.as_deref()).and_then(|config| {
        tracing::debug!(?config, "pipeline configuration loaded");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(async {
            match &cli.command {
                Commands::Example(args) => run_example(args, config).await,
                Commands::Validate(args) => run_validate(args, config).await,
                Commands::Catalog(args) => run_catalog(args),
            }
        })
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` wins when set; otherwise `-v` picks the level.
fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
