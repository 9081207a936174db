//! # Catalog Subcommand
//!
//! Lists the plugins the editor offers, grouped by category, from an
//! upstream plugin list (a JSON array of `{"name", "type", ...}` objects).

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use plugcfg_editor::{
    documentation_url, requires_configuration, PluginCatalog, PluginMeta, SchemaCategory,
    SupportedPlugins,
};

/// Arguments for the `catalog` subcommand.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Upstream plugin list (JSON array).
    pub plugins: PathBuf,

    /// Scope the plugins would be configured for.
    #[arg(long, default_value = "route")]
    pub category: SchemaCategory,
}

/// Execute the `catalog` subcommand.
pub fn run_catalog(args: &CatalogArgs) -> Result<u8> {
    let text = std::fs::read_to_string(&args.plugins)
        .with_context(|| format!("failed to read {}", args.plugins.display()))?;
    let upstream: Vec<PluginMeta> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse plugin list {}", args.plugins.display()))?;

    let catalog = PluginCatalog::from_upstream(upstream, &SupportedPlugins::default());
    tracing::debug!(plugins = catalog.len(), "catalog loaded");
    print!("{}", render_catalog(&catalog, args.category));
    Ok(0)
}

/// One block per category: the label, then one line per plugin with its
/// documentation link.
pub fn render_catalog(catalog: &PluginCatalog, category: SchemaCategory) -> String {
    let mut out = String::new();
    for label in catalog.categories() {
        let _ = writeln!(out, "{label}");
        for meta in catalog.plugins_in(&label) {
            let _ = write!(out, "  {:<20} {}", meta.name, documentation_url(&meta.name));
            if !requires_configuration(meta, category) {
                let _ = write!(out, "  ({} does not require configuration)", meta.name);
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
