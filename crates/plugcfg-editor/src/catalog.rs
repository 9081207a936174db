//! # Plugin Catalog
//!
//! The editor does not offer every plugin the gateway knows about. The
//! upstream plugin list is filtered down to a supported set, and each
//! supported plugin may carry a local category that replaces the upstream
//! one. The catalog then groups plugins for display: category labels are
//! capitalized and sorted, plugins within a category are sorted by name.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::source::SchemaCategory;

/// Base URL of the per-plugin documentation pages.
pub const DOC_BASE_URL: &str = "https://github.com/apache/apisix/blob/master/doc/plugins";

/// Category of plugins that authenticate consumers.
pub const AUTH_CATEGORY: &str = "auth";

/// One entry of the upstream plugin list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMeta {
    pub name: String,
    /// The plugin's category, e.g. `auth` or `traffic`.
    #[serde(rename = "type", default)]
    pub category: String,
    /// Upstream attributes the catalog does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PluginMeta {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            extra: Map::new(),
        }
    }
}

/// The plugins the editor supports, with optional local category overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedPlugins {
    entries: Vec<(String, Option<String>)>,
}

impl Default for SupportedPlugins {
    fn default() -> Self {
        Self::empty()
            .with("key-auth", None)
            .with("limit-count", Some("traffic"))
            .with("limit-req", Some("traffic"))
            .with("request-validation", Some("parameter"))
            .with("response-rewrite", Some("parameter"))
    }
}

impl SupportedPlugins {
    /// No supported plugins.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Support `name`, overriding its category when `category` is set.
    pub fn with(mut self, name: impl Into<String>, category: Option<&str>) -> Self {
        let name = name.into();
        self.entries.retain(|(existing, _)| *existing != name);
        self.entries.push((name, category.map(str::to_string)));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// The local category for `name`, if one is set.
    pub fn category_override(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, category)| category.as_deref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

/// Supported plugins grouped for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginCatalog {
    plugins: Vec<PluginMeta>,
}

impl PluginCatalog {
    /// Keep the supported plugins of `upstream`, applying local category
    /// overrides. Upstream order is preserved.
    pub fn from_upstream(upstream: Vec<PluginMeta>, supported: &SupportedPlugins) -> Self {
        let plugins = upstream
            .into_iter()
            .filter(|meta| supported.contains(&meta.name))
            .map(|mut meta| {
                if let Some(category) = supported.category_override(&meta.name) {
                    meta.category = category.to_string();
                }
                meta
            })
            .collect();
        Self { plugins }
    }

    /// Capitalized category labels, sorted and deduplicated. Plugins without
    /// a category are not listed under any label.
    pub fn categories(&self) -> Vec<String> {
        self.plugins
            .iter()
            .filter(|meta| !meta.category.is_empty())
            .map(|meta| capitalize(&meta.category))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Plugins whose category carries `label`, sorted by name.
    pub fn plugins_in(&self, label: &str) -> Vec<&PluginMeta> {
        let mut plugins: Vec<&PluginMeta> = self
            .plugins
            .iter()
            .filter(|meta| !meta.category.is_empty() && capitalize(&meta.category) == label)
            .collect();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }

    pub fn get(&self, name: &str) -> Option<&PluginMeta> {
        self.plugins.iter().find(|meta| meta.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginMeta> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// First character upper-cased, the rest unchanged.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Documentation page for plugin `name`. All `serverless*` plugins share one
/// page.
pub fn documentation_url(name: &str) -> String {
    if name.starts_with("serverless") {
        format!("{DOC_BASE_URL}/serverless.md")
    } else {
        format!("{DOC_BASE_URL}/{name}.md")
    }
}

/// Whether the plugin needs a configuration body in this scope.
///
/// Authentication plugins attached to a route only switch authentication on;
/// their settings live on the consumer.
pub fn requires_configuration(meta: &PluginMeta, category: SchemaCategory) -> bool {
    !(meta.category == AUTH_CATEGORY && category != SchemaCategory::Consumer)
}
