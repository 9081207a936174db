//! # Validate Subcommand
//!
//! Validates plugin data (JSON or YAML) against the plugin's schema. Each
//! failure is printed on its own line. With `--plugins`, accepted data is
//! merged into a persisted plugin map file, which is rewritten in place.
//!
//! Exit status: `0` when the data is valid, `1` when it was rejected or
//! could not be checked.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use plugcfg_core::PipelineConfig;
use plugcfg_editor::{parse_candidate, PipelineError, PluginConfigMap};
use serde_json::Value;

use crate::SchemaLocation;

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub schema: SchemaLocation,

    /// File with the plugin data to validate.
    pub data: PathBuf,

    /// Persisted plugin map to merge the data into when it is valid.
    #[arg(long)]
    pub plugins: Option<PathBuf>,

    /// Store the plugin as disabled when merging.
    #[arg(long, requires = "plugins")]
    pub disabled: bool,
}

/// Execute the `validate` subcommand.
pub async fn run_validate(args: &ValidateArgs, config: PipelineConfig) -> Result<u8> {
    let text = std::fs::read_to_string(&args.data)
        .with_context(|| format!("failed to read {}", args.data.display()))?;
    let orchestrator = args.schema.orchestrator(config.clone());
    let plugin = &args.schema.plugin;

    let result = match &args.plugins {
        Some(path) => {
            let mut plugins = load_plugin_map(path, &config)?;
            let outcome = orchestrator
                .accept_submission(&mut plugins, plugin, args.schema.category, &text, !args.disabled)
                .await;
            if outcome.is_ok() {
                save_plugin_map(path, &plugins)?;
            }
            outcome.map(|_| ())
        }
        None => {
            let candidate = parse_candidate(&text)
                .with_context(|| format!("failed to parse {}", args.data.display()))?;
            orchestrator
                .validate_submission(plugin, args.schema.category, &candidate)
                .await
        }
    };

    match result {
        Ok(()) => {
            println!("{plugin}: valid");
            Ok(0)
        }
        Err(PipelineError::Rejected(rejection)) => {
            println!("{plugin}: invalid plugin data");
            for line in rejection.diagnostics() {
                println!("  {line}");
            }
            Ok(1)
        }
        Err(e) => Err(e).with_context(|| format!("failed to validate '{plugin}'")),
    }
}

fn load_plugin_map(path: &Path, config: &PipelineConfig) -> Result<PluginConfigMap> {
    let value = if path.exists() {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse plugin map {}", path.display()))?
    } else {
        Value::Object(Default::default())
    };

    PluginConfigMap::from_value_with_field(value, config.disable_field.as_str())
        .with_context(|| format!("invalid plugin map {}", path.display()))
}

fn save_plugin_map(path: &Path, plugins: &PluginConfigMap) -> Result<()> {
    let mut text = serde_json::to_string_pretty(&plugins.to_value())?;
    text.push('\n');
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), plugins = plugins.len(), "plugin map updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugcfg_editor::SchemaCategory;
    use serde_json::json;

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("consumer")).unwrap();
        std::fs::write(
            dir.path().join("consumer").join("key-auth.json"),
            json!({
                "type": "object",
                "required": ["key"],
                "properties": {"key": {"type": "string", "minLength": 1}}
            })
            .to_string(),
        )
        .unwrap();
        dir
    }

    fn args(dir: &Path, data: &str, plugins: Option<PathBuf>, disabled: bool) -> ValidateArgs {
        let data_path = dir.join("data.yaml");
        std::fs::write(&data_path, data).unwrap();
        ValidateArgs {
            schema: SchemaLocation {
                plugin: "key-auth".into(),
                schema_dir: dir.to_path_buf(),
                category: SchemaCategory::Consumer,
            },
            data: data_path,
            plugins,
            disabled,
        }
    }

    #[tokio::test]
    async fn valid_data_exits_zero() {
        let dir = setup();
        let code = run_validate(&args(dir.path(), "key: abc\n", None, false), PipelineConfig::default())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn rejected_data_exits_one() {
        let dir = setup();
        let code = run_validate(&args(dir.path(), "{\"key\": \"\"}", None, false), PipelineConfig::default())
            .await
            .unwrap();
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn unparseable_data_is_an_error() {
        let dir = setup();
        let err = run_validate(&args(dir.path(), "{key: [", None, false), PipelineConfig::default())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
    }

    #[tokio::test]
    async fn merges_into_plugin_map_only_when_valid() {
        let dir = setup();
        let map_path = dir.path().join("plugins.json");
        std::fs::write(&map_path, json!({"cors": {"disable": true}}).to_string()).unwrap();

        let code = run_validate(
            &args(dir.path(), "key: abc\n", Some(map_path.clone()), true),
            PipelineConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(code, 0);
        let stored: Value = serde_json::from_str(&std::fs::read_to_string(&map_path).unwrap()).unwrap();
        assert_eq!(
            stored,
            json!({"cors": {"disable": true}, "key-auth": {"key": "abc", "disable": true}})
        );

        let code = run_validate(
            &args(dir.path(), "key: ''\n", Some(map_path.clone()), false),
            PipelineConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(code, 1);
        let unchanged: Value = serde_json::from_str(&std::fs::read_to_string(&map_path).unwrap()).unwrap();
        assert_eq!(unchanged, stored);
    }

    #[tokio::test]
    async fn missing_plugin_map_is_created() {
        let dir = setup();
        let map_path = dir.path().join("new.json");
        run_validate(
            &args(dir.path(), "key: abc\n", Some(map_path.clone()), false),
            PipelineConfig::default(),
        )
        .await
        .unwrap();
        let stored: Value = serde_json::from_str(&std::fs::read_to_string(&map_path).unwrap()).unwrap();
        assert_eq!(stored, json!({"key-auth": {"key": "abc", "disable": false}}));
    }
}
