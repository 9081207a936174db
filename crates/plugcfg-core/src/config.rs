//! # Pipeline Configuration
//!
//! Settings shared by the augmenter, the synthesizer and the validator.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. [`PipelineConfig::default`]
//! 2. a YAML file ([`PipelineConfig::from_yaml_file`]); missing keys keep
//!    their defaults
//! 3. environment variables ([`PipelineConfig::apply_env`]):
//!    - `PLUGCFG_DISABLE_FIELD` (default: `disable`)
//!    - `PLUGCFG_MAX_DEPTH` (default: 64)
//!    - `PLUGCFG_DRAFT` (default: `draft7`)
//!    - `PLUGCFG_VALIDATE_FORMATS` (default: `true`)

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the implicit enable/disable field injected into every schema.
pub const DEFAULT_DISABLE_FIELD: &str = "disable";

/// Recursion limit for example synthesis. Only cyclic `$ref` chains reach it.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// JSON Schema draft used when compiling validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaDraft {
    /// Draft 4.
    Draft4,
    /// Draft 6.
    Draft6,
    /// Draft 7, the plugin editor's historical default.
    #[default]
    Draft7,
    /// Draft 2019-09.
    Draft201909,
    /// Draft 2020-12.
    Draft202012,
}

impl fmt::Display for SchemaDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Draft4 => "draft4",
            Self::Draft6 => "draft6",
            Self::Draft7 => "draft7",
            Self::Draft201909 => "draft201909",
            Self::Draft202012 => "draft202012",
        };
        f.write_str(name)
    }
}

impl FromStr for SchemaDraft {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft4" | "4" => Ok(Self::Draft4),
            "draft6" | "6" => Ok(Self::Draft6),
            "draft7" | "7" => Ok(Self::Draft7),
            "draft201909" | "2019-09" => Ok(Self::Draft201909),
            "draft202012" | "2020-12" => Ok(Self::Draft202012),
            other => Err(format!("unknown schema draft '{other}'")),
        }
    }
}

/// Settings for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Property injected into every schema to toggle a plugin off.
    pub disable_field: String,
    /// Maximum schema nesting followed during example synthesis.
    pub max_depth: usize,
    /// Draft used to compile validators.
    pub draft: SchemaDraft,
    /// Whether `format` keywords are asserted during validation.
    pub validate_formats: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            disable_field: DEFAULT_DISABLE_FIELD.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            draft: SchemaDraft::default(),
            validate_formats: true,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a YAML file. Absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read,
    /// `ConfigError::Parse` if it is not a valid configuration document and
    /// `ConfigError::InvalidSetting` if a value is out of range.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?
        };
        config.check()?;
        Ok(config)
    }

    /// Override settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnv` if a variable is set to an
    /// unparseable value.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Override settings from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`apply_env`](Self::apply_env).
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(field) = lookup("PLUGCFG_DISABLE_FIELD") {
            if field.trim().is_empty() {
                return Err(invalid_env("PLUGCFG_DISABLE_FIELD", &field, "must not be empty"));
            }
            self.disable_field = field.trim().to_string();
        }
        if let Some(depth) = lookup("PLUGCFG_MAX_DEPTH") {
            self.max_depth = match depth.trim().parse::<usize>() {
                Ok(0) => return Err(invalid_env("PLUGCFG_MAX_DEPTH", &depth, "must be positive")),
                Ok(n) => n,
                Err(e) => return Err(invalid_env("PLUGCFG_MAX_DEPTH", &depth, &e.to_string())),
            };
        }
        if let Some(draft) = lookup("PLUGCFG_DRAFT") {
            self.draft = draft
                .parse()
                .map_err(|reason: String| invalid_env("PLUGCFG_DRAFT", &draft, &reason))?;
        }
        if let Some(flag) = lookup("PLUGCFG_VALIDATE_FORMATS") {
            self.validate_formats = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(invalid_env(
                        "PLUGCFG_VALIDATE_FORMATS",
                        &flag,
                        "expected a boolean",
                    ))
                }
            };
        }
        Ok(())
    }

    /// Reject settings that deserialize but cannot work.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSetting` for an empty disable field or a
    /// zero depth limit.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.disable_field.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                field: "disable_field",
                reason: "must not be empty".to_string(),
            });
        }
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "max_depth",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn invalid_env(var: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_match_editor_behavior() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.disable_field, "disable");
        assert_eq!(cfg.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(cfg.draft, SchemaDraft::Draft7);
        assert!(cfg.validate_formats);
    }

    #[test]
    fn env_overrides_every_setting() {
        let mut cfg = PipelineConfig::default();
        cfg.apply_env_from(env(&[
            ("PLUGCFG_DISABLE_FIELD", "_disabled"),
            ("PLUGCFG_MAX_DEPTH", "12"),
            ("PLUGCFG_DRAFT", "2020-12"),
            ("PLUGCFG_VALIDATE_FORMATS", "off"),
        ]))
        .unwrap();
        assert_eq!(cfg.disable_field, "_disabled");
        assert_eq!(cfg.max_depth, 12);
        assert_eq!(cfg.draft, SchemaDraft::Draft202012);
        assert!(!cfg.validate_formats);
    }

    #[test]
    fn env_rejects_bad_values() {
        let mut cfg = PipelineConfig::default();
        let err = cfg
            .apply_env_from(env(&[("PLUGCFG_MAX_DEPTH", "deep")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref var, .. } if var == "PLUGCFG_MAX_DEPTH"));

        let err = cfg
            .apply_env_from(env(&[("PLUGCFG_DRAFT", "draft3")]))
            .unwrap_err();
        assert!(err.to_string().contains("draft3"));

        assert!(cfg
            .apply_env_from(env(&[("PLUGCFG_MAX_DEPTH", "0")]))
            .is_err());
    }

    #[test]
    fn yaml_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugcfg.yaml");
        std::fs::write(&path, "max_depth: 8\ndraft: draft4\n").unwrap();
        let cfg = PipelineConfig::from_yaml_file(&path).unwrap();
        assert_eq!(cfg.max_depth, 8);
        assert_eq!(cfg.draft, SchemaDraft::Draft4);
        assert_eq!(cfg.disable_field, "disable");
    }

    #[test]
    fn yaml_file_errors_are_structured() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(matches!(
            PipelineConfig::from_yaml_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "max_depth: [1, 2]\n").unwrap();
        assert!(matches!(
            PipelineConfig::from_yaml_file(&bad),
            Err(ConfigError::Parse { .. })
        ));

        let empty_field = dir.path().join("empty.yaml");
        std::fs::write(&empty_field, "disable_field: ''\n").unwrap();
        assert!(matches!(
            PipelineConfig::from_yaml_file(&empty_field),
            Err(ConfigError::InvalidSetting { field: "disable_field", .. })
        ));
    }

    #[test]
    fn draft_parses_and_displays() {
        for draft in [
            SchemaDraft::Draft4,
            SchemaDraft::Draft6,
            SchemaDraft::Draft7,
            SchemaDraft::Draft201909,
            SchemaDraft::Draft202012,
        ] {
            assert_eq!(draft.to_string().parse::<SchemaDraft>().unwrap(), draft);
        }
    }
}
