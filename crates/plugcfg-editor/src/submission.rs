//! # Submissions
//!
//! Turning the editor's raw text into a candidate value, and merging
//! accepted candidates into the persisted plugin map.
//!
//! ## Persisted Shape
//!
//! The plugin map is a plain JSON object keyed by plugin name. Each value is
//! the plugin's configuration object plus the implicit boolean field
//! (`disable` by default). A plugin is enabled when it has an entry whose
//! field is not `true`.
//!
//! Only [`PluginConfigMap::apply`] writes configuration objects, and the
//! orchestrator calls it only after validation succeeded, so a rejected
//! candidate never reaches the map.

use plugcfg_core::DEFAULT_DISABLE_FIELD;
use serde_json::{Map, Value};
use thiserror::Error;

/// The editor text could not be read as JSON or YAML.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CandidateParseError {
    /// Nothing but whitespace was submitted.
    #[error("configuration is empty")]
    Empty,

    /// Neither parser accepted the text. Both messages are kept because the
    /// user may have meant either format.
    #[error("configuration is neither valid JSON ({json}) nor valid YAML ({yaml})")]
    Syntax { json: String, yaml: String },
}

/// Parse editor text into a candidate value.
///
/// JSON is tried first; YAML is accepted too since the annotated example is
/// rendered as YAML and users often edit it in place.
///
/// # Errors
///
/// Returns `CandidateParseError` for blank text or text neither parser
/// accepts.
pub fn parse_candidate(text: &str) -> Result<Value, CandidateParseError> {
    if text.trim().is_empty() {
        return Err(CandidateParseError::Empty);
    }
    let json_err = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    serde_yaml::from_str::<Value>(text).map_err(|yaml_err| CandidateParseError::Syntax {
        json: json_err.to_string(),
        yaml: yaml_err.to_string(),
    })
}

/// Failure to update a [`PluginConfigMap`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginMapError {
    /// Plugin configurations must be JSON objects.
    #[error("configuration for plugin '{name}' must be an object, got {found}")]
    NotAnObject { name: String, found: &'static str },

    /// The persisted plugin map itself is not an object.
    #[error("plugin map must be an object, got {found}")]
    InvalidMap { found: &'static str },
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Plugin name → configuration object, as persisted on a route or consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginConfigMap {
    plugins: Map<String, Value>,
    disable_field: String,
}

impl Default for PluginConfigMap {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginConfigMap {
    /// An empty map using the default `disable` field.
    pub fn new() -> Self {
        Self::with_disable_field(DEFAULT_DISABLE_FIELD)
    }

    /// An empty map whose toggle field is named `field`.
    pub fn with_disable_field(field: impl Into<String>) -> Self {
        Self {
            plugins: Map::new(),
            disable_field: field.into(),
        }
    }

    /// Load a persisted map.
    ///
    /// # Errors
    ///
    /// Returns `PluginMapError::InvalidMap` unless `value` is an object.
    pub fn from_value(value: Value) -> Result<Self, PluginMapError> {
        Self::from_value_with_field(value, DEFAULT_DISABLE_FIELD)
    }

    /// Load a persisted map whose toggle field is named `field`.
    ///
    /// # Errors
    ///
    /// Returns `PluginMapError::InvalidMap` unless `value` is an object.
    pub fn from_value_with_field(
        value: Value,
        field: impl Into<String>,
    ) -> Result<Self, PluginMapError> {
        let mut map = Self::with_disable_field(field);
        match value {
            Value::Object(plugins) => {
                map.plugins = plugins;
                Ok(map)
            }
            other => Err(PluginMapError::InvalidMap {
                found: json_type(&other),
            }),
        }
    }

    /// The toggle field name.
    pub fn disable_field(&self) -> &str {
        &self.disable_field
    }

    /// The stored configuration for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.plugins.get(name)
    }

    /// True if `name` has an entry that is not disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.plugins
            .get(name)
            .is_some_and(|config| config.get(&self.disable_field) != Some(&Value::Bool(true)))
    }

    /// Store an accepted configuration for `name`, replacing any previous
    /// one, with the toggle field set to `!enabled`.
    ///
    /// # Errors
    ///
    /// Returns `PluginMapError::NotAnObject` if `config` is not an object;
    /// the map is left unchanged.
    pub fn apply(&mut self, name: &str, config: Value, enabled: bool) -> Result<(), PluginMapError> {
        let Value::Object(mut object) = config else {
            return Err(PluginMapError::NotAnObject {
                name: name.to_string(),
                found: json_type(&config),
            });
        };
        object.insert(self.disable_field.clone(), Value::Bool(!enabled));
        self.plugins.insert(name.to_string(), Value::Object(object));
        Ok(())
    }

    /// Flip the toggle of an existing entry. Returns `false` if `name` has
    /// no object entry.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.plugins.get_mut(name).and_then(Value::as_object_mut) {
            Some(object) => {
                object.insert(self.disable_field.clone(), Value::Bool(!enabled));
                true
            }
            None => false,
        }
    }

    /// Drop the entry for `name`.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.plugins.remove(name)
    }

    /// Plugin names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.plugins.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.plugins)
    }
}
