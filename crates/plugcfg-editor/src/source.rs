//! # Schema Sources
//!
//! Where plugin schemas come from. The pipeline only sees the
//! [`SchemaSource`] trait; fetching is the single suspension point of an
//! editor action and is attempted once, without retry.
//!
//! Two implementations ship with the crate:
//!
//! - [`StaticSchemaSource`] — an in-memory map, for embedding and tests.
//! - [`DirectorySchemaSource`] — one JSON file per plugin under
//!   `<root>/<category>/<unit>.json`, read with `tokio::fs`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use plugcfg_schema::Schema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The scope a plugin schema is requested for.
///
/// The same plugin can expose a different schema when it is attached to a
/// consumer rather than a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaCategory {
    #[default]
    Route,
    Consumer,
}

impl SchemaCategory {
    /// The lowercase name used in paths and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Consumer => "consumer",
        }
    }
}

impl fmt::Display for SchemaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaCategory {
    type Err = SchemaSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "route" => Ok(Self::Route),
            "consumer" => Ok(Self::Consumer),
            other => Err(SchemaSourceError::UnknownCategory(other.to_string())),
        }
    }
}

/// Failure to obtain a schema.
#[derive(Error, Debug)]
pub enum SchemaSourceError {
    /// The source has no schema for this plugin and category.
    #[error("no {category} schema for plugin '{unit}'")]
    NotFound { unit: String, category: SchemaCategory },

    /// The plugin name cannot be used to locate a schema.
    #[error("invalid plugin name '{0}'")]
    InvalidUnitName(String),

    /// The category name is neither `route` nor `consumer`.
    #[error("unknown schema category '{0}'")]
    UnknownCategory(String),

    /// Reading the schema failed.
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid JSON.
    #[error("failed to parse schema {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Supplies the schema for a plugin in a given category.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Fetch the schema for `unit` in `category`.
    async fn fetch_schema(
        &self,
        unit: &str,
        category: SchemaCategory,
    ) -> Result<Schema, SchemaSourceError>;
}

#[async_trait]
impl<S: SchemaSource + ?Sized> SchemaSource for Arc<S> {
    async fn fetch_schema(
        &self,
        unit: &str,
        category: SchemaCategory,
    ) -> Result<Schema, SchemaSourceError> {
        (**self).fetch_schema(unit, category).await
    }
}

// -- StaticSchemaSource -------------------------------------------------------

/// Schemas held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaSource {
    schemas: HashMap<(String, SchemaCategory), Schema>,
}

impl StaticSchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` for `unit` in `category`, replacing any previous one.
    pub fn insert(&mut self, unit: impl Into<String>, category: SchemaCategory, schema: Schema) {
        self.schemas.insert((unit.into(), category), schema);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, unit: impl Into<String>, category: SchemaCategory, schema: Schema) -> Self {
        self.insert(unit, category, schema);
        self
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[async_trait]
impl SchemaSource for StaticSchemaSource {
    async fn fetch_schema(
        &self,
        unit: &str,
        category: SchemaCategory,
    ) -> Result<Schema, SchemaSourceError> {
        self.schemas
            .get(&(unit.to_string(), category))
            .cloned()
            .ok_or_else(|| SchemaSourceError::NotFound {
                unit: unit.to_string(),
                category,
            })
    }
}

// -- DirectorySchemaSource ----------------------------------------------------

/// Schemas stored as `<root>/<category>/<unit>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySchemaSource {
    root: PathBuf,
}

impl DirectorySchemaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file that holds the schema for `unit` in `category`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnitName` for names that are empty or could escape the
    /// category directory.
    pub fn schema_path(
        &self,
        unit: &str,
        category: SchemaCategory,
    ) -> Result<PathBuf, SchemaSourceError> {
        validate_unit_name(unit)?;
        Ok(self
            .root
            .join(category.as_str())
            .join(format!("{unit}.json")))
    }
}

/// Plugin names are identifiers like `limit-count` or `key_auth`.
fn validate_unit_name(unit: &str) -> Result<(), SchemaSourceError> {
    let valid = !unit.is_empty()
        && !unit.starts_with('.')
        && unit
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(SchemaSourceError::InvalidUnitName(unit.to_string()))
    }
}

#[async_trait]
impl SchemaSource for DirectorySchemaSource {
    async fn fetch_schema(
        &self,
        unit: &str,
        category: SchemaCategory,
    ) -> Result<Schema, SchemaSourceError> {
        let path = self.schema_path(unit, category)?;
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SchemaSourceError::NotFound {
                    unit: unit.to_string(),
                    category,
                })
            }
            Err(source) => return Err(SchemaSourceError::Io { path, source }),
        };
        Schema::from_json_str(&text).map_err(|source| SchemaSourceError::Parse { path, source })
    }
}
