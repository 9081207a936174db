//! # Pipeline Orchestrator
//!
//! Sequences the schema stages for the two editor actions:
//!
//! - **annotated example**: fetch → augment → synthesize → build → annotate;
//! - **validate submitted data**: fetch → augment → compile → validate →
//!   format.
//!
//! [`PipelineOrchestrator::accept_submission`] adds parsing in front of
//! validation and the plugin-map merge behind it.
//!
//! ## Concurrency
//!
//! CPU work is synchronous; the only `.await` is the schema fetch. The one
//! piece of shared mutable state is the compiled-validator cache keyed by
//! `(plugin, category)`. The lock is `parking_lot` and is never held across
//! an `.await`. Two tasks that miss the cache at the same time both compile;
//! the first insert wins and both get an equivalent validator.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use plugcfg_core::PipelineConfig;
use plugcfg_schema::{
    annotate, augment_with, format_failures, CompiledSchema, Document, ExampleSynthesizer,
    Schema, SchemaCompileError, SchemaValidator, SynthesisError, ValidationFailure,
};
use serde_json::Value;
use thiserror::Error;

use crate::source::{SchemaCategory, SchemaSource, SchemaSourceError};
use crate::submission::{parse_candidate, CandidateParseError, PluginConfigMap, PluginMapError};

/// A candidate that failed validation, with every failure found.
#[derive(Error, Debug, Clone, PartialEq)]
pub struct Rejection {
    failures: Vec<ValidationFailure>,
}

impl Rejection {
    /// Wrap the failures of one validation attempt.
    pub fn new(failures: Vec<ValidationFailure>) -> Self {
        Self { failures }
    }

    /// The failures in the order the validator reported them.
    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    /// One user-facing line per failure.
    pub fn diagnostics(&self) -> Vec<String> {
        format_failures(&self.failures)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plugin data: {} failure(s)", self.failures.len())
    }
}

/// Failure of a pipeline action. Every variant ends the current action.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SchemaSourceError),

    #[error(transparent)]
    Compile(#[from] SchemaCompileError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Parse(#[from] CandidateParseError),

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    PluginMap(#[from] PluginMapError),
}

impl PipelineError {
    /// The validation failures, if this is a rejection.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// A synthesized example and its annotated document.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedExample {
    /// The synthesized value, including the toggle field.
    pub value: Value,
    /// `value` as a document carrying the schema's comment blocks.
    pub document: Document,
}

impl AnnotatedExample {
    /// The YAML text shown in the editor.
    pub fn text(&self) -> String {
        self.document.render()
    }
}

type CacheKey = (String, SchemaCategory);

/// Runs editor actions against schemas from `S`.
pub struct PipelineOrchestrator<S> {
    source: S,
    config: PipelineConfig,
    synthesizer: ExampleSynthesizer,
    validator: SchemaValidator,
    compiled: RwLock<HashMap<CacheKey, Arc<CompiledSchema>>>,
}

impl<S> fmt::Debug for PipelineOrchestrator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("config", &self.config)
            .field("cached", &self.compiled.read().len())
            .finish_non_exhaustive()
    }
}

impl<S: SchemaSource> PipelineOrchestrator<S> {
    /// An orchestrator with default settings.
    pub fn new(source: S) -> Self {
        Self::with_config(source, PipelineConfig::default())
    }

    /// An orchestrator whose toggle field, depth limit and validator
    /// settings come from `config`.
    pub fn with_config(source: S, config: PipelineConfig) -> Self {
        Self {
            source,
            synthesizer: ExampleSynthesizer::from_config(&config),
            validator: SchemaValidator::from_config(&config),
            config,
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// The settings this orchestrator was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The schema source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch the schema for `unit` and build its annotated example.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Source` if the schema cannot be fetched and
    /// `PipelineError::Synthesis` if no example can be built.
    pub async fn annotated_example(
        &self,
        unit: &str,
        category: SchemaCategory,
    ) -> Result<AnnotatedExample, PipelineError> {
        tracing::debug!(unit, %category, "fetching schema for example");
        let schema = self.source.fetch_schema(unit, category).await?;
        self.example_for_schema(&schema)
    }

    /// Build the annotated example for an already available schema.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Synthesis` for cyclic or unresolvable schemas.
    pub fn example_for_schema(&self, schema: &Schema) -> Result<AnnotatedExample, PipelineError> {
        let augmented = augment_with(schema, &self.config.disable_field);
        let value = self.synthesizer.synthesize(&augmented)?;
        let mut document = Document::build(&value);
        annotate(&augmented, &mut document);
        Ok(AnnotatedExample { value, document })
    }

    /// Validate `candidate` against the schema for `unit`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Rejected` with every failure when the
    /// candidate does not conform, or the fetch/compile error that prevented
    /// validation.
    pub async fn validate_submission(
        &self,
        unit: &str,
        category: SchemaCategory,
        candidate: &Value,
    ) -> Result<(), PipelineError> {
        let compiled = self.compiled(unit, category).await?;
        self.validate_against(&compiled, candidate).map_err(|rejection| {
            for line in rejection.diagnostics() {
                tracing::warn!(unit, %category, failure = %line, "invalid plugin data");
            }
            PipelineError::from(rejection)
        })
    }

    /// Parse `text`, validate it, and store it in `plugins` under `unit`.
    ///
    /// Returns the stored configuration, including the toggle field.
    ///
    /// # Errors
    ///
    /// Any parse, fetch, compile or validation failure. `plugins` is only
    /// modified when everything succeeded.
    pub async fn accept_submission(
        &self,
        plugins: &mut PluginConfigMap,
        unit: &str,
        category: SchemaCategory,
        text: &str,
        enabled: bool,
    ) -> Result<Value, PipelineError> {
        let candidate = parse_candidate(text)?;
        self.validate_submission(unit, category, &candidate).await?;
        plugins.apply(unit, candidate, enabled)?;
        tracing::info!(unit, %category, enabled, "plugin configuration accepted");
        Ok(plugins.get(unit).cloned().unwrap_or(Value::Null))
    }

    /// Augment and compile `schema` without touching the cache.
    ///
    /// # Errors
    ///
    /// Returns `SchemaCompileError` if the schema is not a valid JSON Schema.
    pub fn compile_schema(&self, schema: &Schema) -> Result<CompiledSchema, SchemaCompileError> {
        self.validator
            .compile(&augment_with(schema, &self.config.disable_field))
    }

    /// Check `candidate` against a compiled schema.
    ///
    /// # Errors
    ///
    /// Returns every failure as a `Rejection`.
    pub fn validate_against(
        &self,
        compiled: &CompiledSchema,
        candidate: &Value,
    ) -> Result<(), Rejection> {
        compiled.validate(candidate).map_err(Rejection::new)
    }

    /// The compiled validator for `unit`, compiling and caching it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the fetch or compile error; failures are not cached.
    pub async fn compiled(
        &self,
        unit: &str,
        category: SchemaCategory,
    ) -> Result<Arc<CompiledSchema>, PipelineError> {
        let key = (unit.to_string(), category);
        let cached = self.compiled.read().get(&key).cloned();
        if let Some(compiled) = cached {
            tracing::debug!(unit, %category, "compiled schema cache hit");
            return Ok(compiled);
        }

        tracing::debug!(unit, %category, "fetching schema for validation");
        let schema = self.source.fetch_schema(unit, category).await?;
        let compiled = Arc::new(self.compile_schema(&schema)?);

        let mut cache = self.compiled.write();
        let entry = cache.entry(key).or_insert(compiled);
        Ok(Arc::clone(entry))
    }

    /// Drop the cached validator for `unit`, e.g. after its schema changed.
    pub fn invalidate(&self, unit: &str, category: SchemaCategory) -> bool {
        self.compiled
            .write()
            .remove(&(unit.to_string(), category))
            .is_some()
    }

    /// Number of cached validators.
    pub fn cached_len(&self) -> usize {
        self.compiled.read().len()
    }
}
