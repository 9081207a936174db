//! # Schema Validation
//!
//! Compile once, validate many. [`SchemaValidator::compile`] turns a schema
//! into a [`CompiledSchema`]; [`CompiledSchema::validate`] checks a candidate
//! configuration and returns every violation found in one pass.
//!
//! ## Contract
//!
//! - Compiling has no side effects and is idempotent. There is no shared
//!   validator state; callers may cache a `CompiledSchema` per plugin.
//! - Validation never stops at the first failure. Failures come back in the
//!   engine's traversal order (schema declaration order). Callers may rely on
//!   every real violation being present, not on the order or on duplicates
//!   being suppressed.
//! - Remote `$ref`s are refused at compile time; plugin schemas are
//!   self-contained.
//!
//! Augmentation is the caller's job: compile the output of
//! [`augment`](crate::augment::augment) so every `oneOf` branch accepts the
//! implicit `disable` field.

use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Retrieve, Uri, ValidationError, Validator};
use plugcfg_core::{ConfigPath, PipelineConfig, SchemaDraft};
use serde_json::Value;
use thiserror::Error;

use crate::schema::Schema;

/// The schema is not a valid JSON Schema for the configured draft.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("schema compile error: {reason}")]
pub struct SchemaCompileError {
    /// The engine's explanation.
    pub reason: String,
}

/// The keyword that produced a failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailureKeyword {
    /// A required property is missing.
    Required,
    /// The value has the wrong JSON type.
    Type,
    /// The value is not one of the allowed literals.
    Enum,
    /// The array is shorter than `minItems`.
    MinItems,
    /// No (or more than one) `oneOf` branch matched.
    OneOf,
    /// No `anyOf` branch matched.
    AnyOf,
    /// Any other keyword, by name (`minLength`, `maximum`, …).
    Other(String),
}

impl FailureKeyword {
    /// Classify a keyword name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "required" => Self::Required,
            "type" => Self::Type,
            "enum" => Self::Enum,
            "minItems" => Self::MinItems,
            "oneOf" => Self::OneOf,
            "anyOf" => Self::AnyOf,
            other => Self::Other(other.to_string()),
        }
    }

    /// Classify the keyword at the end of a schema path such as
    /// `/properties/discovery/minLength`.
    pub fn from_schema_path(schema_path: &str) -> Self {
        Self::from_name(schema_path.rsplit('/').next().unwrap_or_default())
    }

    /// The keyword name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::MinItems => "minItems",
            Self::OneOf => "oneOf",
            Self::AnyOf => "anyOf",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for FailureKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword-specific details of a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureParams {
    /// Nothing beyond the message.
    None,
    /// `enum`: the allowed literals.
    AllowedValues(Vec<Value>),
    /// `required`: the missing property.
    MissingProperty(String),
    /// `minItems`: the lower bound.
    MinItems(u64),
}

/// One way a candidate violates its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    /// The keyword that failed.
    pub keyword: FailureKeyword,
    /// Location of the offending value in the candidate.
    pub instance_path: ConfigPath,
    /// JSON pointer to the failing keyword in the schema.
    pub schema_path: String,
    /// The engine's message.
    pub message: String,
    /// Keyword-specific details.
    pub params: FailureParams,
}

impl ValidationFailure {
    fn from_engine(error: &ValidationError<'_>) -> Self {
        let schema_path = error.schema_path.to_string();
        let instance_path =
            ConfigPath::from_pointer(&error.instance_path.to_string()).unwrap_or_default();
        let params = match &error.kind {
            ValidationErrorKind::Enum { options } => FailureParams::AllowedValues(
                options
                    .as_array()
                    .cloned()
                    .unwrap_or_else(|| vec![options.clone()]),
            ),
            ValidationErrorKind::Required { property } => FailureParams::MissingProperty(
                property
                    .as_str()
                    .map_or_else(|| property.to_string(), str::to_string),
            ),
            ValidationErrorKind::MinItems { limit } => FailureParams::MinItems(*limit),
            _ => FailureParams::None,
        };
        Self {
            keyword: FailureKeyword::from_schema_path(&schema_path),
            instance_path,
            schema_path,
            message: error.to_string(),
            params,
        }
    }
}

/// Refuses every remote reference so compiling never touches the network.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("remote schema references are not supported: {}", uri.as_str()).into())
    }
}

/// Compiles schemas with a fixed draft and format policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaValidator {
    draft: SchemaDraft,
    validate_formats: bool,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl SchemaValidator {
    /// A validator for the given draft.
    pub fn new(draft: SchemaDraft, validate_formats: bool) -> Self {
        Self {
            draft,
            validate_formats,
        }
    }

    /// A validator using the draft and format policy from `config`.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.draft, config.validate_formats)
    }

    /// Compile `schema` for repeated validation.
    ///
    /// # Errors
    ///
    /// Returns `SchemaCompileError` if the schema is structurally invalid or
    /// references a remote schema.
    pub fn compile(&self, schema: &Schema) -> Result<CompiledSchema, SchemaCompileError> {
        let mut opts = jsonschema::options();
        opts.with_draft(engine_draft(self.draft));
        opts.should_validate_formats(self.validate_formats);
        opts.with_retriever(OfflineRetriever);

        let validator = opts.build(schema.as_value()).map_err(|e| SchemaCompileError {
            reason: e.to_string(),
        })?;
        tracing::trace!(draft = %self.draft, "compiled plugin schema");
        Ok(CompiledSchema {
            validator,
            draft: self.draft,
        })
    }
}

fn engine_draft(draft: SchemaDraft) -> Draft {
    match draft {
        SchemaDraft::Draft4 => Draft::Draft4,
        SchemaDraft::Draft6 => Draft::Draft6,
        SchemaDraft::Draft7 => Draft::Draft7,
        SchemaDraft::Draft201909 => Draft::Draft201909,
        SchemaDraft::Draft202012 => Draft::Draft202012,
    }
}

/// A schema ready to validate candidates. `Send + Sync`; share it behind an
/// `Arc` to validate from several tasks.
pub struct CompiledSchema {
    validator: Validator,
    draft: SchemaDraft,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("draft", &self.draft)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    /// Check `instance`, collecting every failure.
    ///
    /// # Errors
    ///
    /// Returns all failures when the instance does not conform.
    pub fn validate(&self, instance: &Value) -> Result<(), Vec<ValidationFailure>> {
        let failures: Vec<ValidationFailure> = self
            .validator
            .iter_errors(instance)
            .map(|e| ValidationFailure::from_engine(&e))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    /// True if `instance` conforms.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// The draft this schema was compiled with.
    pub fn draft(&self) -> SchemaDraft {
        self.draft
    }
}
