//! # plugcfg-schema — Schema-Driven Configuration Documents
//!
//! Everything the pipeline does with a plugin schema, as pure synchronous
//! functions over `serde_json::Value`:
//!
//! ## Example Path
//!
//! [`augment`] → [`ExampleSynthesizer::synthesize`] → [`Document::build`] →
//! [`annotate()`] → [`Document::render`]. The result is a YAML example where
//! every described setting carries its title, description, default, allowed
//! values, bounds and examples as comments.
//!
//! ## Validation Path
//!
//! [`augment`] → [`SchemaValidator::compile`] → [`CompiledSchema::validate`]
//! → [`format_failures`]. Every violation is reported, one line each.
//!
//! ## Crate Policy
//!
//! - Depends only on `plugcfg-core` internally.
//! - No I/O. Fetching schemas and caching compiled validators belong to
//!   `plugcfg-editor`.
//! - Input schemas are never mutated.

pub mod annotate;
pub mod augment;
pub mod diagnostics;
pub mod document;
pub mod schema;
pub mod synthesize;
pub mod validate;

pub use annotate::{annotate, node_annotation, root_annotation, METADATA_KEYS};
pub use augment::{augment, augment_with};
pub use diagnostics::{format_failure, format_failures};
pub use document::{Annotation, DocEntry, DocNode, DocValue, Document};
pub use schema::{Schema, SchemaKind, SchemaNode};
pub use synthesize::{synthesize, ExampleSynthesizer, SynthesisError, MAX_GENERATED_SIZE};
pub use validate::{
    CompiledSchema, FailureKeyword, FailureParams, SchemaCompileError, SchemaValidator,
    ValidationFailure,
};
