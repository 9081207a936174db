//! # plugcfg-editor — Plugin Configuration Editor Pipeline
//!
//! The layer between the editor surface and the pure schema stages in
//! `plugcfg-schema`:
//!
//! - [`source`] — the async [`SchemaSource`] seam plus in-memory and
//!   directory-backed implementations.
//! - [`pipeline`] — [`PipelineOrchestrator`], which sequences the stages for
//!   "show annotated example" and "validate submitted data" and caches
//!   compiled validators per plugin.
//! - [`submission`] — parsing editor text and the persisted
//!   [`PluginConfigMap`].
//! - [`catalog`] — which plugins the editor offers, grouped by category.
//!
//! ## Crate Policy
//!
//! - Library code logs through `tracing` and never installs a subscriber.
//! - A candidate that failed validation is never merged into a plugin map.

pub mod catalog;
pub mod pipeline;
pub mod source;
pub mod submission;

pub use catalog::{
    documentation_url, requires_configuration, PluginCatalog, PluginMeta, SupportedPlugins,
};
pub use pipeline::{AnnotatedExample, PipelineError, PipelineOrchestrator, Rejection};
pub use source::{
    DirectorySchemaSource, SchemaCategory, SchemaSource, SchemaSourceError, StaticSchemaSource,
};
pub use submission::{parse_candidate, CandidateParseError, PluginConfigMap, PluginMapError};
