//! # plugcfg-core — Foundational Types for the Plugin Configuration Pipeline
//!
//! This crate is the leaf of the plugcfg workspace. It defines the small set
//! of primitives every other crate agrees on:
//!
//! 1. **`ConfigPath`** — the first-class location of a node inside a
//!    configuration document. The same path type joins schema nodes, value
//!    nodes, document nodes and validation failures, so path semantics stay
//!    uniform across synthesis, annotation and diagnostics.
//!
//! 2. **`PipelineConfig`** — the knobs of the pipeline (injected field name,
//!    synthesis depth limit, validation draft), loadable from defaults, a YAML
//!    file and the environment.
//!
//! 3. **Shared error types** — `ConfigError` and `PathError`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `plugcfg-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod error;
pub mod path;

// Re-export primary types for ergonomic imports.
pub use config::{PipelineConfig, SchemaDraft, DEFAULT_DISABLE_FIELD, DEFAULT_MAX_DEPTH};
pub use error::{ConfigError, PathError};
pub use path::{ConfigPath, PathSegment};
