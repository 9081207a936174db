//! # Error Types
//!
//! Errors shared by every crate in the workspace. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations and carry the
//! offending input so a message is actionable without a debugger.

use thiserror::Error;

/// Error loading or applying a [`PipelineConfig`](crate::PipelineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file '{path}': {source}")]
    Read {
        /// Path of the configuration file.
        path: String,
        /// Underlying IO failure.
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for `PipelineConfig`.
    #[error("invalid config file '{path}': {source}")]
    Parse {
        /// Path of the configuration file.
        path: String,
        /// Underlying YAML failure.
        source: serde_yaml::Error,
    },

    /// An environment variable held a value that cannot be used.
    #[error("invalid value for {var}: '{value}' ({reason})")]
    InvalidEnv {
        /// Name of the environment variable.
        var: String,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A setting is syntactically valid but unusable.
    #[error("invalid setting {field}: {reason}")]
    InvalidSetting {
        /// Name of the setting.
        field: &'static str,
        /// Why the setting was rejected.
        reason: String,
    },
}

/// Error parsing a JSON pointer into a [`ConfigPath`](crate::ConfigPath).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Non-empty pointers must start with `/`.
    #[error("JSON pointer must start with '/': {0}")]
    MissingLeadingSlash(String),

    /// `~` must be followed by `0` or `1`.
    #[error("invalid escape sequence in JSON pointer: {0}")]
    InvalidEscape(String),
}
