//! # Diagnostics
//!
//! Turns a [`ValidationFailure`] into the single line shown to the person
//! editing the configuration. The wording depends on the keyword:
//!
//! | keyword              | line                                   |
//! |----------------------|----------------------------------------|
//! | `enum`               | `<path> <message>: <allowed, values>`  |
//! | `minItems`, `type`   | `<path> <message>`                     |
//! | `oneOf`, `required`  | `<message>`                            |
//! | anything else        | `<schema path> <message>`              |
//!
//! Paths render as JSON pointers; the document root renders as `(root)`.
//! One failure always yields exactly one line.

use std::fmt;

use crate::document::plain_value;
use crate::validate::{FailureKeyword, FailureParams, ValidationFailure};

/// The user-facing line for one failure.
pub fn format_failure(failure: &ValidationFailure) -> String {
    let message = &failure.message;
    match failure.keyword {
        FailureKeyword::Enum => {
            let allowed = match &failure.params {
                FailureParams::AllowedValues(values) => values
                    .iter()
                    .map(plain_value)
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => String::new(),
            };
            format!("{} {message}: {allowed}", failure.instance_path)
        }
        FailureKeyword::MinItems | FailureKeyword::Type => {
            format!("{} {message}", failure.instance_path)
        }
        FailureKeyword::OneOf | FailureKeyword::Required => message.clone(),
        FailureKeyword::AnyOf | FailureKeyword::Other(_) => {
            format!("{} {message}", failure.schema_path)
        }
    }
}

/// One line per failure, in input order.
pub fn format_failures(failures: &[ValidationFailure]) -> Vec<String> {
    failures.iter().map(format_failure).collect()
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_failure(self))
    }
}
