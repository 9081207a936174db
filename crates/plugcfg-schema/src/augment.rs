//! # Schema Augmentation
//!
//! Every plugin accepts an implicit boolean field (`disable` by default)
//! that toggles the plugin off without touching its own settings. Plugin
//! schemas do not declare it, so the pipeline adds it before synthesis and
//! validation.
//!
//! ## Invariant
//!
//! Augmentation never mutates its input. The result is a fresh [`Schema`],
//! so a cached schema can be augmented any number of times, concurrently,
//! without another caller observing a half-augmented document.
//!
//! If the top-level schema has `oneOf`, the field is injected into every
//! alternative so whichever branch the candidate matches accepts it.
//! Otherwise it is injected into the top-level `properties`. A missing
//! `properties` object is created; an existing declaration of the field is
//! replaced.

use plugcfg_core::DEFAULT_DISABLE_FIELD;
use serde_json::{json, Map, Value};

use crate::schema::Schema;

/// Add the default implicit `disable` field.
pub fn augment(schema: &Schema) -> Schema {
    augment_with(schema, DEFAULT_DISABLE_FIELD)
}

/// Add an implicit boolean field named `field`.
pub fn augment_with(schema: &Schema, field: &str) -> Schema {
    let mut value = schema.as_value().clone();

    match value.get_mut("oneOf").and_then(Value::as_array_mut) {
        Some(alternatives) => {
            for alternative in alternatives.iter_mut() {
                inject(alternative, field);
            }
        }
        None => inject(&mut value, field),
    }

    Schema::new(value)
}

fn inject(node: &mut Value, field: &str) {
    // Boolean schemas (`true`/`false`) have nowhere to put properties.
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    let properties = obj
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(properties) = properties.as_object_mut() {
        properties.insert(field.to_string(), json!({"type": "boolean"}));
    }
}
