//! # Schema Model
//!
//! A [`Schema`] owns the raw JSON Schema document of one configuration unit.
//! [`SchemaNode`] is a borrowed, typed view of one node inside it.
//!
//! The raw document is kept as a `serde_json::Value` so that keywords the
//! pipeline does not interpret (`maxLength`, `uniqueItems`, `pattern`, …)
//! survive augmentation untouched and are still enforced by the validator.
//! The typed view exposes only what synthesis and annotation need.
//!
//! ## Kind Inference
//!
//! Every node resolves to exactly one [`SchemaKind`]. An explicit `type`
//! wins (the first entry of a `type` list). Without one, `properties` or
//! `required` mean object, `items` means array, `oneOf`/`anyOf` mean a
//! composition, and otherwise the JSON kind of the first `enum`, `const` or
//! `default` literal is used. A node with no hints at all is an object.
//!
//! ## References
//!
//! Local `$ref` pointers (`#/definitions/...`) are resolved against the
//! document root by [`SchemaNode::resolve`]. Remote references are not
//! followed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest `$ref` chain followed before a reference is treated as unresolvable.
const MAX_REF_HOPS: usize = 32;

/// The kind of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// `type: object`.
    Object,
    /// `type: array`.
    Array,
    /// `type: string`.
    String,
    /// `type: number`.
    Number,
    /// `type: integer`.
    Integer,
    /// `type: boolean`.
    Boolean,
    /// `type: null`.
    Null,
    /// `anyOf` composition without an own type.
    AnyOf,
    /// `oneOf` composition without an own type.
    OneOf,
}

impl SchemaKind {
    /// Parse a JSON Schema `type` name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// The kind of a literal JSON value.
    pub fn of_literal(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// True for `anyOf`/`oneOf`.
    pub fn is_composition(self) -> bool {
        matches!(self, Self::AnyOf | Self::OneOf)
    }

    /// True for the scalar kinds.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::String | Self::Number | Self::Integer | Self::Boolean | Self::Null
        )
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::AnyOf => "anyOf",
            Self::OneOf => "oneOf",
        };
        f.write_str(name)
    }
}

/// The schema of one configuration unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(Value);

impl Schema {
    /// Wrap a raw JSON Schema document.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parse a JSON Schema document from text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the text is not JSON.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self)
    }

    /// The raw document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the schema, returning the raw document.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// A view of the top-level node.
    pub fn root(&self) -> SchemaNode<'_> {
        SchemaNode {
            root: &self.0,
            value: &self.0,
        }
    }
}

impl From<Value> for Schema {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Borrowed view of one node of a [`Schema`].
///
/// Accessors read the node as written; call [`resolve`](Self::resolve)
/// first when the node may be a `$ref`.
#[derive(Debug, Clone, Copy)]
pub struct SchemaNode<'a> {
    root: &'a Value,
    value: &'a Value,
}

impl<'a> SchemaNode<'a> {
    fn at(&self, value: &'a Value) -> SchemaNode<'a> {
        SchemaNode {
            root: self.root,
            value,
        }
    }

    /// The raw JSON of this node.
    pub fn as_value(&self) -> &'a Value {
        self.value
    }

    fn keyword(&self, name: &str) -> Option<&'a Value> {
        self.value.as_object().and_then(|obj| obj.get(name))
    }

    /// The `$ref` target of this node, if it is a reference.
    pub fn reference(&self) -> Option<&'a str> {
        self.keyword("$ref").and_then(Value::as_str)
    }

    /// Follow local `$ref`s until reaching a non-reference node.
    ///
    /// Returns `None` if a reference is remote, points nowhere, or the chain
    /// is longer than 32 hops (a reference cycle).
    pub fn resolve(&self) -> Option<SchemaNode<'a>> {
        let mut node = *self;
        for _ in 0..MAX_REF_HOPS {
            let Some(reference) = node.reference() else {
                return Some(node);
            };
            let pointer = reference.strip_prefix('#')?;
            node = node.at(self.root.pointer(pointer)?);
        }
        None
    }

    /// The kind of this node (see the module documentation for inference).
    pub fn kind(&self) -> SchemaKind {
        match self.keyword("type") {
            Some(Value::String(name)) => {
                if let Some(kind) = SchemaKind::from_type_name(name) {
                    return kind;
                }
            }
            Some(Value::Array(names)) => {
                if let Some(kind) = names
                    .iter()
                    .filter_map(Value::as_str)
                    .find_map(SchemaKind::from_type_name)
                {
                    return kind;
                }
            }
            _ => {}
        }

        if self.keyword("properties").is_some() || self.keyword("required").is_some() {
            return SchemaKind::Object;
        }
        if self.keyword("items").is_some() {
            return SchemaKind::Array;
        }
        if self.keyword("oneOf").is_some() {
            return SchemaKind::OneOf;
        }
        if self.keyword("anyOf").is_some() {
            return SchemaKind::AnyOf;
        }
        self.enum_values()
            .and_then(|values| values.first())
            .or_else(|| self.const_value())
            .or_else(|| self.default())
            .map(SchemaKind::of_literal)
            .unwrap_or(SchemaKind::Object)
    }

    /// `title`.
    pub fn title(&self) -> Option<&'a str> {
        self.keyword("title").and_then(Value::as_str)
    }

    /// `description`.
    pub fn description(&self) -> Option<&'a str> {
        self.keyword("description").and_then(Value::as_str)
    }

    /// `default`. A `null`, `0` or `false` default is still present.
    pub fn default(&self) -> Option<&'a Value> {
        self.keyword("default")
    }

    /// `const`.
    pub fn const_value(&self) -> Option<&'a Value> {
        self.keyword("const")
    }

    /// `enum`, when it is a list.
    pub fn enum_values(&self) -> Option<&'a [Value]> {
        self.keyword("enum")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }

    /// `examples`, when it is a list.
    pub fn examples(&self) -> Option<&'a [Value]> {
        self.keyword("examples")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }

    /// `minimum`, when numeric.
    pub fn minimum(&self) -> Option<&'a serde_json::Number> {
        self.keyword("minimum").and_then(as_number)
    }

    /// `maximum`, when numeric.
    pub fn maximum(&self) -> Option<&'a serde_json::Number> {
        self.keyword("maximum").and_then(as_number)
    }

    /// `exclusiveMinimum` as written: a number (draft 6+) or a flag (draft 4).
    pub fn exclusive_minimum(&self) -> Option<&'a Value> {
        self.keyword("exclusiveMinimum")
    }

    /// `exclusiveMaximum` as written: a number (draft 6+) or a flag (draft 4).
    pub fn exclusive_maximum(&self) -> Option<&'a Value> {
        self.keyword("exclusiveMaximum")
    }

    /// `minItems`.
    pub fn min_items(&self) -> Option<u64> {
        self.keyword("minItems").and_then(Value::as_u64)
    }

    /// `minLength`.
    pub fn min_length(&self) -> Option<u64> {
        self.keyword("minLength").and_then(Value::as_u64)
    }

    /// `format`, e.g. `ipv4` or `uri`.
    pub fn format(&self) -> Option<&'a str> {
        self.keyword("format").and_then(Value::as_str)
    }

    /// `pattern`.
    pub fn pattern(&self) -> Option<&'a str> {
        self.keyword("pattern").and_then(Value::as_str)
    }

    /// True when `uniqueItems: true`.
    pub fn unique_items(&self) -> bool {
        self.keyword("uniqueItems") == Some(&Value::Bool(true))
    }

    /// Declared properties, in declaration order.
    pub fn properties(&self) -> Vec<(&'a str, SchemaNode<'a>)> {
        self.keyword("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, child)| (name.as_str(), self.at(child)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Look up a property schema by name.
    ///
    /// Own `properties` are searched first, then each alternative of
    /// `oneOf`/`anyOf` in order, so keys contributed by the first matching
    /// branch are found too.
    pub fn property(&self, name: &str) -> Option<SchemaNode<'a>> {
        if let Some(child) = self
            .keyword("properties")
            .and_then(Value::as_object)
            .and_then(|props| props.get(name))
        {
            return Some(self.at(child));
        }
        self.alternatives()
            .into_iter()
            .filter_map(|alt| alt.resolve())
            .find_map(|alt| alt.property(name))
    }

    /// `required` property names.
    pub fn required(&self) -> Vec<&'a str> {
        self.keyword("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// The element schema of an array node. Tuple-form `items` yields its
    /// first entry.
    pub fn items(&self) -> Option<SchemaNode<'a>> {
        match self.keyword("items")? {
            Value::Array(tuple) => tuple.first().map(|child| self.at(child)),
            child => Some(self.at(child)),
        }
    }

    /// `oneOf` alternatives.
    pub fn one_of(&self) -> Option<Vec<SchemaNode<'a>>> {
        self.keyword("oneOf")
            .and_then(Value::as_array)
            .map(|alts| alts.iter().map(|alt| self.at(alt)).collect())
    }

    /// `anyOf` alternatives.
    pub fn any_of(&self) -> Option<Vec<SchemaNode<'a>>> {
        self.keyword("anyOf")
            .and_then(Value::as_array)
            .map(|alts| alts.iter().map(|alt| self.at(alt)).collect())
    }

    /// The composition alternatives of this node: `oneOf` if present,
    /// otherwise `anyOf`, otherwise none.
    pub fn alternatives(&self) -> Vec<SchemaNode<'a>> {
        self.one_of().or_else(|| self.any_of()).unwrap_or_default()
    }
}

fn as_number(value: &Value) -> Option<&serde_json::Number> {
    match value {
        Value::Number(n) => Some(n),
        _ => None,
    }
}
