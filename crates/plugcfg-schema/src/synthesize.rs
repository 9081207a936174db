//! # Example Synthesis
//!
//! Produces one concrete value tree that conforms to a schema, used to
//! prime the editor with a complete, annotated example.
//!
//! ## Determinism
//!
//! There is no randomness, clock or environment input anywhere in this
//! module. The same schema always yields the same value tree, which keeps
//! annotated examples reproducible and testable.
//!
//! ## Selection Policy
//!
//! At every node the first `examples` entry wins. Otherwise:
//!
//! - scalars take `default`, then `const`, then the first `enum` literal,
//!   then a canonical literal for the kind;
//! - strings with a known `format` use a fixed literal of that format
//!   (`127.0.0.1`, `::1`, `http://127.0.0.1`, `localhost`, ...), other
//!   strings are `""` or `minLength` copies of `"x"`;
//! - numbers start at `0` and are moved into their bounds. Integers step one
//!   unit past an exclusive bound; numbers bounded on both sides take the
//!   midpoint when `0` and the inclusive bounds are all excluded;
//! - objects populate every declared property, required or not, in
//!   declaration order, then merge in keys from their first `oneOf`/`anyOf`
//!   alternative;
//! - arrays hold `max(1, minItems)` elements built from `items`. Under
//!   `uniqueItems` each later element is made distinct: the next `examples`
//!   or `enum` entry, an indexed format literal, an index-suffixed string,
//!   a number offset by the index, or the flipped boolean;
//! - compositions synthesize their first alternative only.
//!
//! `pattern` is not modelled. A string constrained only by a pattern
//! validates when the schema supplies `examples`, `default` or `enum`.
//!
//! ## Limits
//!
//! `minItems` and `minLength` above [`MAX_GENERATED_SIZE`] are refused with
//! [`SynthesisError::TooLarge`], so synthesis stays proportional to the size
//! of the schema.

use plugcfg_core::{ConfigPath, PipelineConfig, DEFAULT_MAX_DEPTH};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::schema::{Schema, SchemaKind, SchemaNode};

/// Largest `minItems` or `minLength` the synthesizer will materialize.
pub const MAX_GENERATED_SIZE: usize = 1024;

/// Error during example synthesis. Every variant is fatal for the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// Nesting exceeded the configured limit, which only a cyclic `$ref`
    /// chain can cause.
    #[error("schema nesting exceeds {limit} levels at {path}; cyclic schemas are not supported")]
    DepthExceeded {
        /// The configured depth limit.
        limit: usize,
        /// Location in the value tree where the limit was hit.
        path: ConfigPath,
    },

    /// A `$ref` is remote, dangling or part of a pure reference cycle.
    #[error("cannot resolve schema reference '{reference}' at {path}")]
    UnresolvedRef {
        /// The `$ref` value.
        reference: String,
        /// Location in the value tree of the referencing node.
        path: ConfigPath,
    },

    /// A size keyword asks for more than [`MAX_GENERATED_SIZE`].
    #[error("{keyword} of {requested} at {path} exceeds the synthesis limit of {limit}")]
    TooLarge {
        /// `minItems` or `minLength`.
        keyword: &'static str,
        /// The value the schema asked for.
        requested: u64,
        /// [`MAX_GENERATED_SIZE`].
        limit: usize,
        /// Location in the value tree of the node.
        path: ConfigPath,
    },
}

/// Deterministic example generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleSynthesizer {
    max_depth: usize,
}

impl Default for ExampleSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl ExampleSynthesizer {
    /// A synthesizer that follows at most `max_depth` levels of nesting.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// A synthesizer using the depth limit from `config`.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_depth)
    }

    /// The configured depth limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Build an example value for `schema`.
    ///
    /// # Errors
    ///
    /// Returns `SynthesisError::DepthExceeded` for cyclic schemas,
    /// `SynthesisError::UnresolvedRef` for references that cannot be
    /// followed and `SynthesisError::TooLarge` for oversized `minItems` or
    /// `minLength`.
    pub fn synthesize(&self, schema: &Schema) -> Result<Value, SynthesisError> {
        let mut path = ConfigPath::root();
        self.node(schema.root(), &mut path, 0)
    }

    fn node(
        &self,
        node: SchemaNode<'_>,
        path: &mut ConfigPath,
        depth: usize,
    ) -> Result<Value, SynthesisError> {
        if depth > self.max_depth {
            return Err(SynthesisError::DepthExceeded {
                limit: self.max_depth,
                path: path.clone(),
            });
        }
        let node = resolve(node, path)?;

        if let Some(example) = node.examples().and_then(|examples| examples.first()) {
            return Ok(example.clone());
        }

        let kind = node.kind();
        if kind.is_scalar() {
            if let Some(literal) = node
                .default()
                .or_else(|| node.const_value())
                .or_else(|| node.enum_values().and_then(|values| values.first()))
            {
                return Ok(literal.clone());
            }
        }

        match kind {
            SchemaKind::Object => self.object(node, path, depth),
            SchemaKind::Array => self.array(node, path, depth),
            SchemaKind::String => canonical_string(node, path).map(Value::String),
            SchemaKind::Number => Ok(number_value(canonical_number(node, false))),
            SchemaKind::Integer => Ok(number_value(canonical_number(node, true))),
            SchemaKind::Boolean => Ok(Value::Bool(false)),
            SchemaKind::Null => Ok(Value::Null),
            SchemaKind::AnyOf | SchemaKind::OneOf => match node.alternatives().first() {
                Some(first) => self.node(*first, path, depth + 1),
                None => Ok(Value::Null),
            },
        }
    }

    fn object(
        &self,
        node: SchemaNode<'_>,
        path: &mut ConfigPath,
        depth: usize,
    ) -> Result<Value, SynthesisError> {
        let mut map = Map::new();
        for (name, child) in node.properties() {
            path.push(name);
            let value = self.node(child, path, depth + 1);
            path.pop();
            map.insert(name.to_string(), value?);
        }

        if let Some(first) = node.alternatives().first() {
            if let Value::Object(extra) = self.node(*first, path, depth + 1)? {
                for (key, value) in extra {
                    map.entry(key).or_insert(value);
                }
            }
        }

        Ok(Value::Object(map))
    }

    fn array(
        &self,
        node: SchemaNode<'_>,
        path: &mut ConfigPath,
        depth: usize,
    ) -> Result<Value, SynthesisError> {
        let count = bounded("minItems", node.min_items().unwrap_or(1).max(1), path)?;
        let Some(items) = node.items() else {
            return Ok(Value::Array(vec![Value::Null; count]));
        };
        let unique = node.unique_items();

        let mut elements = Vec::with_capacity(count);
        for index in 0..count {
            path.push(index);
            let value = match self.node(items, path, depth + 1) {
                Ok(value) if unique && index > 0 => resolve(items, path)
                    .map(|items| distinct_element(items, value, index)),
                other => other,
            };
            path.pop();
            elements.push(value?);
        }
        Ok(Value::Array(elements))
    }
}

/// Build an example with the default depth limit.
///
/// # Errors
///
/// See [`ExampleSynthesizer::synthesize`].
pub fn synthesize(schema: &Schema) -> Result<Value, SynthesisError> {
    ExampleSynthesizer::default().synthesize(schema)
}

fn resolve<'a>(node: SchemaNode<'a>, path: &ConfigPath) -> Result<SchemaNode<'a>, SynthesisError> {
    node.resolve().ok_or_else(|| SynthesisError::UnresolvedRef {
        reference: node.reference().unwrap_or_default().to_string(),
        path: path.clone(),
    })
}

fn bounded(
    keyword: &'static str,
    requested: u64,
    path: &ConfigPath,
) -> Result<usize, SynthesisError> {
    usize::try_from(requested)
        .ok()
        .filter(|&size| size <= MAX_GENERATED_SIZE)
        .ok_or_else(|| SynthesisError::TooLarge {
            keyword,
            requested,
            limit: MAX_GENERATED_SIZE,
            path: path.clone(),
        })
}

fn canonical_string(node: SchemaNode<'_>, path: &ConfigPath) -> Result<String, SynthesisError> {
    if let Some(literal) = node.format().and_then(|format| format_literal(format, 0)) {
        return Ok(literal);
    }
    let len = bounded("minLength", node.min_length().unwrap_or(0), path)?;
    Ok("x".repeat(len))
}

/// The `index`th fixed literal of a string format, `None` for formats the
/// validator does not know.
fn format_literal(format: &str, index: usize) -> Option<String> {
    let seconds = format!("{:02}:{:02}", (index / 60) % 60, index % 60);
    let literal = match format {
        "ipv4" => format!("127.{}.{}.1", (index / 256) % 256, index % 256),
        "ipv6" => format!("::{:x}", index + 1),
        "uri" | "url" | "iri" | "uri-reference" | "iri-reference" => match index {
            0 => "http://127.0.0.1".to_string(),
            n => format!("http://127.0.0.1/{n}"),
        },
        "uri-template" => format!("http://127.0.0.1/{index}/{{id}}"),
        "hostname" | "idn-hostname" => match index {
            0 => "localhost".to_string(),
            n => format!("host{n}.localhost"),
        },
        "email" | "idn-email" => match index {
            0 => "user@example.com".to_string(),
            n => format!("user{n}@example.com"),
        },
        "date-time" => format!("1970-01-01T00:{seconds}Z"),
        "date" => format!("{:04}-01-01", 1970 + index),
        "time" => format!("00:{seconds}Z"),
        "duration" => format!("P{}D", index + 1),
        "uuid" => format!("00000000-0000-0000-0000-{index:012x}"),
        "regex" => match index {
            0 => ".*".to_string(),
            n => format!("^{n}$"),
        },
        "json-pointer" => format!("/{index}"),
        "relative-json-pointer" => index.to_string(),
        _ => return None,
    };
    Some(literal)
}

/// Element `index` (> 0) of a `uniqueItems` array whose first element is
/// `value`.
fn distinct_element(items: SchemaNode<'_>, value: Value, index: usize) -> Value {
    match items.examples() {
        Some(examples) => {
            if let Some(example) = examples.get(index) {
                return example.clone();
            }
        }
        None => {
            if let Some(literal) = items.enum_values().and_then(|values| values.get(index)) {
                return literal.clone();
            }
        }
    }

    match value {
        Value::String(s) => Value::String(
            items
                .format()
                .and_then(|format| format_literal(format, index))
                .unwrap_or_else(|| format!("{s}{index}")),
        ),
        Value::Number(n) => match n.as_f64() {
            Some(base) => number_value(offset_number(items, base, index)),
            None => Value::Number(n),
        },
        Value::Bool(b) => Value::Bool(b != (index % 2 == 1)),
        other => other,
    }
}

/// `base` moved `index` units up, else down, staying inside the bounds.
/// Numbers in a range narrower than that move a fraction of the way towards
/// the far bound instead.
fn offset_number(node: SchemaNode<'_>, base: f64, index: usize) -> f64 {
    let low = lower_bound(node);
    let high = upper_bound(node);
    let fits = |v: f64| {
        low.map_or(true, |b| b.admits_above(v)) && high.map_or(true, |b| b.admits_below(v))
    };

    let offset = index as f64;
    if fits(base + offset) {
        return base + offset;
    }
    if fits(base - offset) {
        return base - offset;
    }
    if node.kind() == SchemaKind::Integer {
        return base;
    }
    let fraction = offset / (offset + 1.0);
    match (low, high) {
        (_, Some(h)) if h.value > base => base + (h.value - base) * fraction,
        (Some(l), _) if l.value < base => base - (base - l.value) * fraction,
        _ => base,
    }
}

#[derive(Debug, Clone, Copy)]
struct Bound {
    value: f64,
    exclusive: bool,
}

impl Bound {
    fn admits_above(self, v: f64) -> bool {
        if self.exclusive {
            v > self.value
        } else {
            v >= self.value
        }
    }

    fn admits_below(self, v: f64) -> bool {
        if self.exclusive {
            v < self.value
        } else {
            v <= self.value
        }
    }
}

/// `minimum` combined with `exclusiveMinimum` in either its numeric
/// (draft 6+) or boolean (draft 4) form. The tighter bound wins.
fn lower_bound(node: SchemaNode<'_>) -> Option<Bound> {
    let mut bound = node.minimum().and_then(Number::as_f64).map(|value| Bound {
        value,
        exclusive: false,
    });
    match node.exclusive_minimum() {
        Some(Value::Number(n)) => {
            if let Some(value) = n.as_f64() {
                if bound.map_or(true, |b| value >= b.value) {
                    bound = Some(Bound { value, exclusive: true });
                }
            }
        }
        Some(Value::Bool(true)) => {
            if let Some(b) = bound.as_mut() {
                b.exclusive = true;
            }
        }
        _ => {}
    }
    bound
}

fn upper_bound(node: SchemaNode<'_>) -> Option<Bound> {
    let mut bound = node.maximum().and_then(Number::as_f64).map(|value| Bound {
        value,
        exclusive: false,
    });
    match node.exclusive_maximum() {
        Some(Value::Number(n)) => {
            if let Some(value) = n.as_f64() {
                if bound.map_or(true, |b| value <= b.value) {
                    bound = Some(Bound { value, exclusive: true });
                }
            }
        }
        Some(Value::Bool(true)) => {
            if let Some(b) = bound.as_mut() {
                b.exclusive = true;
            }
        }
        _ => {}
    }
    bound
}

fn canonical_number(node: SchemaNode<'_>, integer: bool) -> f64 {
    let low = lower_bound(node);
    let high = upper_bound(node);

    if integer {
        let low = low.map(|b| if b.exclusive { b.value.floor() + 1.0 } else { b.value.ceil() });
        let high = high.map(|b| if b.exclusive { b.value.ceil() - 1.0 } else { b.value.floor() });
        let mut value = 0.0_f64;
        if let Some(low) = low {
            value = value.max(low);
        }
        if let Some(high) = high {
            value = value.min(high);
        }
        return value;
    }

    let fits_low = low.map_or(true, |b| b.admits_above(0.0));
    let fits_high = high.map_or(true, |b| b.admits_below(0.0));
    match (low, high) {
        _ if fits_low && fits_high => 0.0,
        (Some(l), Some(h)) => {
            let edge = if fits_low { h } else { l };
            if edge.exclusive {
                (l.value + h.value) / 2.0
            } else {
                edge.value
            }
        }
        (Some(l), None) => {
            if l.exclusive {
                l.value + 1.0
            } else {
                l.value
            }
        }
        (None, Some(h)) => {
            if h.exclusive {
                h.value - 1.0
            } else {
                h.value
            }
        }
        (None, None) => 0.0,
    }
}

fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map_or(Value::from(0), Value::Number)
    }
}
