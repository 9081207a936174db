//! # Annotatable Documents
//!
//! A [`Document`] is a value tree lifted into nodes that can carry comment
//! lines, rendered as YAML for the editor.
//!
//! ## Invariant
//!
//! The document mirrors its value tree 1:1. Annotations and spacing are the
//! only additions, so [`Document::to_value`] always returns the value the
//! document was built from, and the rendered text parses back to that same
//! value.

use plugcfg_core::{ConfigPath, PathSegment};
use serde_json::{Map, Value};

/// Comment lines attached to a document node.
///
/// Lines are stored without the leading `#`; rendering adds it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    lines: Vec<String>,
}

impl Annotation {
    /// An annotation from its lines.
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// The comment lines, without `#`.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// True if there are no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// One node of a [`Document`].
#[derive(Debug, Clone, PartialEq)]
pub struct DocNode {
    /// The node's content.
    pub value: DocValue,
    /// Comment block rendered before the node.
    pub annotation: Option<Annotation>,
    /// Whether a blank line precedes the node.
    pub space_before: bool,
}

/// Content of a [`DocNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    /// A string, number, boolean or null.
    Scalar(Value),
    /// Key/value entries in insertion order.
    Mapping(Vec<DocEntry>),
    /// Elements in order.
    Sequence(Vec<DocNode>),
}

/// A keyed entry of a mapping node.
#[derive(Debug, Clone, PartialEq)]
pub struct DocEntry {
    /// The mapping key.
    pub key: String,
    /// The entry's value node.
    pub node: DocNode,
}

impl DocNode {
    fn lift(value: &Value) -> Self {
        let value = match value {
            Value::Object(map) => DocValue::Mapping(
                map.iter()
                    .map(|(key, child)| DocEntry {
                        key: key.clone(),
                        node: DocNode::lift(child),
                    })
                    .collect(),
            ),
            Value::Array(items) => DocValue::Sequence(items.iter().map(DocNode::lift).collect()),
            scalar => DocValue::Scalar(scalar.clone()),
        };
        Self {
            value,
            annotation: None,
            space_before: false,
        }
    }

    /// Attach an annotation and set the blank-line flag.
    pub fn annotate(&mut self, annotation: Annotation) {
        self.annotation = Some(annotation);
        self.space_before = true;
    }

    /// Flatten back into a value tree.
    pub fn to_value(&self) -> Value {
        match &self.value {
            DocValue::Scalar(v) => v.clone(),
            DocValue::Mapping(entries) => {
                let mut map = Map::new();
                for entry in entries {
                    map.insert(entry.key.clone(), entry.node.to_value());
                }
                Value::Object(map)
            }
            DocValue::Sequence(items) => Value::Array(items.iter().map(DocNode::to_value).collect()),
        }
    }

    fn child(&self, segment: &PathSegment) -> Option<&DocNode> {
        match &self.value {
            DocValue::Mapping(entries) => {
                let key = segment.as_key();
                entries.iter().find(|e| e.key == key).map(|e| &e.node)
            }
            DocValue::Sequence(items) => segment.as_index().and_then(|i| items.get(i)),
            DocValue::Scalar(_) => None,
        }
    }

    fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut DocNode> {
        match &mut self.value {
            DocValue::Mapping(entries) => {
                let key = segment.as_key();
                entries.iter_mut().find(|e| e.key == key).map(|e| &mut e.node)
            }
            DocValue::Sequence(items) => segment.as_index().and_then(|i| items.get_mut(i)),
            DocValue::Scalar(_) => None,
        }
    }
}

/// An annotatable, renderable configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: DocNode,
}

impl Document {
    /// Lift a value tree into an unannotated document.
    pub fn build(value: &Value) -> Self {
        Self {
            root: DocNode::lift(value),
        }
    }

    /// The root node.
    pub fn root(&self) -> &DocNode {
        &self.root
    }

    /// The root node, mutably.
    pub fn root_mut(&mut self) -> &mut DocNode {
        &mut self.root
    }

    /// The node at `path`, if present.
    pub fn get(&self, path: &ConfigPath) -> Option<&DocNode> {
        path.iter().try_fold(&self.root, |node, segment| node.child(segment))
    }

    /// The node at `path`, mutably.
    pub fn get_mut(&mut self, path: &ConfigPath) -> Option<&mut DocNode> {
        let mut node = &mut self.root;
        for segment in path {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }

    /// The annotation attached at `path`, if any.
    pub fn annotation_at(&self, path: &ConfigPath) -> Option<&Annotation> {
        self.get(path).and_then(|node| node.annotation.as_ref())
    }

    /// Flatten back into the value tree.
    pub fn to_value(&self) -> Value {
        self.root.to_value()
    }

    /// Render as YAML text with annotations as `#` comments.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(annotation) = &self.root.annotation {
            write_annotation(&mut out, annotation, 0);
        }
        match &self.root.value {
            DocValue::Scalar(v) => {
                out.push_str(&yaml_scalar(v));
                out.push('\n');
            }
            DocValue::Mapping(entries) if entries.is_empty() => out.push_str("{}\n"),
            DocValue::Sequence(items) if items.is_empty() => out.push_str("[]\n"),
            DocValue::Mapping(entries) => write_mapping(&mut out, entries, 0, false),
            DocValue::Sequence(items) => write_sequence(&mut out, items, 0),
        }
        out
    }
}

/// Render a value the way a person would type it in prose: strings bare,
/// everything else as compact JSON.
pub fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render values as a YAML block list, one line per output line.
pub fn yaml_lines(values: &[Value]) -> Vec<String> {
    let text = serde_yaml::to_string(values)
        .or_else(|_| serde_json::to_string_pretty(values))
        .unwrap_or_default();
    text.lines().map(str::to_string).collect()
}

/// Render a scalar (or a key) on a single line, quoted where YAML needs it.
fn yaml_scalar(value: &Value) -> String {
    let single_line = match value {
        Value::String(s) if s.chars().any(char::is_control) => None,
        _ => serde_yaml::to_string(value)
            .ok()
            .map(|s| s.trim_end_matches('\n').to_string())
            .filter(|s| !s.contains('\n')),
    };
    // JSON strings are valid YAML double-quoted scalars.
    single_line.unwrap_or_else(|| value.to_string())
}

fn yaml_key(key: &str) -> String {
    yaml_scalar(&Value::String(key.to_string()))
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat(' ').take(indent));
}

fn write_annotation(out: &mut String, annotation: &Annotation, indent: usize) {
    for line in annotation.lines() {
        pad(out, indent);
        out.push('#');
        out.push_str(line);
        out.push('\n');
    }
}

fn write_leading(out: &mut String, node: &DocNode, indent: usize) {
    if node.space_before && !out.is_empty() {
        out.push('\n');
    }
    if let Some(annotation) = &node.annotation {
        write_annotation(out, annotation, indent);
    }
}

fn has_leading(node: &DocNode) -> bool {
    node.space_before || node.annotation.is_some()
}

/// Write mapping entries at `indent`. With `inline_first`, the caller has
/// already written `- ` and the first key continues that line.
fn write_mapping(out: &mut String, entries: &[DocEntry], indent: usize, inline_first: bool) {
    for (i, entry) in entries.iter().enumerate() {
        if !(inline_first && i == 0) {
            write_leading(out, &entry.node, indent);
            pad(out, indent);
        }
        out.push_str(&yaml_key(&entry.key));
        out.push(':');
        write_nested(out, &entry.node, indent);
    }
}

fn write_sequence(out: &mut String, items: &[DocNode], indent: usize) {
    for item in items {
        write_leading(out, item, indent);
        pad(out, indent);
        out.push('-');
        match &item.value {
            DocValue::Mapping(entries)
                if !entries.is_empty() && !has_leading(&entries[0].node) =>
            {
                out.push(' ');
                write_mapping(out, entries, indent + 2, true);
            }
            _ => write_nested(out, item, indent),
        }
    }
}

/// Write the value part of a node that follows `key:` or `-`.
fn write_nested(out: &mut String, node: &DocNode, indent: usize) {
    match &node.value {
        DocValue::Scalar(v) => {
            out.push(' ');
            out.push_str(&yaml_scalar(v));
            out.push('\n');
        }
        DocValue::Mapping(entries) if entries.is_empty() => out.push_str(" {}\n"),
        DocValue::Sequence(items) if items.is_empty() => out.push_str(" []\n"),
        DocValue::Mapping(entries) => {
            out.push('\n');
            write_mapping(out, entries, indent + 2, false);
        }
        DocValue::Sequence(items) => {
            out.push('\n');
            write_sequence(out, items, indent + 2);
        }
    }
}
