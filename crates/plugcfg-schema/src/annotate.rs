//! # Annotation Engine
//!
//! Walks a schema and a [`Document`] in lock-step and attaches a comment
//! block to every mapping entry that the schema describes, so the editor
//! shows the documentation for each setting right above it.
//!
//! ## Co-traversal
//!
//! The walk is keyed by [`ConfigPath`]. For each mapping entry the key is
//! looked up in the current schema node (own `properties`, then `oneOf`/
//! `anyOf` alternatives). When the schema does not describe the key, the
//! entry gets no annotation and its children are visited with the parent's
//! schema node still in effect. Sequence elements have no key of their own;
//! they are not annotated, and their children are visited with the `items`
//! schema.
//!
//! An entry whose key is exactly `title` or `description` is metadata, not
//! a setting, and is never annotated itself.
//!
//! ## Block Layout
//!
//! Each populated block is followed by an empty separator line:
//!
//! ```text
//! ## <title or key> ##
//! #
//! # <description, line by line>
//! #
//! # Default value: <value>
//! #
//! # One of:
//! # - <enum value>
//! #
//! # Minimum value: <n>
//! #
//! # Maximum value: <n>
//! #
//! # Examples:
//! # - <example>
//! #
//! ```
//!
//! Absent attributes are skipped. `0` and `false` are present values.

use plugcfg_core::ConfigPath;

use crate::document::{plain_value, yaml_lines, Annotation, DocNode, DocValue, Document};
use crate::schema::{Schema, SchemaNode};

/// Keys treated as schema metadata rather than settings.
pub const METADATA_KEYS: [&str; 2] = ["title", "description"];

/// Attach annotations from `schema` to `document` in place.
///
/// The document's structure is never changed. The root receives a short
/// block built from the schema's own `title` and `description` only.
pub fn annotate(schema: &Schema, document: &mut Document) {
    let root_schema = schema.root().resolve();
    if let Some(annotation) = root_schema.and_then(root_annotation) {
        document.root_mut().annotation = Some(annotation);
    }

    let mut path = ConfigPath::root();
    visit(document.root_mut(), root_schema, &mut path);
}

fn visit(node: &mut DocNode, schema: Option<SchemaNode<'_>>, path: &mut ConfigPath) {
    match &mut node.value {
        DocValue::Scalar(_) => {}
        DocValue::Mapping(entries) => {
            for entry in entries.iter_mut() {
                path.push(entry.key.as_str());
                let described = schema
                    .and_then(|s| s.property(&entry.key))
                    .and_then(|child| child.resolve());
                match described {
                    Some(child) => {
                        visit(&mut entry.node, Some(child), path);
                        if !is_metadata_key(path) {
                            entry.node.annotate(node_annotation(child, &entry.key));
                        }
                    }
                    None => visit(&mut entry.node, schema, path),
                }
                path.pop();
            }
        }
        DocValue::Sequence(items) => {
            let item_schema = schema
                .and_then(|s| s.items())
                .and_then(|items| items.resolve())
                .or(schema);
            for (index, item) in items.iter_mut().enumerate() {
                path.push(index);
                visit(item, item_schema, path);
                path.pop();
            }
        }
    }
}

/// True when the last segment of `path` is a metadata key.
pub fn is_metadata_key(path: &ConfigPath) -> bool {
    path.last()
        .is_some_and(|segment| METADATA_KEYS.iter().any(|key| segment.is_key(key)))
}

/// The comment block for one described setting.
pub fn node_annotation(schema: SchemaNode<'_>, key: &str) -> Annotation {
    let mut lines = vec![format!("# {} ##", schema.title().unwrap_or(key)), String::new()];

    if let Some(description) = schema.description().filter(|d| !d.is_empty()) {
        lines.extend(description.lines().map(|line| format!(" {line}")));
        lines.push(String::new());
    }

    if let Some(default) = schema.default() {
        lines.push(format!(" Default value: {}", plain_value(default)));
        lines.push(String::new());
    }

    if let Some(values) = schema.enum_values() {
        lines.push(" One of:".to_string());
        lines.extend(yaml_lines(values).into_iter().map(|line| format!(" {line}")));
        lines.push(String::new());
    }

    if let Some(minimum) = schema.minimum() {
        lines.push(format!(" Minimum value: {minimum}"));
        lines.push(String::new());
    }

    if let Some(maximum) = schema.maximum() {
        lines.push(format!(" Maximum value: {maximum}"));
        lines.push(String::new());
    }

    if let Some(examples) = schema.examples() {
        lines.push(" Examples:".to_string());
        lines.extend(yaml_lines(examples).into_iter().map(|line| format!(" {line}")));
        lines.push(String::new());
    }

    Annotation::new(lines)
}

/// The root block: `title` and `description` only.
pub fn root_annotation(schema: SchemaNode<'_>) -> Option<Annotation> {
    let mut lines = Vec::new();
    if let Some(title) = schema.title() {
        lines.push(format!("# {title}"));
        lines.push(String::new());
    }
    if let Some(description) = schema.description().filter(|d| !d.is_empty()) {
        lines.extend(description.lines().map(|line| format!(" {line}")));
    }
    if lines.is_empty() {
        None
    } else {
        Some(Annotation::new(lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotated(schema: serde_json::Value, value: serde_json::Value) -> Document {
        let schema = Schema::new(schema);
        let mut doc = Document::build(&value);
        annotate(&schema, &mut doc);
        doc
    }

    fn lines_at(doc: &Document, pointer: &str) -> Vec<String> {
        doc.annotation_at(&ConfigPath::from_pointer(pointer).unwrap())
            .map(|a| a.lines().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn full_block_in_fixed_order() {
        let doc = annotated(
            json!({
                "properties": {
                    "policy_enforcement_mode": {
                        "title": "Policy enforcement",
                        "description": "How to treat\nunknown resources",
                        "default": "ENFORCING",
                        "enum": ["ENFORCING", "PERMISSIVE"],
                        "minimum": 1,
                        "maximum": 9,
                        "examples": ["PERMISSIVE"]
                    }
                }
            }),
            json!({"policy_enforcement_mode": "ENFORCING"}),
        );
        assert_eq!(
            lines_at(&doc, "/policy_enforcement_mode"),
            vec![
                "# Policy enforcement ##",
                "",
                " How to treat",
                " unknown resources",
                "",
                " Default value: ENFORCING",
                "",
                " One of:",
                " - ENFORCING",
                " - PERMISSIVE",
                "",
                " Minimum value: 1",
                "",
                " Maximum value: 9",
                "",
                " Examples:",
                " - PERMISSIVE",
                "",
            ]
        );
        let node = doc
            .get(&ConfigPath::root().child("policy_enforcement_mode"))
            .unwrap();
        assert!(node.space_before);
    }

    #[test]
    fn header_falls_back_to_key_and_absent_blocks_are_skipped() {
        let doc = annotated(
            json!({"properties": {"timeout": {"type": "integer"}}}),
            json!({"timeout": 0}),
        );
        assert_eq!(lines_at(&doc, "/timeout"), vec!["# timeout ##", ""]);
    }

    #[test]
    fn zero_and_false_are_rendered() {
        let doc = annotated(
            json!({"properties": {
                "keepalive": {"type": "boolean", "default": false},
                "retries": {"type": "integer", "default": 0, "minimum": 0, "maximum": 0}
            }}),
            json!({"keepalive": false, "retries": 0}),
        );
        assert!(lines_at(&doc, "/keepalive").contains(&" Default value: false".to_string()));
        let retries = lines_at(&doc, "/retries");
        assert!(retries.contains(&" Default value: 0".to_string()));
        assert!(retries.contains(&" Minimum value: 0".to_string()));
        assert!(retries.contains(&" Maximum value: 0".to_string()));
    }

    #[test]
    fn nested_objects_are_annotated() {
        let doc = annotated(
            json!({"properties": {
                "upstream": {
                    "title": "Upstream",
                    "properties": {"timeout": {"description": "seconds"}}
                }
            }}),
            json!({"upstream": {"timeout": 1}}),
        );
        assert_eq!(lines_at(&doc, "/upstream")[0], "# Upstream ##");
        assert_eq!(lines_at(&doc, "/upstream/timeout"), vec!["# timeout ##", "", " seconds", ""]);
    }

    #[test]
    fn undescribed_keys_are_skipped_but_children_use_parent_schema() {
        let doc = annotated(
            json!({"properties": {"timeout": {"title": "Timeout"}}}),
            json!({"extra": {"timeout": 1}}),
        );
        assert!(lines_at(&doc, "/extra").is_empty());
        assert_eq!(lines_at(&doc, "/extra/timeout")[0], "# Timeout ##");
    }

    #[test]
    fn metadata_keys_are_never_annotated() {
        let doc = annotated(
            json!({"properties": {
                "title": {"type": "string", "title": "Title"},
                "description": {"type": "string"},
                "name": {"type": "string"}
            }}),
            json!({"title": "", "description": "", "name": ""}),
        );
        assert!(lines_at(&doc, "/title").is_empty());
        assert!(lines_at(&doc, "/description").is_empty());
        assert_eq!(lines_at(&doc, "/name")[0], "# name ##");
    }

    #[test]
    fn sequence_elements_are_not_annotated_but_their_fields_are() {
        let doc = annotated(
            json!({"properties": {
                "nodes": {
                    "type": "array",
                    "title": "Nodes",
                    "items": {"type": "object", "title": "Node", "properties": {"host": {"title": "Host"}}}
                }
            }}),
            json!({"nodes": [{"host": "a"}]}),
        );
        assert_eq!(lines_at(&doc, "/nodes")[0], "# Nodes ##");
        assert!(lines_at(&doc, "/nodes/0").is_empty());
        assert_eq!(lines_at(&doc, "/nodes/0/host")[0], "# Host ##");
    }

    #[test]
    fn root_block_uses_title_and_description_only() {
        let doc = annotated(
            json!({
                "title": "limit-count",
                "description": "Rate limiting\nby fixed window",
                "default": {},
                "minimum": 1
            }),
            json!({}),
        );
        let root = doc.root().annotation.as_ref().unwrap();
        assert_eq!(
            root.lines(),
            &["# limit-count", "", " Rate limiting", " by fixed window"]
        );
    }

    #[test]
    fn root_without_metadata_has_no_block() {
        let doc = annotated(json!({"properties": {}}), json!({}));
        assert!(doc.root().annotation.is_none());
    }

    #[test]
    fn properties_from_alternatives_and_refs_are_found() {
        let doc = annotated(
            json!({
                "definitions": {"ep": {"title": "Endpoint"}},
                "oneOf": [{"properties": {"discovery": {"$ref": "#/definitions/ep"}}}]
            }),
            json!({"discovery": "x"}),
        );
        assert_eq!(lines_at(&doc, "/discovery")[0], "# Endpoint ##");
    }

    #[test]
    fn annotation_never_changes_structure() {
        let value = json!({"a": {"b": [1, {"c": true}]}, "title": "t", "z": null});
        let doc = annotated(
            json!({"properties": {"a": {"properties": {"b": {"items": {"properties": {"c": {}}}}}}}}),
            value.clone(),
        );
        assert_eq!(doc.to_value(), value);
    }
}
