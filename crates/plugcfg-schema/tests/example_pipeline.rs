//! # Example and Validation Pipeline Tests
//!
//! Runs real plugin schemas through both halves of the pipeline:
//!
//! 1. augment → synthesize → build → annotate → render, checking the
//!    rendered YAML parses back to the synthesized value and carries the
//!    expected comment blocks;
//! 2. augment → compile → validate → format, checking the scenarios the
//!    editor reports to users.

use std::path::PathBuf;

use plugcfg_core::ConfigPath;
use plugcfg_schema::{
    annotate, augment, format_failures, synthesize, Document, FailureKeyword, FailureParams,
    Schema, SchemaValidator,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn fixture(name: &str) -> Schema {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    Schema::from_json_str(&text).expect("fixture is valid JSON")
}

fn fixtures() -> Vec<Schema> {
    vec![fixture("authz_keycloak.json"), fixture("openid_connect.json")]
}

fn annotated_example(schema: &Schema) -> (Value, Document) {
    let augmented = augment(schema);
    let value = synthesize(&augmented).expect("synthesis succeeds");
    let mut doc = Document::build(&value);
    annotate(&augmented, &mut doc);
    (value, doc)
}

// ---------------------------------------------------------------------------
// Example path
// ---------------------------------------------------------------------------

#[test]
fn synthesized_examples_validate_against_augmented_schema() {
    let validator = SchemaValidator::default();
    for schema in fixtures() {
        let augmented = augment(&schema);
        let value = synthesize(&augmented).unwrap();
        let compiled = validator.compile(&augmented).unwrap();
        if let Err(failures) = compiled.validate(&value) {
            panic!(
                "synthesized value {value} failed: {:?}",
                format_failures(&failures)
            );
        }
    }
}

#[test]
fn synthesized_example_populates_every_property() {
    let schema = fixture("authz_keycloak.json");
    let value = synthesize(&augment(&schema)).unwrap();
    let object = value.as_object().unwrap();
    for (name, _) in schema.root().properties() {
        assert!(object.contains_key(name), "missing property {name}");
    }
    assert_eq!(object["disable"], json!(false));
    assert_eq!(object["policy_enforcement_mode"], json!("ENFORCING"));
    assert_eq!(object["keepalive_timeout"], json!(60000));
    assert_eq!(object["permissions"], json!(["x"]));
}

#[test]
fn rendered_example_parses_back_to_synthesized_value() {
    for schema in fixtures() {
        let (value, doc) = annotated_example(&schema);
        let text = doc.render();
        let reparsed: Value = serde_yaml::from_str(&text)
            .unwrap_or_else(|e| panic!("rendered text does not parse: {e}\n{text}"));
        assert_eq!(reparsed, value);
        assert_eq!(doc.to_value(), value);
    }
}

#[test]
fn rendered_example_carries_comment_blocks() {
    let (_, doc) = annotated_example(&fixture("authz_keycloak.json"));
    let text = doc.render();

    assert!(text.starts_with("## authz-keycloak\n#\n# Authorize requests against a Keycloak server\n"));
    assert!(text.contains(
        "\n## Discovery endpoint ##\n#\n# URL of the Keycloak discovery document.\n#\ndiscovery: x\n"
    ));
    assert!(text.contains(
        "## policy_enforcement_mode ##\n#\n# Default value: ENFORCING\n#\n# One of:\n# - ENFORCING\n# - PERMISSIVE\n#\npolicy_enforcement_mode: ENFORCING\n"
    ));
    assert!(text.contains("## timeout ##\n#\n# Default value: 3000\n#\n# Minimum value: 1000\n#\ntimeout: 3000\n"));
    assert!(text.contains("## disable ##\n#\ndisable: false\n"));
}

#[test]
fn nested_and_example_blocks() {
    let (value, doc) = annotated_example(&fixture("openid_connect.json"));
    assert_eq!(
        value["discovery"],
        json!("https://idp.example.com/.well-known/openid-configuration")
    );
    let discovery = doc
        .annotation_at(&ConfigPath::root().child("discovery"))
        .unwrap();
    assert!(discovery
        .lines()
        .iter()
        .any(|l| l.starts_with(" - ") && l.contains("idp.example.com/.well-known")));

    let secret = doc
        .annotation_at(&ConfigPath::from_pointer("/session/secret").unwrap())
        .unwrap();
    assert_eq!(secret.lines()[0], "# secret ##");
    assert_eq!(value["session"]["secret"], json!("x".repeat(16)));
}

// ---------------------------------------------------------------------------
// Validation path
// ---------------------------------------------------------------------------

#[test]
fn empty_discovery_is_one_min_length_failure() {
    let schema = augment(&fixture("authz_keycloak.json"));
    let compiled = SchemaValidator::default().compile(&schema).unwrap();
    let failures = compiled.validate(&json!({"discovery": ""})).unwrap_err();
    assert_eq!(failures.len(), 1, "{:?}", format_failures(&failures));
    assert_eq!(failures[0].keyword, FailureKeyword::Other("minLength".into()));
    assert_eq!(failures[0].instance_path.to_string(), "/discovery");
    assert!(format_failures(&failures)[0].starts_with("/properties/discovery/minLength "));
}

#[test]
fn unknown_enforcement_mode_lists_both_values() {
    let schema = augment(&fixture("authz_keycloak.json"));
    let compiled = SchemaValidator::default().compile(&schema).unwrap();
    let failures = compiled
        .validate(&json!({"discovery": "https://kc", "policy_enforcement_mode": "OTHER"}))
        .unwrap_err();
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures[0].params,
        FailureParams::AllowedValues(vec![json!("ENFORCING"), json!("PERMISSIVE")])
    );
    let line = &format_failures(&failures)[0];
    assert!(line.starts_with("/policy_enforcement_mode "));
    assert!(line.ends_with(": ENFORCING, PERMISSIVE"));
}

#[test]
fn one_of_branches_accept_disable_but_candidate_must_match_one() {
    let schema = augment(&Schema::new(json!({
        "oneOf": [{"required": ["discovery"]}, {"required": ["token_endpoint"]}]
    })));
    let compiled = SchemaValidator::default().compile(&schema).unwrap();
    let failures = compiled.validate(&json!({"disable": true})).unwrap_err();
    assert!(failures.iter().any(|f| f.keyword == FailureKeyword::OneOf));
    assert!(compiled
        .validate(&json!({"disable": true, "token_endpoint": "https://kc/token"}))
        .is_ok());
}

#[test]
fn min_items_synthesizes_one_and_rejects_empty() {
    let schema = augment(&Schema::new(json!({
        "type": "object",
        "properties": {"nodes": {"type": "array", "minItems": 1, "items": {"type": "string"}}}
    })));
    let value = synthesize(&schema).unwrap();
    assert_eq!(value["nodes"].as_array().map(Vec::len), Some(1));

    let compiled = SchemaValidator::default().compile(&schema).unwrap();
    let failures = compiled.validate(&json!({"nodes": []})).unwrap_err();
    assert_eq!(failures[0].keyword, FailureKeyword::MinItems);
    assert!(format_failures(&failures)[0].starts_with("/nodes "));
}

fn assert_synthesized_valid(schema: Value) -> Value {
    let schema = augment(&Schema::new(schema));
    let value = synthesize(&schema).unwrap();
    let compiled = SchemaValidator::default().compile(&schema).unwrap();
    if let Err(failures) = compiled.validate(&value) {
        panic!("synthesized value {value} failed: {:?}", format_failures(&failures));
    }
    value
}

#[test]
fn formatted_strings_validate_with_format_assertion() {
    let value = assert_synthesized_valid(json!({
        "type": "object",
        "properties": {
            "host": {"type": "string", "format": "ipv4"},
            "host6": {"type": "string", "format": "ipv6"},
            "endpoint": {"type": "string", "format": "uri"},
            "server_name": {"type": "string", "format": "hostname"},
            "contact": {"type": "string", "format": "email"},
            "since": {"type": "string", "format": "date-time"},
            "day": {"type": "string", "format": "date"},
            "id": {"type": "string", "format": "uuid"},
            "match": {"type": "string", "format": "regex"}
        }
    }));
    assert_eq!(value["host"], json!("127.0.0.1"));
    assert_eq!(value["endpoint"], json!("http://127.0.0.1"));
}

#[test]
fn patterned_strings_validate_through_their_default() {
    let value = assert_synthesized_valid(json!({
        "type": "object",
        "properties": {
            "key": {"type": "string", "pattern": "^[a-z]+$", "default": "remote"},
            "header": {"type": "string", "pattern": "^X-", "examples": ["X-Api-Key"]}
        }
    }));
    assert_eq!(value, json!({"key": "remote", "header": "X-Api-Key", "disable": false}));
}

#[test]
fn unique_item_arrays_validate() {
    let value = assert_synthesized_valid(json!({
        "type": "object",
        "properties": {
            "permissions": {
                "type": "array", "minItems": 3, "uniqueItems": true,
                "items": {"type": "string", "minLength": 1, "maxLength": 100}
            },
            "nodes": {
                "type": "array", "minItems": 2, "uniqueItems": true,
                "items": {"type": "string", "format": "ipv4"}
            },
            "ports": {
                "type": "array", "minItems": 2, "uniqueItems": true,
                "items": {"type": "integer", "minimum": 1, "maximum": 65535}
            },
            "methods": {
                "type": "array", "minItems": 2, "uniqueItems": true,
                "items": {"enum": ["GET", "POST"]}
            }
        }
    }));
    assert_eq!(value["permissions"], json!(["x", "x1", "x2"]));
    assert_eq!(value["ports"], json!([1, 2]));
}

#[test]
fn fractional_exclusive_ranges_validate() {
    let value = assert_synthesized_valid(json!({
        "type": "object",
        "properties": {
            "ratio": {"type": "number", "minimum": 0, "exclusiveMaximum": 0.5},
            "weight": {"type": "number", "exclusiveMinimum": 0.1, "exclusiveMaximum": 0.2},
            "burst": {"type": "number", "exclusiveMinimum": 0, "maximum": 1}
        }
    }));
    assert_eq!(value["ratio"], json!(0));
    assert_eq!(value["burst"], json!(0.5));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9_ .:-]{0,10}".prop_map(Value::String),
    ]
}

fn value_tree() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z_]{1,6}", inner), 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

fn schema_tree() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(json!({"type": "string"})),
        (1u64..4).prop_map(|n| json!({"type": "string", "minLength": n})),
        (-50i64..50).prop_map(|n| json!({"type": "integer", "minimum": n})),
        Just(json!({"type": "boolean", "default": false})),
        Just(json!({"type": "number", "maximum": -1.5})),
        Just(json!({"enum": ["ENFORCING", "PERMISSIVE"]})),
        prop_oneof![Just("ipv4"), Just("ipv6"), Just("uri"), Just("hostname"), Just("email")]
            .prop_map(|format| json!({"type": "string", "format": format})),
        (1u32..100).prop_map(|n| {
            json!({"type": "number", "exclusiveMinimum": 0, "exclusiveMaximum": f64::from(n) / 100.0})
        }),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (inner.clone(), 0u64..3, any::<bool>()).prop_map(|(items, min, unique)| {
                let scalar_items = items.get("properties").is_none() && items.get("items").is_none();
                json!({
                    "type": "array",
                    "items": items,
                    "minItems": min,
                    "uniqueItems": unique && scalar_items
                })
            }),
            prop::collection::vec(("[a-z_]{1,6}", inner), 0..4).prop_map(|props| {
                let properties: serde_json::Map<String, Value> = props.into_iter().collect();
                json!({"type": "object", "properties": properties})
            }),
        ]
    })
}

proptest! {
    #[test]
    fn document_round_trips_through_rendering(value in value_tree()) {
        let doc = Document::build(&value);
        prop_assert_eq!(doc.to_value(), value.clone());
        let reparsed: Value = serde_yaml::from_str(&doc.render()).unwrap();
        prop_assert_eq!(reparsed, value);
    }

    #[test]
    fn synthesis_is_deterministic_and_valid(schema in schema_tree()) {
        let schema = Schema::new(schema);
        let first = synthesize(&schema).unwrap();
        prop_assert_eq!(synthesize(&schema).unwrap(), first.clone());
        let compiled = SchemaValidator::default().compile(&schema).unwrap();
        prop_assert!(compiled.is_valid(&first), "{} rejected", first);
    }
}
