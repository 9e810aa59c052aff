//! Schema of the config document itself (JSON Schema draft 7)
//!
//! Rule entries use `if`/`then`/`else` rather than `oneOf` so that a bad
//! entry fails with the one keyword that matters: `type` for a value of the
//! wrong kind, `enum` for an unknown severity.

use crate::rules::RuleSeverity;
use once_cell::sync::Lazy;
use serde_json::{Value, json};

static META_SCHEMA: Lazy<Value> = Lazy::new(build_meta_schema);

/// The config document schema
pub fn meta_schema() -> &'static Value {
    &META_SCHEMA
}

fn rule_config() -> Value {
    json!({
        "type": ["string", "object"],
        "if": {"type": "string"},
        "then": {"enum": RuleSeverity::VALUES},
        "else": {
            "properties": {
                "severity": {"type": "string", "enum": RuleSeverity::VALUES}
            }
        }
    })
}

fn rules_map() -> Value {
    json!({"type": "object", "additionalProperties": rule_config()})
}

fn rule_sections() -> serde_json::Map<String, Value> {
    ["rules", "oas2Rules", "oas3_0Rules", "oas3_1Rules"]
        .into_iter()
        .map(|key| (key.to_string(), rules_map()))
        .collect()
}

fn preset() -> Value {
    json!({
        "type": "object",
        "properties": rule_sections(),
        "additionalProperties": false
    })
}

fn plugin() -> Value {
    json!({
        "type": "object",
        "required": ["id"],
        "properties": {
            "id": {"type": "string"},
            "rules": {
                "type": "object",
                "properties": {
                    "oas2": {"type": "object"},
                    "oas3_0": {"type": "object"},
                    "oas3_1": {"type": "object"}
                },
                "additionalProperties": false
            },
            "configs": {"type": "object", "additionalProperties": preset()}
        },
        "additionalProperties": false
    })
}

fn header() -> Value {
    json!({
        "type": "object",
        "required": ["matches", "name"],
        "properties": {
            "matches": {"type": "string"},
            "name": {"type": "string"},
            "value": {"type": "string"},
            "envVariable": {"type": "string"}
        },
        "additionalProperties": false
    })
}

fn build_meta_schema() -> Value {
    let mut properties = rule_sections();
    properties.insert(
        "extends".to_string(),
        json!({"type": "array", "items": {"type": "string"}}),
    );
    properties.insert(
        "plugins".to_string(),
        json!({"type": "array", "items": plugin()}),
    );
    properties.insert(
        "resolve".to_string(),
        json!({
            "type": "object",
            "properties": {
                "http": {
                    "type": "object",
                    "properties": {
                        "headers": {"type": "array", "items": header()}
                    },
                    "additionalProperties": false
                }
            },
            "additionalProperties": false
        }),
    );
    properties.insert("metadata".to_string(), json!({"type": "object"}));
    properties.insert("organization".to_string(), json!({"type": "string"}));
    properties.insert(
        "telemetry".to_string(),
        json!({"type": "string", "enum": ["on", "off"]}),
    );

    json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false
    })
}
