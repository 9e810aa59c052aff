//! Structural validation of config documents
//!
//! Checks the dereferenced document against the built-in meta-schema and
//! turns unresolved references and unknown plugin rules into diagnostics.
//! Every diagnostic is located through the [`ReferenceMap`], so problems in a
//! referenced file point at that file.

mod meta_schema;

pub use meta_schema::meta_schema;

use crate::diagnostics::{Diagnostic, DiagnosticLocation, Severity};
use crate::reference::pointer::{self, REF_KEY};
use crate::reference::{Location, Provenance, ReferenceMap, UnresolvedReference};
use crate::rules::catalog::split_qualified;
use crate::rules::{Dialect, RuleSetCatalog};
use crate::source::{INLINE_SOURCE_NAME, SourceId};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, ValidationError, Validator};
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

/// Rule id of meta-schema diagnostics
pub const STRUCT_RULE: &str = "struct";
/// Rule id of unresolved `$ref` diagnostics
pub const UNRESOLVED_REF_RULE: &str = "no-unresolved-refs";
/// Rule id of diagnostics for overrides naming unknown plugin rules
pub const UNKNOWN_PLUGIN_RULE: &str = "unknown-plugin-rule";

const MAX_SUGGESTIONS: usize = 5;

static META_VALIDATOR: Lazy<Result<Validator, String>> = Lazy::new(|| {
    jsonschema::options()
        .with_draft(Draft::Draft7)
        .build(meta_schema())
        .map_err(|err| format!("failed to compile config meta-schema: {err}"))
});

/// Validates config documents against the meta-schema
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfValidator {
    severity: Severity,
}

impl SelfValidator {
    /// `severity` applies to schema and reference diagnostics
    pub fn new(severity: Severity) -> Self {
        Self { severity }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Check `document` against the meta-schema
    ///
    /// Diagnostics come out in document order.
    pub fn validate(&self, document: &Value, reference_map: &ReferenceMap) -> Vec<Diagnostic> {
        let validator = match &*META_VALIDATOR {
            Ok(validator) => validator,
            Err(message) => {
                tracing::error!("{}", message);
                return Vec::new();
            }
        };
        let reporter = SchemaReporter {
            severity: self.severity,
            map: reference_map,
            document,
        };

        let mut reported = reporter.leftover_refs(document, "");
        for error in validator.iter_errors(document) {
            reported.extend(reporter.diagnostics_for(&error));
        }

        let mut ordered: Vec<(Vec<usize>, Diagnostic)> = reported
            .into_iter()
            .map(|(pointer, diagnostic)| (document_order(document, &pointer), diagnostic))
            .collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        tracing::debug!("Meta-schema validation produced {} diagnostics", ordered.len());
        ordered.into_iter().map(|(_, diagnostic)| diagnostic).collect()
    }

    /// One diagnostic per unresolved reference, at the `$ref` node
    pub fn unresolved_diagnostics(&self, unresolved: &[UnresolvedReference]) -> Vec<Diagnostic> {
        unresolved
            .iter()
            .map(|reference| {
                Diagnostic::new(
                    UNRESOLVED_REF_RULE,
                    self.severity,
                    format!("Can't resolve $ref: {}", reference.reason),
                    DiagnosticLocation::new(&reference.location, false),
                )
                .with_from(reference.from.clone())
            })
            .collect()
    }

    /// Error diagnostics for `plugin/rule` overrides nothing registered provides
    pub fn plugin_rule_diagnostics(
        &self,
        document: &Value,
        reference_map: &ReferenceMap,
        catalog: &RuleSetCatalog,
    ) -> Vec<Diagnostic> {
        let sections = std::iter::once("rules").chain(Dialect::ALL.map(Dialect::rules_key));

        let mut diagnostics = Vec::new();
        for section in sections {
            let Some(rules) = document.get(section).and_then(Value::as_object) else {
                continue;
            };
            for name in rules.keys() {
                let (plugin_id, rule_name) = split_qualified(name);
                if plugin_id.is_empty() || catalog.has_plugin_rule(name) {
                    continue;
                }

                let (message, suggest) = match catalog.plugin(plugin_id) {
                    None => (format!("Plugin `{plugin_id}` is not found."), Vec::new()),
                    Some(plugin) => {
                        let known: Vec<String> = plugin
                            .rules
                            .values()
                            .flat_map(|rules| rules.keys())
                            .map(|rule| plugin.qualified_name(rule))
                            .collect();
                        (
                            format!("Rule `{rule_name}` is not found in plugin `{plugin_id}`."),
                            suggestions(name, known.iter().map(String::as_str)),
                        )
                    }
                };

                let pointer = pointer::join(&pointer::join("", section), name);
                diagnostics.push(
                    Diagnostic::at(
                        UNKNOWN_PLUGIN_RULE,
                        Severity::Error,
                        message,
                        &provenance_of(reference_map, &pointer),
                        true,
                    )
                    .with_suggestions(suggest),
                );
            }
        }
        diagnostics
    }
}

/// Provenance of a logical pointer, falling back to the pointer itself
fn provenance_of(map: &ReferenceMap, logical_pointer: &str) -> Provenance {
    map.lookup(logical_pointer).cloned().unwrap_or_else(|| Provenance {
        location: Location::new(SourceId::named(INLINE_SOURCE_NAME), logical_pointer),
        from: None,
    })
}

/// Turns schema errors into located diagnostics
///
/// Each diagnostic is paired with its logical pointer for ordering.
struct SchemaReporter<'a> {
    severity: Severity,
    map: &'a ReferenceMap,
    document: &'a Value,
}

impl SchemaReporter<'_> {
    fn diagnostics_for(&self, error: &ValidationError<'_>) -> Vec<(String, Diagnostic)> {
        let pointer = error.instance_path().as_str().to_string();
        // Leftover `$ref` keys get their own diagnostic
        if pointer.split('/').any(|token| token == REF_KEY) {
            return Vec::new();
        }
        let schema_path = error.schema_path().as_str();
        let keyword = meta_schema().pointer(schema_path);

        let diagnostic = match error.kind() {
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                let properties = parent_schema(schema_path)
                    .and_then(|schema| schema.get("properties"))
                    .and_then(Value::as_object);
                return unexpected
                    .iter()
                    .filter(|key| key.as_str() != REF_KEY)
                    .map(|key| {
                        let key_pointer = pointer::join(&pointer, key);
                        let diagnostic = self.unexpected_key(key, properties, &key_pointer);
                        (key_pointer, diagnostic)
                    })
                    .collect();
            }
            ValidationErrorKind::Type { .. } => {
                let expected = keyword.map(type_names).unwrap_or_default();
                let actual = self.document.pointer(&pointer).map_or("null", type_name);
                self.report(
                    &pointer,
                    false,
                    format!("Expected type `{}` but got `{actual}`.", expected.join(" | ")),
                    Vec::new(),
                )
            }
            ValidationErrorKind::Enum { .. } => {
                let allowed = keyword.and_then(Value::as_array).map(Vec::as_slice);
                self.enum_mismatch(allowed.unwrap_or_default(), &pointer)
            }
            ValidationErrorKind::Required { property } => {
                let name = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                self.report(
                    &pointer,
                    !pointer.is_empty(),
                    format!("The field `{name}` must be present on this level."),
                    Vec::new(),
                )
            }
            _ => self.report(&pointer, false, format!("{error}."), Vec::new()),
        };
        vec![(pointer, diagnostic)]
    }

    /// `$ref` keys still present after dereferencing were not reference nodes
    fn leftover_refs(&self, value: &Value, at: &str) -> Vec<(String, Diagnostic)> {
        match value {
            Value::Object(object) => object
                .iter()
                .flat_map(|(key, child)| {
                    let child_pointer = pointer::join(at, key);
                    if key == REF_KEY {
                        let diagnostic = self.unexpected_key(key, None, &child_pointer);
                        vec![(child_pointer, diagnostic)]
                    } else {
                        self.leftover_refs(child, &child_pointer)
                    }
                })
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .flat_map(|(index, item)| {
                    self.leftover_refs(item, &pointer::join(at, &index.to_string()))
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn unexpected_key(
        &self,
        key: &str,
        properties: Option<&Map<String, Value>>,
        pointer: &str,
    ) -> Diagnostic {
        let known = properties.into_iter().flat_map(|p| p.keys().map(String::as_str));
        self.report(
            pointer,
            true,
            format!("Property `{key}` is not expected here."),
            suggestions(key, known),
        )
    }

    fn enum_mismatch(&self, allowed: &[Value], pointer: &str) -> Diagnostic {
        let quoted: Vec<String> = allowed.iter().map(Value::to_string).collect();
        let given = match self.document.pointer(pointer) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        self.report(
            pointer,
            false,
            format!(
                "`{}` can be one of the following only: {}.",
                key_of(pointer),
                quoted.join(", ")
            ),
            suggestions(&given, allowed.iter().filter_map(Value::as_str)),
        )
    }

    fn report(
        &self,
        pointer: &str,
        report_on_key: bool,
        message: String,
        suggest: Vec<String>,
    ) -> Diagnostic {
        Diagnostic::at(
            STRUCT_RULE,
            self.severity,
            message,
            &provenance_of(self.map, pointer),
            report_on_key,
        )
        .with_suggestions(suggest)
    }
}

/// Schema object owning the keyword at `schema_path`
fn parent_schema(schema_path: &str) -> Option<&'static Value> {
    let (parent, _) = schema_path.rsplit_once('/')?;
    meta_schema().pointer(parent)
}

/// Names listed by a `type` keyword
fn type_names(keyword: &Value) -> Vec<&str> {
    match keyword {
        Value::String(name) => vec![name.as_str()],
        Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Position of every token of `pointer` in `document`
///
/// Sorting by this key puts diagnostics in the order the document lists
/// its keys, with a node before its children.
fn document_order(document: &Value, pointer: &str) -> Vec<usize> {
    let mut order = Vec::new();
    let mut node = Some(document);
    for token in pointer.split('/').skip(1) {
        let token = unescape(token);
        let (position, next) = match node {
            Some(Value::Object(object)) => match object.keys().position(|key| *key == token) {
                Some(index) => (index, object.get(&token)),
                None => (usize::MAX, None),
            },
            Some(Value::Array(items)) => match token.parse::<usize>() {
                Ok(index) => (index, items.get(index)),
                Err(_) => (usize::MAX, None),
            },
            _ => (usize::MAX, None),
        };
        order.push(position);
        node = next;
    }
    order
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Last token of a JSON pointer, unescaped
fn key_of(pointer: &str) -> String {
    unescape(pointer.rsplit('/').next().unwrap_or_default())
}

/// Candidates close to `given`, closest first
fn suggestions<'a>(given: &str, candidates: impl Iterator<Item = &'a str>) -> Vec<String> {
    let limit = (given.chars().count() / 2).max(2);
    let mut scored: Vec<(usize, &str)> = candidates
        .map(|candidate| (edit_distance(given, candidate), candidate))
        .filter(|(distance, _)| *distance <= limit)
        .collect();
    scored.sort();
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Calculate Levenshtein distance between two strings
fn edit_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };
            matrix[i][j] = std::cmp::min(
                std::cmp::min(matrix[i - 1][j] + 1, matrix[i][j - 1] + 1),
                matrix[i - 1][j - 1] + cost,
            );
        }
    }

    matrix[len1][len2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Plugin;
    use serde_json::json;
    use std::sync::Arc;

    /// Reference map of a document that contains no `$ref` nodes
    fn identity_map(value: &Value) -> ReferenceMap {
        fn walk(map: &mut ReferenceMap, value: &Value, pointer: String) {
            match value {
                Value::Object(object) => {
                    for (key, child) in object {
                        walk(map, child, pointer::join(&pointer, key));
                    }
                }
                Value::Array(items) => {
                    for (index, child) in items.iter().enumerate() {
                        walk(map, child, pointer::join(&pointer, &index.to_string()));
                    }
                }
                _ => {}
            }
            map.insert(
                pointer.clone(),
                Provenance {
                    location: Location::new(SourceId::named("apilint.yaml"), pointer),
                    from: None,
                },
            );
        }

        let mut map = ReferenceMap::new();
        walk(&mut map, value, String::new());
        map
    }

    fn validate(document: Value) -> Vec<Diagnostic> {
        SelfValidator::default().validate(&document, &identity_map(&document))
    }

    #[test]
    fn test_valid_document_has_no_diagnostics() {
        let diagnostics = validate(json!({
            "extends": ["recommended", "acme/strict"],
            "rules": {"info-contact": "warn", "acme/no-foo": {"severity": "error", "max": 3}},
            "oas2Rules": {"boolean-parameter-prefixes": "off"},
            "plugins": [{
                "id": "acme",
                "rules": {"oas3_0": {"no-foo": {"assert": "defined"}}},
                "configs": {"strict": {"rules": {"acme/no-foo": "error"}}}
            }],
            "resolve": {"http": {"headers": [{"matches": "https://x/**", "name": "X-Key", "envVariable": "KEY"}]}},
            "metadata": {"team": "platform"},
            "organization": "acme",
            "telemetry": "off"
        }));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_unknown_key_reports_on_key_with_suggestion() {
        let diagnostics = validate(json!({"rule": {"a": "warn"}}));

        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(diagnostic.message, "Property `rule` is not expected here.");
        assert_eq!(diagnostic.rule_id, STRUCT_RULE);
        assert_eq!(diagnostic.severity, Severity::Warn);
        assert_eq!(diagnostic.primary_location().pointer, "/rule");
        assert!(diagnostic.primary_location().report_on_key);
        assert_eq!(diagnostic.suggest[0], "rules");
    }

    #[test]
    fn test_type_mismatch() {
        let diagnostics = validate(json!({"extends": "recommended", "organization": 7}));
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Expected type `array` but got `string`.",
                "Expected type `string` but got `number`.",
            ]
        );
    }

    #[test]
    fn test_rule_severity_enum() {
        let diagnostics = validate(json!({"rules": {"info-contact": "eror"}}));

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "`info-contact` can be one of the following only: \"error\", \"warn\", \"off\"."
        );
        assert_eq!(diagnostics[0].primary_location().pointer, "/rules/info-contact");
        assert_eq!(diagnostics[0].suggest[0], "error");
    }

    #[test]
    fn test_rule_config_of_wrong_type() {
        let diagnostics = validate(json!({"rules": {"a": 1, "b": {"severity": "loud"}}}));
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics[0].message,
            "Expected type `string | object` but got `number`."
        );
        assert_eq!(diagnostics[1].primary_location().pointer, "/rules/b/severity");
    }

    #[test]
    fn test_required_fields() {
        let diagnostics = validate(json!({"plugins": [{"rules": {}}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "The field `id` must be present on this level.");
        assert_eq!(diagnostics[0].primary_location().pointer, "/plugins/0");
    }

    #[test]
    fn test_every_unexpected_key_in_document_order() {
        let diagnostics = validate(json!({"zeta": 1, "rules": {"a": "warn"}, "extend": []}));
        let pointers: Vec<&str> = diagnostics
            .iter()
            .map(|d| d.primary_location().pointer.as_str())
            .collect();
        assert_eq!(pointers, vec!["/zeta", "/extend"]);
        assert_eq!(diagnostics[1].suggest, vec!["extends"]);
    }

    #[test]
    fn test_nested_header_problems() {
        let diagnostics = validate(json!({
            "resolve": {"http": {"headers": [{"matches": "https://x/**", "nam": "X-Key"}]}}
        }));

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].message, "The field `name` must be present on this level.");
        assert_eq!(diagnostics[0].primary_location().pointer, "/resolve/http/headers/0");
        assert_eq!(diagnostics[1].message, "Property `nam` is not expected here.");
        assert_eq!(diagnostics[1].suggest[0], "name");
    }

    #[test]
    fn test_leftover_ref_key_is_unexpected() {
        let diagnostics = validate(json!({"rules": {"$ref": "x.yaml", "a": "warn"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Property `$ref` is not expected here.");
        assert_eq!(diagnostics[0].primary_location().pointer, "/rules/$ref");

        let diagnostics = validate(json!({"resolve": {"$ref": "http.yaml", "http": {}}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].primary_location().pointer, "/resolve/$ref");
        assert!(diagnostics[0].primary_location().report_on_key);
    }

    #[test]
    fn test_document_order_key() {
        let document = json!({"b": [1, {"x": 2}], "a": 3});
        assert_eq!(document_order(&document, ""), Vec::<usize>::new());
        assert_eq!(document_order(&document, "/a"), vec![1]);
        assert_eq!(document_order(&document, "/b/1/x"), vec![0, 1, 0]);
        assert_eq!(document_order(&document, "/missing"), vec![usize::MAX]);
    }

    #[test]
    fn test_location_and_origin_come_from_reference_map() {
        let document = json!({"telemetry": "maybe"});
        let mut map = identity_map(&document);
        let shared = SourceId::named("shared.yaml");
        map.insert(
            "/telemetry",
            Provenance {
                location: Location::new(shared.clone(), "/value"),
                from: Some(Location::new(SourceId::named("apilint.yaml"), "/telemetry")),
            },
        );

        let diagnostics = SelfValidator::new(Severity::Error).validate(&document, &map);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].primary_location().source, shared);
        assert_eq!(diagnostics[0].primary_location().pointer, "/value");
        assert_eq!(diagnostics[0].from.as_ref().unwrap().pointer, "/telemetry");
    }

    #[test]
    fn test_unresolved_diagnostics() {
        let root = SourceId::named("apilint.yaml");
        let unresolved = UnresolvedReference {
            pointer: "/rules".to_string(),
            location: Location::new(root.clone(), "/rules"),
            from: None,
            target: "missing.yaml".to_string(),
            target_source: None,
            reason: "IO error for path 'missing.yaml'".to_string(),
        };

        let diagnostics = SelfValidator::default().unresolved_diagnostics(&[unresolved]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Can't resolve $ref: IO error for path 'missing.yaml'"
        );
        assert_eq!(diagnostics[0].rule_id, UNRESOLVED_REF_RULE);
        assert_eq!(diagnostics[0].primary_location().source, root);
    }

    #[test]
    fn test_plugin_rule_diagnostics() {
        let acme = Plugin::new("acme").with_rule(
            Dialect::Oas3_0,
            "no-foo",
            crate::rules::RuleImplementation::Declared(json!({})),
        );
        let catalog = RuleSetCatalog::with_plugins([Arc::new(acme)]).unwrap();
        let document = json!({
            "rules": {"acme/no-foo": "error", "acme/no-fo": "warn", "info-contact": "off"},
            "oas2Rules": {"ghost/rule": "warn"}
        });

        let diagnostics = SelfValidator::default().plugin_rule_diagnostics(
            &document,
            &identity_map(&document),
            &catalog,
        );

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].message, "Rule `no-fo` is not found in plugin `acme`.");
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].suggest, vec!["acme/no-foo"]);
        assert_eq!(diagnostics[1].message, "Plugin `ghost` is not found.");
        assert_eq!(diagnostics[1].primary_location().pointer, "/oas2Rules/ghost~1rule");
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("rules", "rules"), 0);
        assert_eq!(edit_distance("rule", "rules"), 1);
        assert_eq!(edit_distance("eror", "error"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
    }

    #[test]
    fn test_suggestions_are_ordered_and_bounded() {
        let suggested = suggestions("warning", ["warn", "error", "off"].into_iter());
        assert_eq!(suggested, vec!["warn"]);
        assert!(suggestions("zzzzzz", ["extends", "rules"].into_iter()).is_empty());
    }
}
