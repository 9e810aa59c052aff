use apilint_config::{
    ConfigError, ConfigResolver, Dialect, Locator, Plugin, Region, RegistryAuth, Rule,
    RuleConfig, RuleImplementation, RuleSetPreset, RuleSeverity, Severity, Source, SourceId,
};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
    let path = dir.join(filename);
    fs::write(&path, content).unwrap();
    path
}

#[derive(Debug)]
struct NoFoo;

impl Rule for NoFoo {
    fn name(&self) -> &str {
        "no-foo"
    }

    fn enter(&self, node: &Value, pointer: &str, report: &mut dyn FnMut(String)) {
        if node.get("foo").is_some() {
            report(format!("`foo` is not allowed at {pointer}"));
        }
    }
}

#[test]
fn test_locator_rejects_multiple_canonical_files() {
    let temp_dir = TempDir::new().unwrap();
    create_temp_config(temp_dir.path(), "apilint.yaml", "{}");
    create_temp_config(temp_dir.path(), ".apilint.yaml", "{}");

    let err = Locator::locate(Some(temp_dir.path())).unwrap_err();
    match &err {
        ConfigError::MultipleFound { files, primary } => {
            assert_eq!(files, &vec![".apilint.yaml", "apilint.yaml"]);
            assert_eq!(primary, "apilint.yaml");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("Use 'apilint.yaml' instead"));
}

#[test]
fn test_locator_joins_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_temp_config(temp_dir.path(), ".apilint.yml", "{}");

    assert_eq!(Locator::locate(Some(temp_dir.path())).unwrap(), path);
}

#[tokio::test]
async fn test_override_beats_preset_in_every_dialect() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_temp_config(
        temp_dir.path(),
        "apilint.yaml",
        "extends: [recommended]\nrules:\n  operation-summary: off\n",
    );

    let resolution = ConfigResolver::new().resolve(Some(&path)).await.unwrap();

    assert!(resolution.diagnostics.is_empty());
    for dialect in Dialect::ALL {
        assert_eq!(
            resolution.config.rule(dialect, "operation-summary"),
            Some(&RuleConfig::Severity(RuleSeverity::Off))
        );
    }
}

#[tokio::test]
async fn test_misspelled_override_is_kept_as_written() {
    let resolution = ConfigResolver::new()
        .create_config(Source::text(
            "extends: [recommended]\nrules:\n  operation-summary: eror\n",
        ))
        .await
        .unwrap();

    for dialect in Dialect::ALL {
        assert_eq!(
            resolution.config.rule(dialect, "operation-summary"),
            Some(&RuleConfig::Raw(json!("eror")))
        );
    }
    assert_eq!(resolution.diagnostics.len(), 1);
    assert_eq!(
        resolution.diagnostics[0].message,
        "`operation-summary` can be one of the following only: \"error\", \"warn\", \"off\"."
    );
    assert_eq!(resolution.diagnostics[0].suggest[0], "error");
}

#[tokio::test]
async fn test_last_extends_wins() {
    let resolver = ConfigResolver::new();

    let resolution = resolver
        .create_config(Source::text("extends: [recommended, minimal]\n"))
        .await
        .unwrap();
    assert_eq!(
        resolution.config.rule(Dialect::Oas3_1, "info-license").unwrap().severity(),
        RuleSeverity::Off
    );

    let resolution = resolver
        .create_config(Source::text("extends: [minimal, recommended]\n"))
        .await
        .unwrap();
    assert_eq!(
        resolution.config.rule(Dialect::Oas3_1, "info-license").unwrap().severity(),
        RuleSeverity::Warn
    );
}

#[tokio::test]
async fn test_region_header_rules() {
    let us = ConfigResolver::new()
        .with_auth(RegistryAuth::new(Region::Us, "token"))
        .create_config(Source::value(json!({})))
        .await
        .unwrap();
    assert_eq!(us.config.headers.len(), 2);

    let eu = ConfigResolver::new()
        .with_auth(RegistryAuth::new(Region::Eu, "token"))
        .create_config(Source::value(json!({})))
        .await
        .unwrap();
    assert_eq!(eu.config.headers.len(), 1);
    assert_eq!(eu.config.headers[0].value.as_deref(), Some("token"));

    let anonymous = ConfigResolver::new()
        .create_config(Source::value(json!({})))
        .await
        .unwrap();
    assert!(anonymous.config.headers.is_empty());
}

#[tokio::test]
async fn test_cross_file_ref_diagnostic_points_at_target() {
    let temp_dir = TempDir::new().unwrap();
    let shared = create_temp_config(temp_dir.path(), "shared.yaml", "telemetry: maybe\n");
    let path = create_temp_config(
        temp_dir.path(),
        "apilint.yaml",
        "telemetry:\n  $ref: shared.yaml#/telemetry\n",
    );

    let resolution = ConfigResolver::new().resolve(Some(&path)).await.unwrap();

    assert_eq!(resolution.config.passthrough["telemetry"], json!("maybe"));
    assert_eq!(resolution.diagnostics.len(), 1);
    let diagnostic = &resolution.diagnostics[0];
    assert_eq!(diagnostic.rule_id, "struct");
    assert_eq!(diagnostic.primary_location().source, SourceId::from_path(&shared));
    assert_eq!(diagnostic.primary_location().pointer, "/telemetry");
    let from = diagnostic.from.as_ref().unwrap();
    assert_eq!(from.source, SourceId::from_path(&path));
    assert_eq!(from.pointer, "/telemetry");
}

#[tokio::test]
async fn test_missing_ref_file_yields_one_diagnostic() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_temp_config(
        temp_dir.path(),
        "apilint.yaml",
        "extends: [minimal]\nrules:\n  $ref: missing-rules.yaml\n",
    );

    let resolution = ConfigResolver::new().resolve(Some(&path)).await.unwrap();

    assert_eq!(resolution.diagnostics.len(), 1);
    let diagnostic = &resolution.diagnostics[0];
    assert_eq!(diagnostic.rule_id, "no-unresolved-refs");
    assert_eq!(diagnostic.severity, Severity::Warn);
    assert!(diagnostic.message.starts_with("Can't resolve $ref: "));
    assert!(diagnostic.message.contains("missing-rules.yaml"));
    assert_eq!(diagnostic.primary_location().source, SourceId::from_path(&path));
    assert_eq!(diagnostic.primary_location().pointer, "/rules");
    let from = diagnostic.from.as_ref().unwrap();
    assert_eq!(from.source, SourceId::from_path(&path));
    assert_eq!(from.pointer, "/rules");

    // The rest of the document still resolves
    assert_eq!(resolution.config.extends, vec!["minimal"]);
    assert!(resolution.config.rule(Dialect::Oas2, "struct").is_some());
}

#[tokio::test]
async fn test_document_plugin_rule_is_registered_and_merged() {
    let resolution = ConfigResolver::new()
        .create_config(Source::text(
            r#"
plugins:
  - id: acme
    rules:
      oas3_0:
        no-foo: {assert: {defined: false}}
rules:
  acme/no-foo: error
"#,
        ))
        .await
        .unwrap();

    assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
    let acme = resolution.config.plugin("acme").unwrap();
    assert!(matches!(
        acme.rule(Dialect::Oas3_0, "no-foo"),
        Some(RuleImplementation::Declared(_))
    ));
    for dialect in Dialect::ALL {
        assert_eq!(
            resolution.config.rule(dialect, "acme/no-foo"),
            Some(&RuleConfig::Severity(RuleSeverity::Error))
        );
    }
    let ids: Vec<&str> = resolution.config.plugins.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["", "acme"]);
}

#[tokio::test]
async fn test_native_plugin_presets_and_unknown_rules() {
    let acme = Plugin::new("acme")
        .with_native_rule(&Dialect::ALL, Arc::new(NoFoo))
        .with_preset(
            "strict",
            RuleSetPreset::new().with_rule_for_all("acme/no-foo", RuleSeverity::Error),
        );

    let resolution = ConfigResolver::new()
        .with_plugin(acme)
        .create_config(Source::text(
            "extends: [acme/strict]\nrules:\n  acme/no-bar: warn\n",
        ))
        .await
        .unwrap();

    assert_eq!(
        resolution.config.rule(Dialect::Oas2, "acme/no-foo").unwrap().severity(),
        RuleSeverity::Error
    );
    assert!(resolution.config.rule(Dialect::Oas2, "operation-summary").is_none());

    let unknown: Vec<_> = resolution.diagnostics_for("unknown-plugin-rule").collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].severity, Severity::Error);
    assert_eq!(unknown[0].primary_location().pointer, "/rules/acme~1no-bar");
    assert!(resolution.has_errors());
}

#[test]
fn test_native_rule_hooks_are_callable() {
    let rule: Arc<dyn Rule> = Arc::new(NoFoo);
    let mut reported = Vec::new();
    rule.enter(&json!({"foo": 1}), "/paths", &mut |message| reported.push(message));
    rule.leave(&json!({"foo": 1}), "/paths", &mut |message| reported.push(message));
    assert_eq!(reported, vec!["`foo` is not allowed at /paths"]);
}

#[tokio::test]
async fn test_config_severity_applies_to_schema_diagnostics() {
    let resolution = ConfigResolver::new()
        .with_config_severity(Severity::Error)
        .create_config(Source::text("extend: [minimal]\n"))
        .await
        .unwrap();

    assert_eq!(resolution.diagnostics.len(), 1);
    let diagnostic = &resolution.diagnostics[0];
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.message, "Property `extend` is not expected here.");
    assert_eq!(diagnostic.suggest, vec!["extends"]);
    assert!(diagnostic.primary_location().report_on_key);
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let temp_dir = TempDir::new().unwrap();
    create_temp_config(temp_dir.path(), "shared.yaml", "a: warn\nb: error\n");
    create_temp_config(
        temp_dir.path(),
        "apilint.yaml",
        "rules:\n  $ref: shared.yaml\noas3_1Rules:\n  $ref: nowhere.yaml\n",
    );

    let resolver = ConfigResolver::new()
        .with_base_dir(temp_dir.path())
        .with_auth(RegistryAuth::new(Region::Us, "token"));

    let first = resolver.resolve(None).await.unwrap();
    let second = resolver.resolve(None).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
    assert_eq!(first.diagnostics.len(), 1);
}
