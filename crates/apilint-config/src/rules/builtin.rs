//! Built-in rules and presets
//!
//! The built-in plugin has the empty id and provides the `recommended`,
//! `minimal` and `all` presets.

use super::plugin::BUILTIN_PLUGIN_ID;
use super::{Dialect, Plugin, RuleImplementation, RuleSetPreset, RuleSeverity};
use once_cell::sync::Lazy;
use std::sync::Arc;

use Dialect::{Oas2, Oas3_0, Oas3_1};
use RuleSeverity::{Error, Off, Warn};

/// Preset used when a document does not say what it extends
pub const DEFAULT_PRESET: &str = "recommended";

const ALL_DIALECTS: &[Dialect] = &[Oas2, Oas3_0, Oas3_1];
const OAS3: &[Dialect] = &[Oas3_0, Oas3_1];

struct BuiltinRule {
    name: &'static str,
    dialects: &'static [Dialect],
    recommended: RuleSeverity,
    minimal: RuleSeverity,
}

const fn rule(
    name: &'static str,
    dialects: &'static [Dialect],
    recommended: RuleSeverity,
    minimal: RuleSeverity,
) -> BuiltinRule {
    BuiltinRule {
        name,
        dialects,
        recommended,
        minimal,
    }
}

const BUILTIN_RULES: &[BuiltinRule] = &[
    rule("struct", ALL_DIALECTS, Error, Error),
    rule("no-unresolved-refs", ALL_DIALECTS, Error, Error),
    rule("info-contact", ALL_DIALECTS, Off, Off),
    rule("info-license", ALL_DIALECTS, Warn, Off),
    rule("info-license-url", ALL_DIALECTS, Warn, Off),
    rule("operation-2xx-response", ALL_DIALECTS, Warn, Warn),
    rule("operation-4xx-response", ALL_DIALECTS, Warn, Off),
    rule("operation-operationId", ALL_DIALECTS, Warn, Warn),
    rule("operation-operationId-unique", ALL_DIALECTS, Error, Warn),
    rule("operation-parameters-unique", ALL_DIALECTS, Error, Warn),
    rule("operation-summary", ALL_DIALECTS, Error, Error),
    rule("path-not-include-query", ALL_DIALECTS, Error, Error),
    rule("path-parameters-defined", ALL_DIALECTS, Error, Warn),
    rule("security-defined", ALL_DIALECTS, Error, Warn),
    rule("tag-description", ALL_DIALECTS, Warn, Warn),
    rule("no-unused-components", ALL_DIALECTS, Warn, Warn),
    rule("boolean-parameter-prefixes", &[Oas2], Off, Off),
    rule("no-empty-servers", OAS3, Error, Error),
    rule("no-server-example.com", OAS3, Warn, Warn),
    rule("no-server-trailing-slash", OAS3, Error, Off),
    rule("no-example-value-and-externalValue", OAS3, Error, Warn),
    rule("no-invalid-media-type-examples", OAS3, Warn, Off),
    rule("spec-components-invalid-map-name", &[Oas3_1], Error, Warn),
];

static BUILTIN_PLUGIN: Lazy<Arc<Plugin>> = Lazy::new(|| Arc::new(build_builtin_plugin()));

/// The process-wide built-in plugin
pub fn builtin_plugin() -> Arc<Plugin> {
    BUILTIN_PLUGIN.clone()
}

fn build_builtin_plugin() -> Plugin {
    let mut recommended = RuleSetPreset::new();
    let mut minimal = RuleSetPreset::new();
    let mut all = RuleSetPreset::new();
    let mut plugin = Plugin::new(BUILTIN_PLUGIN_ID);

    for builtin in BUILTIN_RULES {
        for &dialect in builtin.dialects {
            plugin = plugin.with_rule(dialect, builtin.name, RuleImplementation::Builtin);
            recommended = recommended.with_rule(dialect, builtin.name, builtin.recommended);
            minimal = minimal.with_rule(dialect, builtin.name, builtin.minimal);
            all = all.with_rule(dialect, builtin.name, Error);
        }
    }

    plugin
        .with_preset("recommended", recommended)
        .with_preset("minimal", minimal)
        .with_preset("all", all)
}
