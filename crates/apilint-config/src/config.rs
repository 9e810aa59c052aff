//! Resolved configuration

use crate::diagnostics::{Diagnostic, Severity};
use crate::headers::HeaderRule;
use crate::rules::{Dialect, Plugin, ResolvedRuleSet, RuleConfig};
use crate::source::SourceId;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Top-level sections carried through without interpretation
pub const PASSTHROUGH_KEYS: &[&str] = &["metadata", "organization", "telemetry"];

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Root source; `None` when defaults were used
    pub source: Option<SourceId>,
    /// Presets layered under the document's own rules
    pub extends: Vec<String>,
    /// Merged rule set per dialect
    pub rules: BTreeMap<Dialect, ResolvedRuleSet>,
    /// Every plugin of the run, built-in plugin first
    pub plugins: Vec<Arc<Plugin>>,
    /// Registry header rules first, then declared ones
    pub headers: Vec<HeaderRule>,
    pub passthrough: Map<String, Value>,
}

impl Config {
    pub fn rules_for(&self, dialect: Dialect) -> Option<&ResolvedRuleSet> {
        self.rules.get(&dialect)
    }

    /// Configuration of one rule in one dialect
    pub fn rule(&self, dialect: Dialect, name: &str) -> Option<&RuleConfig> {
        self.rules_for(dialect)?.get(name)
    }

    pub fn plugin(&self, id: &str) -> Option<&Arc<Plugin>> {
        self.plugins.iter().find(|plugin| plugin.id == id)
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.passthrough.get("metadata")
    }

    pub fn organization(&self) -> Option<&str> {
        self.passthrough.get("organization").and_then(Value::as_str)
    }

    /// Telemetry stays enabled unless switched `off`
    pub fn telemetry_enabled(&self) -> bool {
        self.passthrough.get("telemetry").and_then(Value::as_str) != Some("off")
    }
}

/// Result of one resolution run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub config: Config,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// Diagnostics of one rule id
    pub fn diagnostics_for<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |diagnostic| diagnostic.rule_id == rule_id)
    }
}

/// Collect the passthrough sections of a document
pub(crate) fn passthrough(document: &Value) -> Map<String, Value> {
    PASSTHROUGH_KEYS
        .iter()
        .filter_map(|key| document.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}
