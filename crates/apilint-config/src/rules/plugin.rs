//! Plugins and rule presets

use super::{Dialect, Rule, RuleConfig, RuleImplementation, RuleMap, parse_rule_map};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Id of the built-in plugin
pub const BUILTIN_PLUGIN_ID: &str = "";

/// A named bundle of per-dialect rule defaults
///
/// A dialect missing from the preset contributes nothing for that dialect.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleSetPreset {
    rules: BTreeMap<Dialect, RuleMap>,
}

impl RuleSetPreset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` for one dialect
    pub fn with_rule(
        mut self,
        dialect: Dialect,
        name: impl Into<String>,
        config: impl Into<RuleConfig>,
    ) -> Self {
        self.rules
            .entry(dialect)
            .or_default()
            .insert(name.into(), config.into());
        self
    }

    /// Set `name` for every dialect
    pub fn with_rule_for_all(self, name: impl Into<String>, config: impl Into<RuleConfig>) -> Self {
        let name = name.into();
        let config = config.into();
        Dialect::ALL.into_iter().fold(self, |preset, dialect| {
            preset.with_rule(dialect, name.clone(), config.clone())
        })
    }

    pub fn for_dialect(&self, dialect: Dialect) -> Option<&RuleMap> {
        self.rules.get(&dialect)
    }

    /// Build a preset from `{rules?, oas2Rules?, oas3_0Rules?, oas3_1Rules?}`
    ///
    /// `rules` applies to every dialect; dialect sections layer over it.
    pub fn from_value(value: &Value) -> Self {
        let has_shared = value.get("rules").is_some();
        let shared = parse_rule_map(value.get("rules"));
        let mut preset = Self::new();

        for dialect in Dialect::ALL {
            let section = value.get(dialect.rules_key());
            if !has_shared && section.is_none() {
                continue;
            }
            let mut rules = shared.clone();
            rules.extend(parse_rule_map(section));
            preset.rules.insert(dialect, rules);
        }

        preset
    }
}

/// A bundle of rule implementations and presets under one id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plugin {
    pub id: String,
    /// Dialect → unqualified rule name → implementation
    pub rules: BTreeMap<Dialect, IndexMap<String, RuleImplementation>>,
    /// Preset name → preset
    pub configs: IndexMap<String, RuleSetPreset>,
}

impl Plugin {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.id == BUILTIN_PLUGIN_ID
    }

    pub fn with_rule(
        mut self,
        dialect: Dialect,
        name: impl Into<String>,
        implementation: RuleImplementation,
    ) -> Self {
        self.rules
            .entry(dialect)
            .or_default()
            .insert(name.into(), implementation);
        self
    }

    /// Register a code rule under its own name for the given dialects
    pub fn with_native_rule(self, dialects: &[Dialect], rule: Arc<dyn Rule>) -> Self {
        let name = rule.name().to_string();
        dialects.iter().fold(self, |plugin, dialect| {
            plugin.with_rule(
                *dialect,
                name.clone(),
                RuleImplementation::Native(rule.clone()),
            )
        })
    }

    pub fn with_preset(mut self, name: impl Into<String>, preset: RuleSetPreset) -> Self {
        self.configs.insert(name.into(), preset);
        self
    }

    pub fn rule(&self, dialect: Dialect, name: &str) -> Option<&RuleImplementation> {
        self.rules.get(&dialect)?.get(name)
    }

    /// Whether any dialect provides the unqualified rule `name`
    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.values().any(|rules| rules.contains_key(name))
    }

    /// Qualified name of one of this plugin's rules
    pub fn qualified_name(&self, name: &str) -> String {
        if self.is_builtin() {
            name.to_string()
        } else {
            format!("{}/{}", self.id, name)
        }
    }

    /// Build a plugin from a document descriptor
    ///
    /// Returns `None` when the descriptor has no string `id`; the shape of
    /// everything else is reported by validation, invalid parts are skipped.
    pub fn from_descriptor(value: &Value) -> Option<Self> {
        let id = value.get("id")?.as_str()?;
        let mut plugin = Plugin::new(id);

        if let Some(rules) = value.get("rules").and_then(Value::as_object) {
            for (dialect_key, entries) in rules {
                let Some(dialect) = Dialect::parse(dialect_key) else {
                    continue;
                };
                let Some(entries) = entries.as_object() else {
                    continue;
                };
                for (name, implementation) in entries {
                    plugin = plugin.with_rule(
                        dialect,
                        name.clone(),
                        RuleImplementation::Declared(implementation.clone()),
                    );
                }
            }
        }

        if let Some(configs) = value.get("configs").and_then(Value::as_object) {
            for (name, preset) in configs {
                if preset.is_object() {
                    plugin = plugin.with_preset(name.clone(), RuleSetPreset::from_value(preset));
                }
            }
        }

        Some(plugin)
    }
}
