//! Rule set merging
//!
//! Per dialect: presets from `extends` are layered in order (later presets
//! win), then the document's own overrides are layered on top and always win.

use super::catalog::RuleSetCatalog;
use super::{Dialect, RuleConfig, RuleMap, RuleSetPreset, parse_rule_map};
use crate::result::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Rule overrides taken from a config document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOverrides {
    /// `rules`: applies to every dialect
    pub all: RuleMap,
    /// `oas2Rules`, `oas3_0Rules`, `oas3_1Rules`
    pub dialects: BTreeMap<Dialect, RuleMap>,
}

impl RuleOverrides {
    pub fn from_document(document: &Value) -> Self {
        let dialects = Dialect::ALL
            .into_iter()
            .filter_map(|dialect| {
                let rules = parse_rule_map(document.get(dialect.rules_key()));
                (!rules.is_empty()).then_some((dialect, rules))
            })
            .collect();

        Self {
            all: parse_rule_map(document.get("rules")),
            dialects,
        }
    }

    /// Overrides effective for `dialect`, the dialect section winning
    pub fn for_dialect(&self, dialect: Dialect) -> RuleMap {
        let mut rules = self.all.clone();
        if let Some(specific) = self.dialects.get(&dialect) {
            rules.extend(specific.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        rules
    }
}

/// Final rule configuration for one dialect
///
/// A rule missing here is "not configured", which is distinct from `off`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedRuleSet(RuleMap);

impl ResolvedRuleSet {
    pub fn get(&self, name: &str) -> Option<&RuleConfig> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RuleConfig)> {
        self.0.iter()
    }

    /// Rules that are configured and not `off`
    pub fn enabled(&self) -> impl Iterator<Item = (&String, &RuleConfig)> {
        self.0.iter().filter(|(_, config)| !config.is_off())
    }

    fn layer(&mut self, rules: &RuleMap) {
        for (name, config) in rules {
            self.0.insert(name.clone(), config.clone());
        }
    }
}

/// Merges presets and overrides using a catalog
pub struct RuleMerger<'a> {
    catalog: &'a RuleSetCatalog,
}

impl<'a> RuleMerger<'a> {
    pub fn new(catalog: &'a RuleSetCatalog) -> Self {
        Self { catalog }
    }

    /// Look up every preset named in `extends`, in order
    pub fn presets(&self, extends: &[String]) -> Result<Vec<&'a RuleSetPreset>> {
        extends
            .iter()
            .map(|name| self.catalog.lookup(name))
            .collect()
    }

    /// Merged rule set for one dialect
    pub fn merge(
        &self,
        extends: &[String],
        overrides: &RuleOverrides,
        dialect: Dialect,
    ) -> Result<ResolvedRuleSet> {
        let presets = self.presets(extends)?;
        Ok(Self::merge_presets(&presets, overrides, dialect))
    }

    /// Merged rule sets for every dialect
    pub fn merge_all(
        &self,
        extends: &[String],
        overrides: &RuleOverrides,
    ) -> Result<BTreeMap<Dialect, ResolvedRuleSet>> {
        let presets = self.presets(extends)?;
        Ok(Dialect::ALL
            .into_iter()
            .map(|dialect| (dialect, Self::merge_presets(&presets, overrides, dialect)))
            .collect())
    }

    fn merge_presets(
        presets: &[&RuleSetPreset],
        overrides: &RuleOverrides,
        dialect: Dialect,
    ) -> ResolvedRuleSet {
        let mut resolved = ResolvedRuleSet::default();
        for preset in presets {
            if let Some(rules) = preset.for_dialect(dialect) {
                resolved.layer(rules);
            }
        }
        resolved.layer(&overrides.for_dialect(dialect));
        resolved
    }
}
