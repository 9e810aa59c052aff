//! Rule configuration model
//!
//! Rules are configured independently for each [`Dialect`]. A rule entry is
//! either a bare severity or a settings object; the behavior behind a rule
//! name lives in a [`RuleImplementation`] registered by a plugin, which this
//! crate only carries around.

pub mod builtin;
pub mod catalog;
pub mod merge;
pub mod plugin;

pub use catalog::RuleSetCatalog;
pub use merge::{ResolvedRuleSet, RuleMerger, RuleOverrides};
pub use plugin::{Plugin, RuleSetPreset};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Ordered rule name → configuration map
pub type RuleMap = IndexMap<String, RuleConfig>;

/// Schema dialect rules are configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// Legacy 2.0 documents
    #[serde(rename = "oas2")]
    Oas2,
    #[serde(rename = "oas3_0")]
    Oas3_0,
    #[serde(rename = "oas3_1")]
    Oas3_1,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Oas2, Dialect::Oas3_0, Dialect::Oas3_1];

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Oas2 => "oas2",
            Dialect::Oas3_0 => "oas3_0",
            Dialect::Oas3_1 => "oas3_1",
        }
    }

    /// Config key holding overrides for this dialect only
    pub fn rules_key(self) -> &'static str {
        match self {
            Dialect::Oas2 => "oas2Rules",
            Dialect::Oas3_0 => "oas3_0Rules",
            Dialect::Oas3_1 => "oas3_1Rules",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == value)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Report as an error
    Error,
    /// Report as a warning
    Warn,
    /// Disable the rule
    Off,
}

impl RuleSeverity {
    pub const VALUES: [&'static str; 3] = ["error", "warn", "off"];
}

/// Configuration of a single rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleConfig {
    /// `rule: warn`
    Severity(RuleSeverity),
    /// `rule: { severity: warn, ...options }`
    Settings(RuleSettings),
    /// Anything else, kept exactly as the document wrote it
    Raw(Value),
}

/// Object form of a rule configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<RuleSeverity>,
    /// Rule-specific options
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl RuleConfig {
    /// Parse a config node; `None` when the node is not a valid rule config
    pub fn from_value(value: &Value) -> Option<Self> {
        match serde_json::from_value(value.clone()).ok()? {
            RuleConfig::Raw(_) => None,
            config => Some(config),
        }
    }

    /// Parse a config node, keeping invalid nodes as [`RuleConfig::Raw`]
    pub fn from_value_or_raw(value: &Value) -> Self {
        Self::from_value(value).unwrap_or_else(|| RuleConfig::Raw(value.clone()))
    }

    /// Effective severity; the object form and raw values default to `error`
    pub fn severity(&self) -> RuleSeverity {
        match self {
            RuleConfig::Severity(severity) => *severity,
            RuleConfig::Settings(settings) => settings.severity.unwrap_or(RuleSeverity::Error),
            RuleConfig::Raw(_) => RuleSeverity::Error,
        }
    }

    /// Whether the entry is a well-formed severity or settings object
    pub fn is_valid(&self) -> bool {
        !matches!(self, RuleConfig::Raw(_))
    }

    pub fn is_off(&self) -> bool {
        self.severity() == RuleSeverity::Off
    }
}

impl From<RuleSeverity> for RuleConfig {
    fn from(severity: RuleSeverity) -> Self {
        RuleConfig::Severity(severity)
    }
}

/// Parse a rules mapping in document order
///
/// Malformed entries stay in the map as [`RuleConfig::Raw`]; the validator
/// reports them, and an override must still win over every preset.
pub fn parse_rule_map(value: Option<&Value>) -> RuleMap {
    let Some(entries) = value.and_then(Value::as_object) else {
        return RuleMap::new();
    };

    entries
        .iter()
        .map(|(name, config)| {
            let config = RuleConfig::from_value_or_raw(config);
            if !config.is_valid() {
                tracing::debug!("Keeping malformed configuration for rule '{}' as written", name);
            }
            (name.clone(), config)
        })
        .collect()
}

/// Capability every executable rule provides
///
/// Hooks receive each node of the target document with its JSON pointer and
/// report problems through `report`. Running rules is up to the lint engine.
pub trait Rule: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn enter(&self, _node: &Value, _pointer: &str, _report: &mut dyn FnMut(String)) {}

    fn leave(&self, _node: &Value, _pointer: &str, _report: &mut dyn FnMut(String)) {}
}

/// What stands behind a registered rule name
#[derive(Debug, Clone)]
pub enum RuleImplementation {
    /// Implemented by the lint engine itself
    Builtin,
    /// Implemented in code and handed over by the caller
    Native(Arc<dyn Rule>),
    /// Declared inline by a plugin descriptor in a config document
    Declared(Value),
}

impl PartialEq for RuleImplementation {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuleImplementation::Builtin, RuleImplementation::Builtin) => true,
            (RuleImplementation::Native(a), RuleImplementation::Native(b)) => Arc::ptr_eq(a, b),
            (RuleImplementation::Declared(a), RuleImplementation::Declared(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for RuleImplementation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RuleImplementation::Builtin => serializer.serialize_str("builtin"),
            RuleImplementation::Native(rule) => serializer.serialize_str(rule.name()),
            RuleImplementation::Declared(value) => value.serialize(serializer),
        }
    }
}
