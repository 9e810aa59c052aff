//! Registry of plugins and their presets for one resolution run

use super::builtin::builtin_plugin;
use super::{Plugin, RuleSetPreset};
use crate::error::ConfigError;
use crate::result::Result;
use std::sync::Arc;

/// Plugins available to one resolution run, built-in plugin first
///
/// Each run owns its catalog, so runs with different plugin sets never see
/// each other's registrations.
#[derive(Debug, Clone)]
pub struct RuleSetCatalog {
    plugins: Vec<Arc<Plugin>>,
}

impl Default for RuleSetCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleSetCatalog {
    /// Catalog containing only the built-in plugin
    pub fn new() -> Self {
        Self {
            plugins: vec![builtin_plugin()],
        }
    }

    /// Catalog with the built-in plugin followed by `plugins`
    pub fn with_plugins(plugins: impl IntoIterator<Item = Arc<Plugin>>) -> Result<Self> {
        let mut catalog = Self::new();
        for plugin in plugins {
            catalog.register(plugin)?;
        }
        Ok(catalog)
    }

    /// Register a plugin; ids must be unique
    pub fn register(&mut self, plugin: Arc<Plugin>) -> Result<()> {
        if self.plugin(&plugin.id).is_some() {
            return Err(ConfigError::duplicate_plugin(plugin.id.clone()));
        }
        tracing::debug!("Registered plugin '{}'", plugin.id);
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn plugin(&self, id: &str) -> Option<&Arc<Plugin>> {
        self.plugins.iter().find(|plugin| plugin.id == id)
    }

    /// Plugins in registration order
    pub fn plugins(&self) -> &[Arc<Plugin>] {
        &self.plugins
    }

    /// Find a preset by name
    ///
    /// `name` resolves against the built-in plugin; `plugin-id/name` splits on
    /// the first `/` and resolves against that plugin.
    pub fn lookup(&self, name: &str) -> Result<&RuleSetPreset> {
        let (plugin_id, preset_name) = split_qualified(name);

        let plugin = self
            .plugin(plugin_id)
            .ok_or_else(|| ConfigError::unknown_preset(preset_name, Some(plugin_id)))?;

        plugin.configs.get(preset_name).ok_or_else(|| {
            ConfigError::unknown_preset(preset_name, (!plugin.is_builtin()).then_some(plugin_id))
        })
    }

    /// Whether `qualified` (`plugin-id/rule`) names a registered plugin rule
    pub fn has_plugin_rule(&self, qualified: &str) -> bool {
        let (plugin_id, rule_name) = split_qualified(qualified);
        self.plugin(plugin_id)
            .is_some_and(|plugin| plugin.has_rule(rule_name))
    }
}

/// Split `plugin-id/name` on the first `/`; unqualified names belong to the
/// built-in plugin
pub fn split_qualified(name: &str) -> (&str, &str) {
    name.split_once('/').unwrap_or(("", name))
}
