//! Resolution entry points
//!
//! A [`ConfigResolver`] runs the whole pipeline: find and load the root
//! source, dereference it, assemble the plugin catalog, merge rule sets,
//! compute header rules and validate. Every run gets fresh per-run state, so
//! a resolver can be reused and shared between tasks.

use crate::config::{Config, Resolution, passthrough};
use crate::diagnostics::Severity;
use crate::error::ConfigError;
use crate::headers::{RegionHeaderResolver, RegistryAuth};
use crate::locator::Locator;
use crate::reference::{ReferenceMap, ReferenceResolver};
use crate::result::Result;
use crate::rules::builtin::DEFAULT_PRESET;
use crate::rules::{Plugin, RuleMerger, RuleOverrides, RuleSetCatalog};
use crate::source::Source;
use crate::validation::SelfValidator;
use serde_json::{Value, json};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Callback receiving the dereferenced document before rules are merged
pub type RawConfigCallback<'a> = &'a (dyn Fn(&Value, &ReferenceMap) + Send + Sync);

/// Builder and entry point for configuration resolution
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    plugins: Vec<Arc<Plugin>>,
    auth: Option<RegistryAuth>,
    config_severity: Severity,
    timeout: Option<Duration>,
    base_dir: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin for every run of this resolver
    pub fn with_plugin(mut self, plugin: impl Into<Arc<Plugin>>) -> Self {
        self.plugins.push(plugin.into());
        self
    }

    pub fn with_plugins(mut self, plugins: impl IntoIterator<Item = Arc<Plugin>>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Registry credentials used to build header rules
    pub fn with_auth(mut self, auth: RegistryAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Severity of schema and `$ref` diagnostics
    pub fn with_config_severity(mut self, severity: Severity) -> Self {
        self.config_severity = severity;
        self
    }

    /// Deadline for a whole entry point call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Directory used for discovery and for `$ref`s inside in-memory sources
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Find the canonical config file in `dir` (or the base directory)
    ///
    /// A missing file is `Ok(None)`; more than one candidate is an error.
    pub fn find_config(&self, dir: Option<&Path>) -> Result<Option<PathBuf>> {
        Locator::find(dir.or(self.base_dir.as_deref()))
    }

    /// Resolve the config at `path`, or the discovered one
    ///
    /// With nothing given and nothing found, the default configuration is
    /// resolved instead. `on_raw` sees the dereferenced document and its
    /// reference map before rules are merged.
    pub async fn load_config(
        &self,
        path: Option<&Path>,
        on_raw: Option<RawConfigCallback<'_>>,
    ) -> Result<Resolution> {
        self.with_deadline(self.load(path, on_raw)).await
    }

    /// Resolve the config at `path`, or the discovered one
    pub async fn resolve(&self, path: Option<&Path>) -> Result<Resolution> {
        self.load_config(path, None).await
    }

    /// Resolve an in-memory config, skipping discovery
    pub async fn create_config(&self, source: Source) -> Result<Resolution> {
        self.with_deadline(self.run(source, None, false)).await
    }

    async fn load(
        &self,
        path: Option<&Path>,
        on_raw: Option<RawConfigCallback<'_>>,
    ) -> Result<Resolution> {
        let source = match path {
            Some(path) => Some(Source::path(path)),
            None => self.find_config(None)?.map(Source::path),
        };

        match source {
            Some(source) => self.run(source, on_raw, false).await,
            None => {
                tracing::debug!("No config found, using defaults");
                self.run(Source::value(default_document()), on_raw, true).await
            }
        }
    }

    async fn with_deadline<T>(&self, future: impl Future<Output = Result<T>>) -> Result<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, future)
                .await
                .map_err(|_| ConfigError::timeout(limit))?,
            None => future.await,
        }
    }

    async fn run(
        &self,
        source: Source,
        on_raw: Option<RawConfigCallback<'_>>,
        is_default: bool,
    ) -> Result<Resolution> {
        let root = Arc::new(source.load().await?);
        let source_id = root.source_id();
        tracing::debug!("Resolving config: {}", source_id);

        let resolved = ReferenceResolver::new(self.base_dir()?)
            .resolve(root)
            .await;
        let document = &resolved.document;
        let reference_map = &resolved.reference_map;

        if let Some(callback) = on_raw {
            callback(document, reference_map);
        }

        let catalog = self.catalog(document)?;
        let extends = extends_of(document);
        let overrides = RuleOverrides::from_document(document);
        let rules = RuleMerger::new(&catalog).merge_all(&extends, &overrides)?;

        let mut headers = RegionHeaderResolver::resolve(self.auth.as_ref());
        headers.extend(RegionHeaderResolver::declared(document));

        let validator = SelfValidator::new(self.config_severity);
        let mut diagnostics = validator.validate(document, reference_map);
        diagnostics.extend(validator.unresolved_diagnostics(&resolved.unresolved));
        diagnostics.extend(validator.plugin_rule_diagnostics(document, reference_map, &catalog));

        if !diagnostics.is_empty() {
            tracing::debug!("{} diagnostics for {}", diagnostics.len(), source_id);
        }

        Ok(Resolution {
            config: Config {
                source: (!is_default).then_some(source_id),
                extends,
                rules,
                plugins: catalog.plugins().to_vec(),
                headers,
                passthrough: passthrough(document),
            },
            diagnostics,
        })
    }

    /// Built-in plugin, then the caller's plugins, then the document's own
    fn catalog(&self, document: &Value) -> Result<RuleSetCatalog> {
        let declared = document
            .get("plugins")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Plugin::from_descriptor)
            .map(Arc::new);

        RuleSetCatalog::with_plugins(self.plugins.iter().cloned().chain(declared))
    }

    fn base_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().map_err(|e| ConfigError::io_error(".", e)),
        }
    }
}

/// Document used when no config exists
pub fn default_document() -> Value {
    json!({ "extends": [DEFAULT_PRESET] })
}

/// Presets a document extends
///
/// An absent (or malformed) `extends` means the default preset; an explicit
/// empty list means none.
fn extends_of(document: &Value) -> Vec<String> {
    match document.get("extends").and_then(Value::as_array) {
        Some(names) => names
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => vec![DEFAULT_PRESET.to_string()],
    }
}
