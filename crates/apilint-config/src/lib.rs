//! apilint configuration
//!
//! Resolves lint configuration documents: locates the canonical config file,
//! dereferences `$ref`s across files while tracking where every value came
//! from, merges rule presets with the document's own overrides per dialect,
//! derives registry header rules and validates the document against its own
//! schema. Problems with the content are reported as [`Diagnostic`]s, never
//! as errors.
//!
//! ```no_run
//! use apilint_config::ConfigResolver;
//!
//! # async fn run() -> apilint_config::Result<()> {
//! let resolution = ConfigResolver::new().resolve(None).await?;
//! for diagnostic in &resolution.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod headers;
pub mod locator;
pub mod reference;
pub mod resolver;
pub mod result;
pub mod rules;
pub mod source;
pub mod validation;

pub use config::{Config, Resolution};
pub use diagnostics::{Diagnostic, DiagnosticLocation, Severity};
pub use error::{ConfigError, ErrorKind};
pub use headers::{HeaderRule, Region, RegionHeaderResolver, RegistryAuth};
pub use locator::{CONFIG_FILE_NAMES, Locator, PRIMARY_CONFIG_NAME};
pub use reference::{
    DocumentCache, Location, Provenance, ReferenceMap, ReferenceResolver, ResolvedDocument,
    UnresolvedReference,
};
pub use resolver::{ConfigResolver, RawConfigCallback};
pub use result::{Result, ResultExt};
pub use rules::{
    Dialect, Plugin, ResolvedRuleSet, Rule, RuleConfig, RuleImplementation, RuleMerger,
    RuleOverrides, RuleSetCatalog, RuleSetPreset, RuleSeverity,
};
pub use source::{RawDocument, Source, SourceId};
pub use validation::SelfValidator;

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("apilint=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
