//! Diagnostics produced while resolving configuration

use crate::reference::{Location, Provenance};
use crate::source::SourceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity levels for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages
    Info,
    /// Problems that should be addressed
    #[default]
    Warn,
    /// Problems that must be fixed
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A position a diagnostic points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticLocation {
    pub source: SourceId,
    pub pointer: String,
    /// Highlight the mapping key rather than its value
    pub report_on_key: bool,
}

impl DiagnosticLocation {
    pub fn new(location: &Location, report_on_key: bool) -> Self {
        Self {
            source: location.source.clone(),
            pointer: location.pointer.clone(),
            report_on_key,
        }
    }
}

/// A single reported problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    pub rule_id: String,
    pub severity: Severity,
    /// Never empty
    pub location: Vec<DiagnosticLocation>,
    /// The `$ref` node the offending value was pulled in through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Location>,
    pub suggest: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic at one location
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        location: DiagnosticLocation,
    ) -> Self {
        Self {
            message: message.into(),
            rule_id: rule_id.into(),
            severity,
            location: vec![location],
            from: None,
            suggest: Vec::new(),
        }
    }

    /// Create a diagnostic located by a provenance entry
    pub fn at(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        provenance: &Provenance,
        report_on_key: bool,
    ) -> Self {
        Self::new(
            rule_id,
            severity,
            message,
            DiagnosticLocation::new(&provenance.location, report_on_key),
        )
        .with_from(provenance.from.clone())
    }

    pub fn with_from(mut self, from: Option<Location>) -> Self {
        self.from = from;
        self
    }

    pub fn with_suggestions(mut self, suggest: Vec<String>) -> Self {
        self.suggest = suggest;
        self
    }

    /// Add another location after the primary one
    pub fn with_location(mut self, location: DiagnosticLocation) -> Self {
        self.location.push(location);
        self
    }

    /// The first location
    pub fn primary_location(&self) -> &DiagnosticLocation {
        &self.location[0]
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.primary_location();
        write!(
            f,
            "{}: {} [{}] at {}#{}",
            self.severity, self.message, self.rule_id, location.source, location.pointer
        )?;
        if let Some(from) = &self.from {
            write!(f, " (referenced from {}#{})", from.source, from.pointer)?;
        }
        Ok(())
    }
}
