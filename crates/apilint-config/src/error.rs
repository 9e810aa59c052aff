//! Error types for configuration resolution
//!
//! Only problems that make the meaning of a resolution ambiguous are errors.
//! Problems with document content are reported as diagnostics instead.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for configuration resolution
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No canonical config file exists in the searched directory
    #[error("No config file found in '{}' (expected one of: {})", .dir.display(), .candidates.join(", "))]
    NotFound {
        dir: PathBuf,
        candidates: Vec<String>,
    },

    /// More than one canonical config file exists in the same directory
    #[error(
        "Multiple configuration files are not allowed. Found the following files: {}.\nUse '{primary}' instead and remove the others.",
        .files.join(", ")
    )]
    MultipleFound {
        files: Vec<String>,
        primary: String,
    },

    /// A preset named in `extends` is not provided by any registered plugin
    #[error("Preset '{name}' is not found{}", .plugin.as_ref().map(|p| format!(" in plugin '{p}'")).unwrap_or_default())]
    UnknownPreset {
        name: String,
        plugin: Option<String>,
    },

    /// Two plugins were registered under the same id
    #[error("Plugin id '{id}' is already registered. Plugin ids must be unique.")]
    DuplicatePlugin { id: String },

    /// Root config source could not be parsed
    #[error("Failed to parse '{source_id}': {message}")]
    Parse { source_id: String, message: String },

    /// File system I/O errors
    #[error("IO error for path '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The whole resolution call exceeded the caller's deadline
    #[error("Configuration resolution timed out after {}ms", .elapsed.as_millis())]
    Timeout { elapsed: Duration },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Ambiguous,
    Catalog,
    Parse,
    Io,
    Timeout,
    Internal,
}

impl ConfigError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::NotFound { .. } => ErrorKind::NotFound,
            ConfigError::MultipleFound { .. } => ErrorKind::Ambiguous,
            ConfigError::UnknownPreset { .. } | ConfigError::DuplicatePlugin { .. } => {
                ErrorKind::Catalog
            }
            ConfigError::Parse { .. } => ErrorKind::Parse,
            ConfigError::Io { .. } => ErrorKind::Io,
            ConfigError::Timeout { .. } => ErrorKind::Timeout,
            ConfigError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Check if the caller may continue with default configuration
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }

    /// Create a not-found error
    pub fn not_found(dir: impl Into<PathBuf>, candidates: &[&str]) -> Self {
        Self::NotFound {
            dir: dir.into(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Create a multiple-found error; `files` are sorted here
    pub fn multiple_found(mut files: Vec<String>, primary: impl Into<String>) -> Self {
        files.sort();
        Self::MultipleFound {
            files,
            primary: primary.into(),
        }
    }

    /// Create an unknown preset error
    pub fn unknown_preset(name: impl Into<String>, plugin: Option<&str>) -> Self {
        Self::UnknownPreset {
            name: name.into(),
            plugin: plugin.map(str::to_string),
        }
    }

    /// Create a duplicate plugin error
    pub fn duplicate_plugin(id: impl Into<String>) -> Self {
        Self::DuplicatePlugin { id: id.into() }
    }

    /// Create a parse error
    pub fn parse_error(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a timeout error
    pub fn timeout(elapsed: Duration) -> Self {
        Self::Timeout { elapsed }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
