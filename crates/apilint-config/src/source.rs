//! Config sources and parsed documents
//!
//! Every entry shape (a discovered file, an in-memory string, an already
//! parsed value) is turned into a [`Source`] up front so the rest of the
//! pipeline never cares where content came from.

use crate::error::ConfigError;
use crate::result::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Name used for in-memory sources when the caller does not give one
pub const INLINE_SOURCE_NAME: &str = "<inline config>";

/// Stable identity of a source
///
/// For files this is the lexically normalized absolute path, for in-memory
/// sources the name they were created with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(Arc<str>);

impl SourceId {
    /// Identity of an in-memory source
    pub fn named(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Identity of a file source
    pub fn from_path(path: &Path) -> Self {
        Self(Arc::from(absolute_path(path).to_string_lossy().as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Physical origin of document content
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A file on disk
    Path(PathBuf),
    /// Unparsed text held in memory
    Text { name: String, content: String },
    /// An already parsed document
    Value { name: String, value: Value },
}

impl Source {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// In-memory text under the default inline name
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            name: INLINE_SOURCE_NAME.to_string(),
            content: content.into(),
        }
    }

    /// Pre-parsed value under the default inline name
    pub fn value(value: Value) -> Self {
        Self::Value {
            name: INLINE_SOURCE_NAME.to_string(),
            value,
        }
    }

    pub fn id(&self) -> SourceId {
        match self {
            Source::Path(path) => SourceId::from_path(path),
            Source::Text { name, .. } | Source::Value { name, .. } => SourceId::named(name),
        }
    }

    /// Directory that relative `$ref` targets inside this source resolve against
    ///
    /// In-memory sources have no directory of their own and use `fallback`.
    pub fn base_dir(&self, fallback: &Path) -> PathBuf {
        match self {
            Source::Path(path) => absolute_path(path)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| fallback.to_path_buf()),
            _ => fallback.to_path_buf(),
        }
    }

    /// Read and parse this source
    pub async fn load(&self) -> Result<RawDocument> {
        let root = match self {
            Source::Path(path) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| ConfigError::io_error(absolute_path(path), e))?;
                tracing::debug!("Loaded config source: {}", path.display());
                parse_content(&self.id(), &content, path.extension().and_then(|e| e.to_str()))?
            }
            Source::Text { content, .. } => parse_content(&self.id(), content, None)?,
            Source::Value { value, .. } => value.clone(),
        };

        Ok(RawDocument {
            source: Arc::new(self.clone()),
            root,
        })
    }
}

/// A parsed document tagged with the source it came from
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub source: Arc<Source>,
    pub root: Value,
}

impl RawDocument {
    pub fn new(source: Source, root: Value) -> Self {
        Self {
            source: Arc::new(source),
            root,
        }
    }

    pub fn source_id(&self) -> SourceId {
        self.source.id()
    }
}

/// Parse document text; `.json` goes through serde_json, anything else
/// through serde_yaml (which also accepts JSON)
fn parse_content(id: &SourceId, content: &str, extension: Option<&str>) -> Result<Value> {
    let parsed = match extension {
        Some("json") => serde_json::from_str::<Value>(content).map_err(|e| e.to_string()),
        _ => serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string()),
    };

    // An empty YAML file parses to null; treat it as an empty mapping
    match parsed {
        Ok(Value::Null) => Ok(Value::Object(serde_json::Map::new())),
        Ok(value) => Ok(value),
        Err(message) => Err(ConfigError::parse_error(id.as_str(), message)),
    }
}

/// Make `path` absolute against the working directory and drop `.`/`..`
/// components without touching the file system
pub fn absolute_path(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    normalize_path(&joined)
}

/// Lexically remove `.` and `..` components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
