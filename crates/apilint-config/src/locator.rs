//! Config file discovery
//!
//! Looks for exactly one canonical config file in a single directory. Finding
//! none is recoverable (callers fall back to defaults); finding several is
//! fatal because nobody can tell which one governs behavior.

use crate::error::ConfigError;
use crate::result::{Result, ResultExt};
use std::path::{Path, PathBuf};

/// Preferred config file name
pub const PRIMARY_CONFIG_NAME: &str = "apilint.yaml";

/// Recognized config file names, most preferred first
pub const CONFIG_FILE_NAMES: &[&str] = &[
    PRIMARY_CONFIG_NAME,
    "apilint.yml",
    ".apilint.yaml",
    ".apilint.yml",
];

/// Locator for the canonical config file
pub struct Locator;

impl Locator {
    /// Find the single canonical config file in `start_dir`
    ///
    /// Without a directory the names are checked relative to the working
    /// directory and the bare name is returned. With a directory the match is
    /// joined onto it.
    pub fn locate(start_dir: Option<&Path>) -> Result<PathBuf> {
        Self::locate_in(Path::new(""), start_dir)
    }

    /// [`Locator::locate`] with relative candidates checked under `cwd`
    ///
    /// The returned path is never joined onto `cwd`.
    pub(crate) fn locate_in(cwd: &Path, start_dir: Option<&Path>) -> Result<PathBuf> {
        let candidate = |name: &str| match start_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };

        let found: Vec<&str> = CONFIG_FILE_NAMES
            .iter()
            .copied()
            .filter(|name| cwd.join(candidate(name)).is_file())
            .collect();

        match found.as_slice() {
            [] => Err(ConfigError::not_found(
                start_dir.unwrap_or_else(|| Path::new(".")),
                CONFIG_FILE_NAMES,
            )),
            [name] => {
                let path = candidate(name);
                tracing::debug!("Found config: {}", path.display());
                Ok(path)
            }
            many => Err(ConfigError::multiple_found(
                many.iter().map(|name| name.to_string()).collect(),
                PRIMARY_CONFIG_NAME,
            )),
        }
    }

    /// Like [`Locator::locate`], but a missing config is `Ok(None)`
    pub fn find(start_dir: Option<&Path>) -> Result<Option<PathBuf>> {
        Self::locate(start_dir).recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, "extends: [recommended]\n").unwrap();
        path
    }

    #[test]
    fn test_locate_single_file_in_dir() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), ".apilint.yml");

        let found = Locator::locate(Some(temp_dir.path())).unwrap();
        assert_eq!(found, temp_dir.path().join(".apilint.yml"));
    }

    #[test]
    fn test_locate_without_dir_returns_bare_name() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), ".apilint.yml");

        let found = Locator::locate_in(temp_dir.path(), None).unwrap();
        assert_eq!(found, PathBuf::from(".apilint.yml"));

        let nested = temp_dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        create_temp_config(&nested, "apilint.yaml");
        let found = Locator::locate_in(temp_dir.path(), Some(Path::new("nested"))).unwrap();
        assert_eq!(found, Path::new("nested").join("apilint.yaml"));
    }

    #[test]
    fn test_locate_reports_all_conflicting_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "apilint.yml");
        create_temp_config(temp_dir.path(), ".apilint.yaml");

        let err = Locator::locate(Some(temp_dir.path())).unwrap_err();
        match err {
            ConfigError::MultipleFound { files, primary } => {
                assert_eq!(files, vec![".apilint.yaml", "apilint.yml"]);
                assert_eq!(primary, PRIMARY_CONFIG_NAME);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_locate_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let err = Locator::locate(Some(temp_dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert_eq!(Locator::find(Some(temp_dir.path())).unwrap(), None);
    }

    #[test]
    fn test_directories_are_not_configs() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("apilint.yaml")).unwrap();
        assert_eq!(Locator::find(Some(temp_dir.path())).unwrap(), None);
    }

    #[test]
    fn test_find_propagates_ambiguity() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "apilint.yaml");
        create_temp_config(temp_dir.path(), "apilint.yml");
        assert!(Locator::find(Some(temp_dir.path())).is_err());
    }
}
