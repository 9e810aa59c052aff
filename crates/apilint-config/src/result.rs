//! `Result` alias used across config resolution

use crate::error::ConfigError;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Helpers for results that may carry a recoverable [`ConfigError`]
pub trait ResultExt<T> {
    /// `Ok(None)` when the error lets a caller fall back to defaults
    ///
    /// Only a missing config file qualifies; ambiguity and catalog problems
    /// still fail.
    fn recoverable(self) -> Result<Option<T>>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::debug!("Falling back to defaults: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
