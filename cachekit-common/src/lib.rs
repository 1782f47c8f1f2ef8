//! cachekit-common - shared error types for the cache workspace.

use std::error::Error as StdError;
use std::fmt;

/// Errors surfaced at the cache/warmer construction boundary (E2).
///
/// Surfaced immediately and synchronously; no resources are allocated when
/// construction fails.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// A configuration field was outside its valid domain.
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for the construction boundary.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Raised by a loader to signal a failed backing-store fetch (E3).
///
/// The engine absorbs this at the boundary: it is converted into a cache
/// miss and a `load_fail` counter increment, never propagated to the
/// caller of `get`.
#[derive(Debug)]
pub struct LoadError {
    key_debug: String,
    source: BoxError,
}

impl LoadError {
    /// Builds a load error for `key`, wrapping the underlying cause.
    pub fn new<K: fmt::Debug>(key: &K, source: impl Into<BoxError>) -> Self {
        Self {
            key_debug: format!("{key:?}"),
            source: source.into(),
        }
    }

    /// The `Debug` rendering of the key that failed to load.
    pub fn key_debug(&self) -> &str {
        &self.key_debug
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load failed for key {}: {}", self.key_debug, self.source)
    }
}

impl StdError for LoadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_display_includes_key_and_cause() {
        let err = LoadError::new(&"k1", "backing store unavailable");
        let rendered = err.to_string();
        assert!(rendered.contains("k1"));
        assert!(rendered.contains("backing store unavailable"));
    }

    #[test]
    fn invalid_config_display() {
        let err = CacheError::InvalidConfig("ttl must be positive".into());
        assert_eq!(err.to_string(), "invalid cache configuration: ttl must be positive");
    }
}
