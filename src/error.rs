//! Error types for cache lookups
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Failures surfaced by a [`CacheTable`](crate::cache::CacheTable) lookup.
///
/// Keys are rendered with their `Debug` representation so the error stays
/// independent of the table's key type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found in cache: {0}")]
    KeyNotFound(String),

    /// Key not found and the data loader could not produce it
    #[error("Key not found and could not be loaded into cache: {0}")]
    KeyNotFoundOrLoadable(String),
}

impl CacheError {
    /// Builds a [`CacheError::KeyNotFound`] for the given key.
    pub fn not_found<K: std::fmt::Debug>(key: &K) -> Self {
        CacheError::KeyNotFound(format!("{:?}", key))
    }

    /// Builds a [`CacheError::KeyNotFoundOrLoadable`] for the given key.
    pub fn not_loadable<K: std::fmt::Debug>(key: &K) -> Self {
        CacheError::KeyNotFoundOrLoadable(format!("{:?}", key))
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache lookups.
pub type Result<T> = std::result::Result<T, CacheError>;
