//! Error types for the model registry and its collaborators.

use thiserror::Error;

/// Failures of the durable deployment store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Connection(String),

    #[error("store query failed: {0}")]
    Query(String),
}

/// Failures of the key-value cache. Never surfaced to routing callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelRegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("model registry request timed out after {0}ms")]
    Timeout(u64),
}
