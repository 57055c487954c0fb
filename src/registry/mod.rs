//! Backend Registry module.
//!
//! Thread-safe in-memory storage of the backends routing policies refer to
//! by id.

mod backend;
mod error;

pub use backend::*;
pub use error::*;

use crate::client::BackendEndpoint;
use crate::config::BackendConfig;
use dashmap::DashMap;
use std::time::Duration;

/// The Backend Registry maps backend ids to their definitions.
///
/// # Examples
///
/// ```
/// use switchboard::registry::{BackendDefinition, BackendRegistry};
///
/// let registry = BackendRegistry::new();
/// registry
///     .add_backend(BackendDefinition::new("gpu-a", "http://10.0.0.1:8000/generate"))
///     .unwrap();
///
/// let endpoint = registry.resolve("gpu-a", "llama-3-8b").unwrap();
/// assert_eq!(endpoint.model_variant, "llama-3-8b");
/// assert_eq!(registry.backend_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: DashMap<String, BackendDefinition>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configured backends. Later duplicates replace earlier ones.
    pub fn from_config(backends: &[BackendConfig]) -> Self {
        let registry = Self::new();
        for backend in backends {
            registry.register_backend(
                BackendDefinition::new(&backend.id, &backend.url)
                    .with_timeout(Duration::from_secs(backend.timeout_seconds)),
            );
        }
        registry
    }

    /// Parse an `id1:uri1,id2:uri2` list.
    ///
    /// Each entry is split at its first `:`, so URIs keep their scheme and
    /// port. Malformed entries are skipped with a warning.
    ///
    /// ```
    /// use switchboard::registry::BackendRegistry;
    ///
    /// let defs = BackendRegistry::parse_endpoint_list(
    ///     "a:http://10.0.0.1:8000, b:http://10.0.0.2:8000,broken",
    /// );
    /// assert_eq!(defs.len(), 2);
    /// assert_eq!(defs[0].uri, "http://10.0.0.1:8000");
    /// ```
    pub fn parse_endpoint_list(list: &str) -> Vec<BackendDefinition> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match Self::parse_endpoint(entry) {
                Ok(def) => Some(def),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping backend endpoint entry");
                    None
                }
            })
            .collect()
    }

    fn parse_endpoint(entry: &str) -> Result<BackendDefinition, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidEntry {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };

        let (id, uri) = entry
            .split_once(':')
            .ok_or_else(|| invalid("expected id:uri"))?;
        let (id, uri) = (id.trim(), uri.trim());
        if id.is_empty() {
            return Err(invalid("empty backend id"));
        }
        if uri.is_empty() {
            return Err(invalid("empty backend uri"));
        }
        Ok(BackendDefinition::new(id, uri))
    }

    /// Add a new backend.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateBackend` if the id is already registered.
    pub fn add_backend(&self, backend: BackendDefinition) -> Result<(), RegistryError> {
        match self.backends.entry(backend.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(RegistryError::DuplicateBackend(backend.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(backend);
                Ok(())
            }
        }
    }

    /// Insert or replace a backend. Returns the previous definition, if any.
    pub fn register_backend(&self, backend: BackendDefinition) -> Option<BackendDefinition> {
        self.backends.insert(backend.id.clone(), backend)
    }

    /// Remove a backend.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::BackendNotFound` if no backend with the given id exists.
    pub fn remove_backend(&self, id: &str) -> Result<BackendDefinition, RegistryError> {
        self.backends
            .remove(id)
            .map(|(_, backend)| backend)
            .ok_or_else(|| RegistryError::BackendNotFound(id.to_string()))
    }

    pub fn get_backend(&self, id: &str) -> Option<BackendDefinition> {
        self.backends.get(id).map(|entry| entry.value().clone())
    }

    /// All backends, sorted by id.
    pub fn list_backends(&self) -> Vec<BackendDefinition> {
        let mut all: Vec<_> = self.backends.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Resolve a backend id to a routable endpoint for `model`.
    pub fn resolve(&self, id: &str, model: &str) -> Result<BackendEndpoint, RegistryError> {
        self.backends
            .get(id)
            .map(|entry| entry.value().endpoint(model))
            .ok_or_else(|| RegistryError::BackendNotFound(id.to_string()))
    }
}
